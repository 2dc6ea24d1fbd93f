//! HTTP plumbing towards the backend microservices

pub mod client;

pub use client::{ApiClient, ApiResponse, Credentials, Query};
