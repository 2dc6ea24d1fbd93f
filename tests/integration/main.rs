//! Integration tests against an in-process mock of the backend services

mod cli_flow;
mod common;
mod screens;
mod session_flow;
