//! Library Portal
//!
//! Client for the library management microservices: session and route
//! guard, typed service wrappers, list views, modal forms and role
//! dashboards, with a terminal front end.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use api::Credentials;
use services::Services;
use session::{SessionStore, TokenStore};

/// Application state shared by every screen
#[derive(Clone)]
pub struct Portal {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
    pub session: SessionStore,
}

impl Portal {
    pub fn new(config: AppConfig, tokens: Arc<dyn TokenStore>) -> AppResult<Self> {
        let credentials = Credentials::new();
        let services = Services::new(&config, credentials.clone())?;
        let session = SessionStore::new(&services, credentials, tokens, &config.session);
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
            session,
        })
    }
}
