//! Configuration management for Library Portal

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Base URLs of the backend microservices
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServicesConfig {
    pub book_url: String,
    pub user_url: String,
    pub borrow_url: String,
    pub payment_url: String,
    pub reminder_url: String,
    pub room_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the bearer token survives between runs
    pub token_file: PathBuf,
    /// Drop the session after a successful password change
    pub relogin_after_password_change: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub search_debounce_ms: u64,
    pub toast_close_ms: u64,
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. LIBRARY_PORTAL__SERVICES__BOOK_URL
            .add_source(
                Environment::with_prefix("LIBRARY_PORTAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("session.token_file", env::var("LIBRARY_PORTAL_TOKEN_FILE").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl UiConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn toast_close(&self) -> Duration {
        Duration::from_millis(self.toast_close_ms)
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            book_url: "http://localhost:8082".to_string(),
            user_url: "http://localhost:8082".to_string(),
            borrow_url: "http://localhost:8083".to_string(),
            payment_url: "http://localhost:8084".to_string(),
            reminder_url: "http://localhost:8085".to_string(),
            room_url: "http://localhost:8086".to_string(),
        }
    }
}

impl ServicesConfig {
    /// Point every service at the same base URL (single gateway or test server)
    pub fn all_at(base_url: &str) -> Self {
        Self {
            book_url: base_url.to_string(),
            user_url: base_url.to_string(),
            borrow_url: base_url.to_string(),
            payment_url: base_url.to_string(),
            reminder_url: base_url.to_string(),
            room_url: base_url.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("library-portal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from(".library-portal/token"),
            relogin_after_password_change: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            toast_close_ms: 1500,
            page_size: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}
