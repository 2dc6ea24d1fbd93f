//! Library Portal - terminal client for the library management services

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use library_portal::{
    cli::{self, Cli},
    config::{AppConfig, LoggingConfig},
    session::FileTokenStore,
    Portal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let _log_guard = init_tracing(&config.logging)?;

    tracing::debug!("Starting Library Portal v{}", env!("CARGO_PKG_VERSION"));

    let tokens = Arc::new(FileTokenStore::new(config.session.token_file.clone()));
    let portal = Portal::new(config, tokens)?;

    if let Err(e) = cli::run(cli, &portal).await {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr, or to a file when one is configured so they never
/// mix with rendered screens. The returned guard flushes the file writer.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_portal={}", logging.level).into());

    let (writer, guard) = match &logging.file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("logging.file must name a file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(directory.unwrap_or_else(|| Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (tracing_subscriber::fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer = if logging.format == "json" {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer().with_writer(writer).with_ansi(logging.file.is_none()).boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
    Ok(guard)
}
