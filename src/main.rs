//! QueryDesk - terminal client for a natural-language SQL backend
//!
//! Questions typed here are sent to a remote question-answering service that
//! turns them into SQL; answers come back as a summary, the generated query
//! and the result rows.

mod backend;
mod config;
mod runtime;
mod session;
mod sql_format;
mod state_machine;
mod tui;
mod visualize;

use backend::{HttpBackend, LoggingBackend};
use config::ClientConfig;
use runtime::RuntimeHandle;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();

    // The terminal belongs to the UI, so logs go to a file
    let log_file = open_log_file(&config.log_path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "querydesk=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    tracing::info!(
        backend = %config.backend_url,
        timeout_secs = config.timeout.as_secs(),
        "Starting QueryDesk"
    );

    let backend = Arc::new(LoggingBackend::new(HttpBackend::new(
        config.backend_url.clone(),
        config.timeout,
    )?));
    let (handle, runtime_rx) = RuntimeHandle::spawn(Arc::clone(&backend));

    let terminal = ratatui::init();
    let result = tui::run(terminal, backend, handle, runtime_rx, config.health_interval).await;
    ratatui::restore();

    result?;
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
