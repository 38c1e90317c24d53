//! # tardis-dl
//!
//! Backend service for downloading historical market data from the Tardis
//! datasets API.
//!
//! Callers submit download jobs over a small authenticated REST API; each job
//! is persisted in SQLite, executed on a background task through a
//! `pending → running → {completed, failed}` state machine, and announced to
//! a Telegram chat at every lifecycle transition.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tardis_dl::{Config, DownloadService, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let service = Arc::new(DownloadService::new(config).await?);
//!     let config = service.config.clone();
//!
//!     // Serve the REST API (blocks until shutdown)
//!     api::start_api_server(service, config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Typed HTTP client for the REST API
pub mod client;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Delegated dataset download (Tardis fetcher and the trait behind it)
pub mod fetcher;
/// Telegram lifecycle notifications
pub mod notifier;
/// Job orchestration: validation, scheduling, background runners
pub mod service;
/// Core types and API request/response bodies
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{ApiConfig, Config, DownloadSettings, TelegramConfig};
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, DownloadError, Error, ErrorDetail, JobError, Result, ToHttpStatus,
};
pub use fetcher::{DataFetcher, FetchParams, TardisFetcher};
pub use notifier::Notifier;
pub use service::DownloadService;
pub use types::{
    DownloadRequest, JobEvent, JobId, JobInfo, JobListResponse, JobStatus, JobStatusResponse,
    JobSubmitResponse,
};

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then closes the service's database
/// pool.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(service: DownloadService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
