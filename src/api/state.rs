//! Application state for the API server

use crate::{Config, DownloadService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the download service and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The download service handling all job operations
    pub service: Arc<DownloadService>,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<DownloadService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
