//! Download service orchestration.
//!
//! [`DownloadService`] is the heart of the crate: it validates submissions,
//! persists job records, schedules background runners, and answers job
//! queries. The API layer is a thin HTTP shell around it.
//!
//! ## Submodules
//!
//! - [`validation`] — request validation rules
//! - [`runner`] — background execution of one job to a terminal status

use crate::config::Config;
use crate::db::Database;
use crate::error::{JobError, Result};
use crate::fetcher::{DataFetcher, TardisFetcher};
use crate::notifier::Notifier;
use crate::types::{DownloadRequest, JobId, JobInfo};
use std::sync::Arc;
use tokio::sync::Semaphore;

mod runner;
mod validation;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

/// The download job service: validation, persistence, scheduling, queries.
///
/// Cloning is cheap (all fields are shared handles); each spawned job runner
/// holds its own clone.
#[derive(Clone)]
pub struct DownloadService {
    /// Job database (public so embedders and tests can inspect records)
    pub db: Arc<Database>,
    /// Process-wide configuration
    pub config: Arc<Config>,
    notifier: Arc<Notifier>,
    fetcher: Arc<dyn DataFetcher>,
    job_slots: Arc<Semaphore>,
}

impl DownloadService {
    /// Create a service with the production Tardis fetcher.
    ///
    /// Opens (and migrates) the job database at the configured path.
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(TardisFetcher::new(&config.download));
        Self::with_fetcher(config, fetcher).await
    }

    /// Create a service with a custom download implementation.
    ///
    /// This is the seam used by tests and by embedders that fetch data from
    /// somewhere other than Tardis.
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn DataFetcher>) -> Result<Self> {
        let db = Arc::new(Database::new(&config.database_path).await?);
        let notifier = Arc::new(Notifier::new(config.telegram.clone()));
        let job_slots = Arc::new(Semaphore::new(config.download.max_concurrent_jobs));

        Ok(Self {
            db,
            config: Arc::new(config),
            notifier,
            fetcher,
            job_slots,
        })
    }

    /// Submit a download job on behalf of `username`.
    ///
    /// Validates the request, persists the job in `pending`, schedules a
    /// background runner, and returns the job id immediately; it never waits
    /// for the download itself.
    pub async fn submit(&self, request: DownloadRequest, username: &str) -> Result<JobId> {
        let new_job = validation::validate_request(
            &request,
            username,
            &self.config.download.default_output_path,
        )?;

        let id = self.db.insert_job(&new_job).await?;

        tracing::info!(
            job_id = %id,
            exchange = %new_job.exchange,
            symbols = new_job.symbols.len(),
            created_by = %username,
            "job submitted"
        );

        self.spawn_runner(id);

        Ok(id)
    }

    /// Fetch a single job record
    pub async fn get_job(&self, id: JobId) -> Result<JobInfo> {
        let row = self
            .db
            .get_job(id)
            .await?
            .ok_or(JobError::NotFound { id: id.0 })?;

        Ok(row.into())
    }

    /// List jobs, newest first
    pub async fn list_jobs(&self, limit: i64) -> Result<Vec<JobInfo>> {
        let rows = self.db.list_jobs(limit, 0).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Close the underlying database pool
    pub async fn shutdown(&self) {
        tracing::info!("shutting down download service");
        self.db.close().await;
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
