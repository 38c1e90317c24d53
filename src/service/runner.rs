//! Background execution of one job.
//!
//! Each submitted job gets its own tokio task. The task waits for a slot in
//! the bounded runner pool, drives the job through the state machine
//! (`pending → running → {completed, failed}`), and emits one notification
//! per transition. Nothing here ever propagates an error back to the HTTP
//! caller; failures land in the job record and the log.

use crate::db::JobRow;
use crate::error::DownloadError;
use crate::fetcher::FetchParams;
use crate::types::{JobEvent, JobId};
use std::path::PathBuf;

use super::DownloadService;

impl DownloadService {
    /// Schedule the background runner for a freshly inserted job.
    pub(crate) fn spawn_runner(&self, id: JobId) {
        let service = self.clone();
        tokio::spawn(async move {
            service.run_job(id).await;
        });
    }

    /// Drive one job to a terminal status.
    async fn run_job(self, id: JobId) {
        // Jobs beyond the concurrency limit stay pending here until a slot
        // frees up.
        let _permit = match self.job_slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!(job_id = %id, "runner pool closed, job left pending");
                return;
            }
        };

        match self.db.mark_running(id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(job_id = %id, "job no longer pending, skipping run");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "failed to mark job running");
                return;
            }
        }

        let row = match self.db.get_job(id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::error!(job_id = %id, "job disappeared after pickup");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "failed to load job after pickup");
                return;
            }
        };

        self.notifier.notify(JobEvent::Started, &row).await;
        tracing::info!(
            job_id = %id,
            exchange = %row.exchange,
            start_date = %row.start_date,
            end_date = %row.end_date,
            "starting download"
        );

        let result = match fetch_params(&row) {
            Ok(params) => self.fetcher.fetch(&params).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if let Err(e) = self.db.mark_completed(id).await {
                    tracing::error!(job_id = %id, error = %e, "failed to mark job completed");
                }
                tracing::info!(job_id = %id, "download completed");
                self.notify_with_fresh_row(JobEvent::Completed, id).await;
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(job_id = %id, error = %message, "download failed");
                if let Err(db_err) = self.db.mark_failed(id, &message).await {
                    tracing::error!(job_id = %id, error = %db_err, "failed to mark job failed");
                }
                self.notify_with_fresh_row(JobEvent::Failed, id).await;
            }
        }
    }

    /// Re-read the job so the notification carries the terminal timestamps.
    async fn notify_with_fresh_row(&self, event: JobEvent, id: JobId) {
        match self.db.get_job(id).await {
            Ok(Some(row)) => self.notifier.notify(event, &row).await,
            Ok(None) => tracing::warn!(job_id = %id, "job missing, notification skipped"),
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "failed to reload job for notification");
            }
        }
    }
}

/// Shape a job record into fetch parameters.
///
/// Dates were validated at submission; a record that no longer parses is
/// treated as a failed download rather than a panic.
fn fetch_params(row: &JobRow) -> Result<FetchParams, DownloadError> {
    let parse = |value: &str| {
        value.parse::<chrono::NaiveDate>().map_err(|e| {
            DownloadError::Request(format!("invalid date '{}' in job record: {}", value, e))
        })
    };

    Ok(FetchParams {
        exchange: row.exchange.clone(),
        symbols: row.symbol_list(),
        data_types: row.data_type_list(),
        start_date: parse(&row.start_date)?,
        end_date: parse(&row.end_date)?,
        output_path: PathBuf::from(&row.output_path),
    })
}
