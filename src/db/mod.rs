//! Database layer for tardis-dl
//!
//! Handles SQLite persistence for the download job log.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`jobs`] — Job CRUD and guarded status transitions

use crate::types::{JobId, JobInfo, JobStatus};
use sqlx::{FromRow, sqlite::SqlitePool};

mod jobs;
mod migrations;

/// New job to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Exchange name (e.g. "binance")
    pub exchange: String,
    /// Trading symbols, at least one
    pub symbols: Vec<String>,
    /// Data types to download
    pub data_types: Vec<String>,
    /// Start date (YYYY-MM-DD)
    pub start_date: String,
    /// End date (YYYY-MM-DD)
    pub end_date: String,
    /// Directory downloaded files land in
    pub output_path: String,
    /// Identity of the submitter
    pub created_by: String,
}

/// Job record from database
///
/// `symbols` and `data_types` are stored as JSON arrays, timestamps as unix
/// seconds. Use [`JobRow::status`] and the [`JobInfo`] conversion for typed
/// access.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    /// Unique database ID
    pub id: i64,
    /// Current status string ("pending", "running", "completed", "failed")
    pub status: String,
    /// Exchange name
    pub exchange: String,
    /// Trading symbols as a JSON array
    pub symbols: String,
    /// Data types as a JSON array
    pub data_types: String,
    /// Start date (YYYY-MM-DD)
    pub start_date: String,
    /// End date (YYYY-MM-DD)
    pub end_date: String,
    /// Directory downloaded files land in
    pub output_path: String,
    /// Unix timestamp when the job was submitted
    pub created_at: i64,
    /// Unix timestamp when the job started running
    pub started_at: Option<i64>,
    /// Unix timestamp when the job reached a terminal status
    pub completed_at: Option<i64>,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// Identity of the submitter
    pub created_by: String,
}

impl JobRow {
    /// Typed job ID
    pub fn job_id(&self) -> JobId {
        JobId(self.id)
    }

    /// Typed lifecycle status.
    ///
    /// An unrecognized status string in the database is reported as `Failed`.
    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status).unwrap_or(JobStatus::Failed)
    }

    /// Decode the JSON symbols column
    pub fn symbol_list(&self) -> Vec<String> {
        serde_json::from_str(&self.symbols).unwrap_or_default()
    }

    /// Decode the JSON data_types column
    pub fn data_type_list(&self) -> Vec<String> {
        serde_json::from_str(&self.data_types).unwrap_or_default()
    }
}

impl From<JobRow> for JobInfo {
    fn from(row: JobRow) -> Self {
        use chrono::{TimeZone, Utc};

        let to_datetime = |ts: i64| Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now);

        JobInfo {
            id: JobId(row.id),
            status: JobStatus::parse(&row.status).unwrap_or(JobStatus::Failed),
            exchange: row.exchange.clone(),
            symbols: serde_json::from_str(&row.symbols).unwrap_or_default(),
            data_types: serde_json::from_str(&row.data_types).unwrap_or_default(),
            start_date: row.start_date,
            end_date: row.end_date,
            output_path: row.output_path,
            created_at: to_datetime(row.created_at),
            started_at: row.started_at.map(to_datetime),
            completed_at: row.completed_at.map(to_datetime),
            error_message: row.error_message,
            created_by: row.created_by,
        }
    }
}

/// Database handle for tardis-dl
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
