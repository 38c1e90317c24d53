//! Core types shared across the service: job identity, job lifecycle status,
//! and the request/response bodies exposed by the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a download job, assigned by the database on insert.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<JobId> for i64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for JobId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for JobId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for JobId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Job lifecycle status.
///
/// `Pending` and `Running` are transient; `Completed` and `Failed` are
/// terminal and never re-entered for the same job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted and persisted, waiting for a runner slot
    Pending,
    /// Download in progress on a background task
    Running,
    /// Download finished successfully
    Completed,
    /// Download failed with an error message
    Failed,
}

impl JobStatus {
    /// Database/wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a status string as stored in the database
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status is terminal (immutable once reached)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event emitted by the job runner and delivered by the notifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobEvent {
    /// Job transitioned to running
    Started,
    /// Job reached completed
    Completed,
    /// Job reached failed
    Failed,
}

/// Request body for `POST /download`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Exchange name (e.g. "binance")
    pub exchange: String,
    /// Trading symbols (e.g. "BTC-USDT"); at least one required
    pub symbols: Vec<String>,
    /// Data types to download (defaults to `["trades"]`)
    #[serde(default)]
    pub data_types: Option<Vec<String>>,
    /// Start date, inclusive (YYYY-MM-DD)
    pub start_date: String,
    /// End date, inclusive (YYYY-MM-DD)
    pub end_date: String,
    /// Custom output path (defaults to the configured output path)
    #[serde(default)]
    pub output_path: Option<String>,
}

/// Full job record as exposed by the API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    /// Unique job ID
    pub id: JobId,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Exchange name
    pub exchange: String,
    /// Trading symbols
    pub symbols: Vec<String>,
    /// Data types being downloaded
    pub data_types: Vec<String>,
    /// Start date (YYYY-MM-DD)
    pub start_date: String,
    /// End date (YYYY-MM-DD)
    pub end_date: String,
    /// Directory the downloaded files land in
    pub output_path: String,
    /// When the job was submitted
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the job started running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// When the job reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Error message, set only for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Identity of the submitter
    pub created_by: String,
}

/// Response body for `POST /download`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSubmitResponse {
    /// ID of the accepted job
    pub job_id: JobId,
    /// Initial status (always `pending`)
    pub status: JobStatus,
    /// Human-readable confirmation
    pub message: String,
}

/// Response body for `GET /jobs`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    /// Jobs, newest first
    pub jobs: Vec<JobInfo>,
    /// Number of jobs returned
    pub total: usize,
}

/// Response body for `GET /jobs/{id}/status`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    /// Job ID
    pub job_id: JobId,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Identity of the submitter
    pub created_by: String,
    /// When the job was submitted
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Error message, set only for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
