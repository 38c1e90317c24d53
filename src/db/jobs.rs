//! Job CRUD operations and guarded status transitions.
//!
//! Status transitions are enforced at the SQL level: every UPDATE carries a
//! `WHERE status = ...` guard so a terminal status can never be overwritten,
//! regardless of how many runners or duplicate signals race on the same row.

use crate::error::DatabaseError;
use crate::types::JobId;
use crate::{Error, Result};

use super::{Database, JobRow, NewJob};

const JOB_COLUMNS: &str = r#"
    id, status, exchange, symbols, data_types,
    start_date, end_date, output_path,
    created_at, started_at, completed_at, error_message, created_by
"#;

impl Database {
    /// Insert a new job record with status `pending`
    pub async fn insert_job(&self, job: &NewJob) -> Result<JobId> {
        let now = chrono::Utc::now().timestamp();
        let symbols = serde_json::to_string(&job.symbols)?;
        let data_types = serde_json::to_string(&job.data_types)?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                status, exchange, symbols, data_types,
                start_date, end_date, output_path,
                created_at, created_by
            ) VALUES ('pending', ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.exchange)
        .bind(&symbols)
        .bind(&data_types)
        .bind(&job.start_date)
        .bind(&job.end_date)
        .bind(&job.output_path)
        .bind(now)
        .bind(&job.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert job: {}",
                e
            )))
        })?;

        Ok(JobId(result.last_insert_rowid()))
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: JobId) -> Result<Option<JobRow>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get job: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List jobs, newest first
    pub async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<JobRow>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list jobs: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Count all jobs
    pub async fn count_jobs(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count jobs: {}",
                    e
                )))
            })?;

        Ok(count)
    }

    /// Transition a job from `pending` to `running` and set `started_at`.
    ///
    /// Returns false if the job was not in `pending` (already picked up or
    /// already terminal); the row is left untouched in that case.
    pub async fn mark_running(&self, id: JobId) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE jobs SET status = 'running', started_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark job running: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition a job from `running` to `completed` and set `completed_at`.
    ///
    /// Returns false (a no-op) if the job was not in `running`; a terminal
    /// status is never overwritten.
    pub async fn mark_completed(&self, id: JobId) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = ? WHERE id = ? AND status = 'running'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark job completed: {}",
                e
            )))
        })?;

        let updated = result.rows_affected() > 0;
        if !updated {
            tracing::warn!(job_id = %id, "completed transition ignored: job not running");
        }

        Ok(updated)
    }

    /// Transition a job to `failed`, setting `completed_at` and `error_message`.
    ///
    /// Accepts the transition from either `pending` or `running` so a job that
    /// errors before pickup still reaches a terminal state. Returns false (a
    /// no-op) if the job is already terminal.
    pub async fn mark_failed(&self, id: JobId, error_message: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', completed_at = ?, error_message = ?
            WHERE id = ? AND status IN ('pending', 'running')
            "#,
        )
        .bind(now)
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark job failed: {}",
                e
            )))
        })?;

        let updated = result.rows_affected() > 0;
        if !updated {
            tracing::warn!(job_id = %id, "failed transition ignored: job already terminal");
        }

        Ok(updated)
    }
}
