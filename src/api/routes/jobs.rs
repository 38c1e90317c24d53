//! Job submission and query handlers.

use super::ListJobsQuery;
use crate::api::AppState;
use crate::api::auth::AuthenticatedUser;
use crate::types::{
    DownloadRequest, JobId, JobListResponse, JobStatus, JobStatusResponse, JobSubmitResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Default page size for job listings
const DEFAULT_LIST_LIMIT: i64 = 50;

/// POST /download - Submit a download job
#[utoipa::path(
    post,
    path = "/download",
    tag = "jobs",
    request_body = DownloadRequest,
    responses(
        (status = 202, description = "Job accepted and queued", body = JobSubmitResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ApiError),
        (status = 403, description = "User not allowed", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("api_token" = []))
)]
pub async fn submit_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<DownloadRequest>,
) -> Response {
    match state.service.submit(request, &user.0).await {
        Ok(id) => {
            let body = JobSubmitResponse {
                job_id: id,
                status: JobStatus::Pending,
                message: format!("Download job {} queued", id),
            };
            // The download itself runs in the background, so the submission
            // is accepted, not completed
            (StatusCode::ACCEPTED, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// GET /jobs - List jobs, newest first
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs, newest first", body = JobListResponse),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("api_token" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1);

    match state.service.list_jobs(limit).await {
        Ok(jobs) => {
            let body = JobListResponse {
                total: jobs.len(),
                jobs,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// GET /jobs/:id - Get a single job
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Full job record", body = crate::types::JobInfo),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ApiError),
        (status = 404, description = "Job not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("api_token" = []))
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.service.get_job(JobId(id)).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /jobs/:id/status - Get a job's lifecycle status
#[utoipa::path(
    get,
    path = "/jobs/{id}/status",
    tag = "jobs",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job status summary", body = JobStatusResponse),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ApiError),
        (status = 404, description = "Job not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("api_token" = []))
)]
pub async fn get_job_status(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.service.get_job(JobId(id)).await {
        Ok(job) => {
            let body = JobStatusResponse {
                job_id: job.id,
                status: job.status,
                created_by: job.created_by,
                created_at: job.created_at,
                error_message: job.error_message,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
