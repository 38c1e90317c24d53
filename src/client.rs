//! Typed HTTP client for the tardis-dl REST API.
//!
//! Wraps the job endpoints with the authentication headers the server
//! expects, so embedders and scripts can submit and poll jobs without
//! hand-writing requests.

use crate::error::{ApiError, Error, JobError, Result};
use crate::types::{
    DownloadRequest, JobId, JobInfo, JobListResponse, JobStatusResponse, JobSubmitResponse,
};
use std::time::Duration;

/// Default interval between polls in [`ApiClient::wait_for_job`]
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client for the tardis-dl REST API
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    api_token: Option<String>,
}

impl ApiClient {
    /// Create a client for the API at `base_url`, acting as `username`
    pub fn new(base_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            api_token: None,
        }
    }

    /// Attach the shared-secret API token sent in the X-Api-Token header
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Submit a download job
    pub async fn submit(&self, request: &DownloadRequest) -> Result<JobSubmitResponse> {
        let response = self
            .request(reqwest::Method::POST, "/download")
            .json(request)
            .send()
            .await?;
        self.decode(response).await
    }

    /// List jobs, newest first
    pub async fn list_jobs(&self, limit: Option<i64>) -> Result<JobListResponse> {
        let path = match limit {
            Some(limit) => format!("/jobs?limit={}", limit),
            None => "/jobs".to_string(),
        };
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        self.decode(response).await
    }

    /// Fetch a single job record
    pub async fn get_job(&self, id: JobId) -> Result<JobInfo> {
        let response = self
            .request(reqwest::Method::GET, &format!("/jobs/{}", id))
            .send()
            .await?;
        self.decode(response).await
    }

    /// Fetch a job's lifecycle status
    pub async fn get_status(&self, id: JobId) -> Result<JobStatusResponse> {
        let response = self
            .request(reqwest::Method::GET, &format!("/jobs/{}/status", id))
            .send()
            .await?;
        self.decode(response).await
    }

    /// Poll a job until it reaches a terminal status.
    ///
    /// Checks every two seconds and gives up after `timeout`, returning the
    /// final job record on success.
    pub async fn wait_for_job(&self, id: JobId, timeout: Duration) -> Result<JobInfo> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let job = self.get_job(id).await?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Other(format!(
                    "timed out waiting for job {} (last status: {})",
                    id, job.status
                )));
            }
            tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Username", &self.username);
        if let Some(token) = &self.api_token {
            builder = builder.header("X-Api-Token", token);
        }
        builder
    }

    /// Decode a success body, or map the server's error body back onto [`Error`]
    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiError>(&body) {
            Ok(api_error) => Err(error_from_api(status.as_u16(), api_error)),
            Err(_) => Err(Error::Other(format!(
                "API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ))),
        }
    }
}

/// Map a structured error body back onto the domain error it came from
fn error_from_api(status: u16, api_error: ApiError) -> Error {
    let detail = api_error.error;
    match (status, detail.code.as_str()) {
        (401, _) => Error::Unauthorized(detail.message),
        (403, _) => Error::Forbidden(detail.message),
        (404, "job_not_found") => {
            let id = detail
                .details
                .as_ref()
                .and_then(|d| d["job_id"].as_i64())
                .unwrap_or_default();
            Error::Job(JobError::NotFound { id })
        }
        (400, "validation_error") => Error::Other(detail.message),
        _ => Error::Other(format!("{}: {}", detail.code, detail.message)),
    }
}
