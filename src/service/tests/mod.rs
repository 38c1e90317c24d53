//! End-to-end service tests over a temp database and stub fetchers.

use crate::error::{Error, JobError};
use crate::service::test_helpers::*;
use crate::types::JobStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_submit_runs_job_to_completed() {
    let fetcher = StubFetcher::succeeding();
    let (service, _dir) = create_test_service(fetcher.clone()).await;

    let id = service.submit(sample_request(), "alice").await.unwrap();
    wait_for_status(&service, id, JobStatus::Completed).await;

    let job = service.get_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());
    assert!(job.error_message.is_none());
    assert_eq!(job.created_by, "alice");
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_submit_records_failure() {
    let fetcher = StubFetcher::failing("exchange rejected the request");
    let (service, _dir) = create_test_service(fetcher).await;

    let id = service.submit(sample_request(), "alice").await.unwrap();
    wait_for_status(&service, id, JobStatus::Failed).await;

    let job = service.get_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.completed_at.is_some());
    let message = job.error_message.unwrap();
    assert!(message.contains("exchange rejected the request"), "{}", message);
}

#[tokio::test]
async fn test_jobs_beyond_pool_limit_stay_pending() {
    let gate = Arc::new(Semaphore::new(0));
    let fetcher = StubFetcher::gated(gate.clone());
    let (service, _dir) = create_test_service_with(fetcher, |config| {
        config.download.max_concurrent_jobs = 1;
    })
    .await;

    let first = service.submit(sample_request(), "alice").await.unwrap();
    let second = service.submit(sample_request(), "alice").await.unwrap();

    // First job holds the only slot while its fetch waits on the gate
    wait_for_status(&service, first, JobStatus::Running).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    let queued = service.get_job(second).await.unwrap();
    assert_eq!(queued.status, JobStatus::Pending);

    // Release both fetches and let the queue drain
    gate.add_permits(2);
    wait_for_status(&service, first, JobStatus::Completed).await;
    wait_for_status(&service, second, JobStatus::Completed).await;
}

#[tokio::test]
async fn test_invalid_request_creates_no_job() {
    let fetcher = StubFetcher::succeeding();
    let (service, _dir) = create_test_service(fetcher.clone()).await;

    let mut request = sample_request();
    request.symbols.clear();

    let result = service.submit(request, "alice").await;
    assert!(matches!(result, Err(Error::Validation { field: "symbols", .. })));
    assert_eq!(service.db.count_jobs().await.unwrap(), 0);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_get_missing_job_is_not_found() {
    let (service, _dir) = create_test_service(StubFetcher::succeeding()).await;

    let result = service.get_job(crate::types::JobId(9999)).await;
    assert!(matches!(
        result,
        Err(Error::Job(JobError::NotFound { id: 9999 }))
    ));
}

#[tokio::test]
async fn test_list_jobs_newest_first() {
    // Keep jobs queued so the listing is exercised against live records
    let gate = Arc::new(Semaphore::new(0));
    let fetcher = StubFetcher::gated(gate.clone());
    let (service, _dir) = create_test_service_with(fetcher, |config| {
        config.download.max_concurrent_jobs = 1;
    })
    .await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(service.submit(sample_request(), "alice").await.unwrap());
    }

    let jobs = service.list_jobs(10).await.unwrap();
    assert_eq!(jobs.len(), 3);
    let listed: Vec<i64> = jobs.iter().map(|j| j.id.0).collect();
    let mut expected: Vec<i64> = ids.iter().map(|id| id.0).collect();
    expected.reverse();
    assert_eq!(listed, expected);

    gate.add_permits(3);
}

#[tokio::test]
async fn test_lifecycle_sends_start_and_completion_notifications() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botnotify-token/sendMessage"))
        .and(body_string_contains("Download Started"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/botnotify-token/sendMessage"))
        .and(body_string_contains("Download Completed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (service, _dir) = create_test_service_with(StubFetcher::succeeding(), |config| {
        config.telegram.bot_token = Some("notify-token".to_string());
        config.telegram.chat_id = "-100555".to_string();
        config.telegram.api_url = uri;
    })
    .await;

    let id = service.submit(sample_request(), "alice").await.unwrap();
    wait_for_status(&service, id, JobStatus::Completed).await;

    // Give the completion notification time to leave before the mock verifies
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_failure_sends_failure_notification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botnotify-token/sendMessage"))
        .and(body_string_contains("Download Started"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/botnotify-token/sendMessage"))
        .and(body_string_contains("Download Failed"))
        .and(body_string_contains("disk full"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (service, _dir) = create_test_service_with(StubFetcher::failing("disk full"), |config| {
        config.telegram.bot_token = Some("notify-token".to_string());
        config.telegram.chat_id = "-100555".to_string();
        config.telegram.api_url = uri;
    })
    .await;

    let id = service.submit(sample_request(), "alice").await.unwrap();
    wait_for_status(&service, id, JobStatus::Failed).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
}
