//! Shared helpers for service and API tests.

use crate::config::Config;
use crate::error::DownloadError;
use crate::fetcher::{DataFetcher, FetchParams};
use crate::types::{JobId, JobStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use super::DownloadService;

/// What a stub fetch call should do
pub(crate) enum StubOutcome {
    /// Return Ok(())
    Succeed,
    /// Return a download error with this message
    Fail(String),
}

/// Test double for the delegated download capability.
///
/// Optionally gated on a semaphore so tests can hold a job in flight and
/// release it deterministically (one permit per fetch call).
pub(crate) struct StubFetcher {
    outcome: StubOutcome,
    pub(crate) calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl StubFetcher {
    pub(crate) fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            outcome: StubOutcome::Succeed,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: StubOutcome::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub(crate) fn gated(gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            outcome: StubOutcome::Succeed,
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetcher for StubFetcher {
    async fn fetch(&self, _params: &FetchParams) -> Result<(), DownloadError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| DownloadError::Request("gate closed".to_string()))?;
            permit.forget();
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            StubOutcome::Succeed => Ok(()),
            StubOutcome::Fail(message) => Err(DownloadError::Request(message.clone())),
        }
    }
}

/// Configuration pointing at a temp database with notifications disabled
pub(crate) fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database_path = dir.path().join("jobs.db");
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// Build a service over a temp database with the given fetcher
pub(crate) async fn create_test_service(
    fetcher: Arc<dyn DataFetcher>,
) -> (DownloadService, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let service = DownloadService::with_fetcher(config, fetcher).await.unwrap();
    (service, dir)
}

/// Same as [`create_test_service`] but with a caller-modified config
pub(crate) async fn create_test_service_with(
    fetcher: Arc<dyn DataFetcher>,
    modify: impl FnOnce(&mut Config),
) -> (DownloadService, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    modify(&mut config);
    let service = DownloadService::with_fetcher(config, fetcher).await.unwrap();
    (service, dir)
}

/// Poll until the job reaches `status`, panicking after a few seconds
pub(crate) async fn wait_for_status(service: &DownloadService, id: JobId, status: JobStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = service.get_job(id).await.unwrap();
        if job.status == status {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} stuck in {:?}, expected {:?}",
            id,
            job.status,
            status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A valid download request for test submissions
pub(crate) fn sample_request() -> crate::types::DownloadRequest {
    crate::types::DownloadRequest {
        exchange: "binance".to_string(),
        symbols: vec!["BTC-USDT".to_string()],
        data_types: None,
        start_date: "2024-01-01".to_string(),
        end_date: "2024-01-02".to_string(),
        output_path: None,
    }
}
