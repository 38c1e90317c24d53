//! Delegated download execution.
//!
//! The job runner depends on downloads only through the [`DataFetcher`] trait:
//! a fetch either succeeds or returns a [`DownloadError`] whose message lands
//! in the job record. [`TardisFetcher`] is the production implementation,
//! pulling gzipped CSV datasets from the Tardis datasets endpoint one
//! (data type, date, symbol) combination at a time.

use crate::config::DownloadSettings;
use crate::error::DownloadError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the delegated download needs, extracted from a job record
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Exchange name (e.g. "binance")
    pub exchange: String,
    /// Trading symbols
    pub symbols: Vec<String>,
    /// Data types (e.g. "trades", "incremental_book_L2")
    pub data_types: Vec<String>,
    /// First day to download, inclusive
    pub start_date: NaiveDate,
    /// Last day to download, inclusive
    pub end_date: NaiveDate,
    /// Directory the files land in
    pub output_path: PathBuf,
}

/// The download-execution capability the job runner delegates to
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Download all datasets described by `params`.
    ///
    /// Must not return until the work is finished or has failed; the runner
    /// maps the outcome directly onto the job's terminal status.
    async fn fetch(&self, params: &FetchParams) -> Result<(), DownloadError>;
}

/// Downloads historical datasets from datasets.tardis.dev
pub struct TardisFetcher {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TardisFetcher {
    /// Create a fetcher from the download settings
    pub fn new(settings: &DownloadSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.datasets_url.trim_end_matches('/').to_string(),
        }
    }

    /// Dataset URL for one (exchange, data type, date, symbol) combination
    fn dataset_url(&self, exchange: &str, data_type: &str, date: NaiveDate, symbol: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}.csv.gz",
            self.base_url,
            exchange,
            data_type,
            date.format("%Y/%m/%d"),
            symbol
        )
    }

    /// Download a single dataset file to disk
    async fn fetch_one(
        &self,
        url: &str,
        dest: &std::path::Path,
        api_key: &str,
    ) -> Result<(), DownloadError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| DownloadError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::UpstreamStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Request(e.to_string()))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| DownloadError::WriteFailed {
                path: dest.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl DataFetcher for TardisFetcher {
    async fn fetch(&self, params: &FetchParams) -> Result<(), DownloadError> {
        let api_key = self.api_key.as_deref().ok_or(DownloadError::MissingApiKey)?;

        tokio::fs::create_dir_all(&params.output_path)
            .await
            .map_err(|e| DownloadError::WriteFailed {
                path: params.output_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut date = params.start_date;
        while date <= params.end_date {
            for data_type in &params.data_types {
                for symbol in &params.symbols {
                    let url = self.dataset_url(&params.exchange, data_type, date, symbol);
                    let filename = format!(
                        "{}_{}_{}_{}.csv.gz",
                        params.exchange, data_type, date, symbol
                    );
                    let dest = params.output_path.join(&filename);

                    tracing::debug!(url = %url, dest = %dest.display(), "downloading dataset");
                    self.fetch_one(&url, &dest, api_key).await?;
                }
            }
            date = date.succ_opt().ok_or_else(|| {
                DownloadError::Request(format!("date overflow after {}", date))
            })?;
        }

        Ok(())
    }
}
