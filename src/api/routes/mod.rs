//! Route handlers, grouped by concern.

use serde::Deserialize;
use utoipa::IntoParams;

mod jobs;
mod system;

pub use jobs::*;
pub use system::*;

/// Query parameters for `GET /jobs`
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListJobsQuery {
    /// Maximum number of jobs to return (default: 50)
    pub limit: Option<i64>,
}
