//! Request validation rules.
//!
//! Every rejection names the offending field so API clients can surface a
//! precise error. Validation runs before anything touches the database; an
//! invalid request never creates a job.

use crate::db::NewJob;
use crate::error::{Error, Result};
use crate::types::DownloadRequest;
use chrono::NaiveDate;
use std::path::Path;

/// Expected calendar date format for start_date/end_date
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate a download request and shape it into an insertable job record.
pub(crate) fn validate_request(
    request: &DownloadRequest,
    username: &str,
    default_output: &Path,
) -> Result<NewJob> {
    let exchange = request.exchange.trim();
    if exchange.is_empty() {
        return Err(Error::Validation {
            field: "exchange",
            message: "must not be empty".to_string(),
        });
    }

    if request.symbols.is_empty() {
        return Err(Error::Validation {
            field: "symbols",
            message: "at least one symbol is required".to_string(),
        });
    }
    if request.symbols.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::Validation {
            field: "symbols",
            message: "symbols must not contain empty entries".to_string(),
        });
    }

    let data_types = match &request.data_types {
        Some(types) if !types.is_empty() => {
            if types.iter().any(|t| t.trim().is_empty()) {
                return Err(Error::Validation {
                    field: "data_types",
                    message: "data_types must not contain empty entries".to_string(),
                });
            }
            types.clone()
        }
        // Omitted or empty falls back to the single implied type
        _ => vec!["trades".to_string()],
    };

    let start = parse_date(&request.start_date, "start_date")?;
    let end = parse_date(&request.end_date, "end_date")?;
    if start > end {
        return Err(Error::Validation {
            field: "start_date",
            message: format!(
                "start_date {} must be on or before end_date {}",
                request.start_date, request.end_date
            ),
        });
    }

    let output_path = request
        .output_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .unwrap_or_else(|| default_output.display().to_string());

    Ok(NewJob {
        exchange: exchange.to_string(),
        symbols: request.symbols.clone(),
        data_types,
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        output_path,
        created_by: username.to_string(),
    })
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::Validation {
        field,
        message: format!("'{}' is not a valid date (expected YYYY-MM-DD)", value),
    })
}
