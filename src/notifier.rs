//! Telegram lifecycle notifications.
//!
//! Delivery is fire-and-forget relative to the job pipeline: exactly one
//! attempt per event, failures are logged and swallowed, and the job status
//! is never affected by a delivery problem. When no bot token is configured
//! the notifier is a no-op.

use crate::config::TelegramConfig;
use crate::db::JobRow;
use crate::types::JobEvent;
use std::time::Duration;

/// Maximum characters of an error message included in a failure notification
const MAX_ERROR_CHARS: usize = 200;

/// Number of symbols spelled out before collapsing to "(+N more)"
const MAX_LISTED_SYMBOLS: usize = 3;

/// Sends formatted lifecycle messages to a fixed Telegram chat
pub struct Notifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl Notifier {
    /// Create a notifier from the Telegram settings
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Whether notifications are configured at all
    pub fn is_enabled(&self) -> bool {
        self.config.bot_token.is_some()
    }

    /// Deliver one lifecycle notification for a job.
    ///
    /// At-most-one attempt: any failure is logged at warn and dropped.
    pub async fn notify(&self, event: JobEvent, job: &JobRow) {
        let Some(token) = self.config.bot_token.as_deref() else {
            tracing::debug!(job_id = job.id, ?event, "notifications disabled, skipping");
            return;
        };

        let text = format_message(event, job);
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            token
        );

        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(job_id = job.id, ?event, "notification sent");
            }
            Ok(response) => {
                tracing::warn!(
                    job_id = job.id,
                    ?event,
                    status = %response.status(),
                    "notification rejected by Telegram"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = job.id, ?event, error = %e, "failed to send notification");
            }
        }
    }
}

/// Render the notification text for one lifecycle event.
///
/// Messages use Telegram HTML parse mode, matching what a human reads in the
/// chat: job id, exchange, truncated symbol list, then per-event context.
fn format_message(event: JobEvent, job: &JobRow) -> String {
    let symbols = summarize_symbols(&job.symbol_list());

    match event {
        JobEvent::Started => format!(
            "🚀 <b>Download Started</b>\n\n\
             <b>Job ID:</b> {}\n\
             <b>Exchange:</b> {}\n\
             <b>Symbols:</b> {}\n\
             <b>Date Range:</b> {} to {}\n\
             <b>Requested by:</b> {}",
            job.id, job.exchange, symbols, job.start_date, job.end_date, job.created_by
        ),
        JobEvent::Completed => {
            let duration = match (job.started_at, job.completed_at) {
                (Some(start), Some(end)) if end >= start => {
                    let minutes = (end - start) as f64 / 60.0;
                    format!("\n<b>Duration:</b> {:.1} minutes", minutes)
                }
                _ => String::new(),
            };
            format!(
                "✅ <b>Download Completed</b>\n\n\
                 <b>Job ID:</b> {}\n\
                 <b>Exchange:</b> {}\n\
                 <b>Symbols:</b> {}{}",
                job.id, job.exchange, symbols, duration
            )
        }
        JobEvent::Failed => {
            let error = job.error_message.as_deref().unwrap_or("unknown error");
            format!(
                "❌ <b>Download Failed</b>\n\n\
                 <b>Job ID:</b> {}\n\
                 <b>Exchange:</b> {}\n\
                 <b>Symbols:</b> {}\n\
                 <b>Error:</b> {}",
                job.id,
                job.exchange,
                symbols,
                truncate_error(error)
            )
        }
    }
}

/// First few symbols spelled out, the rest collapsed to a count
fn summarize_symbols(symbols: &[String]) -> String {
    let mut summary = symbols
        .iter()
        .take(MAX_LISTED_SYMBOLS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if symbols.len() > MAX_LISTED_SYMBOLS {
        summary.push_str(&format!(" (+{} more)", symbols.len() - MAX_LISTED_SYMBOLS));
    }
    summary
}

/// Cap long error messages so a stack of upstream output doesn't flood the chat
fn truncate_error(error: &str) -> String {
    if error.chars().count() > MAX_ERROR_CHARS {
        let truncated: String = error.chars().take(MAX_ERROR_CHARS).collect();
        format!("{}...", truncated)
    } else {
        error.to_string()
    }
}
