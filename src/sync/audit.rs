//! Ingestion audit log.
//!
//! Exactly one record is appended per ingestion call attempt, regardless of
//! outcome. Writing the record must never fail the call itself: audit write
//! errors are swallowed and surfaced only through process logs.

use axum::http::HeaderMap;
use metrics::counter;
use tracing::error;

use crate::repositories::{SyncLogRepository, sync_log::NewSyncLog};
use crate::sync::reconciler::SyncSummary;

/// Best-effort caller network metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerMeta {
    pub ip_address: String,
    pub user_agent: String,
}

impl CallerMeta {
    /// Derive caller metadata from standard proxy/forwarding headers,
    /// falling back to "unknown". Never a reason to fail the call.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
            .unwrap_or("unknown")
            .to_string();

        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Append the audit record for one ingestion call attempt.
pub async fn record_ingestion(
    logs: &SyncLogRepository,
    status: &str,
    summary: &SyncSummary,
    meta: &CallerMeta,
    error_message: Option<String>,
) {
    counter!("sync_calls_total", "status" => status.to_string()).increment(1);

    let result = logs
        .append(NewSyncLog {
            status: status.to_string(),
            questions_count: summary.questions,
            steps_count: summary.solution_steps,
            attempts_count: summary.attempts,
            feedbacks_count: summary.feedbacks,
            error_message,
            ip_address: Some(meta.ip_address.clone()),
            user_agent: Some(meta.user_agent.clone()),
        })
        .await;

    if let Err(err) = result {
        // The ingestion outcome already determined stands regardless.
        error!("Failed to write sync audit record: {}", err);
    }
}
