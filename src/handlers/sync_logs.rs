//! # Sync Log Handlers
//!
//! Audit trail browser for the sync ingestion endpoint: the latest 100
//! records plus aggregate statistics.

use axum::{extract::State, response::Json};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::sync_log;
use crate::repositories::SyncLogRepository;
use crate::server::AppState;

/// One audit record in API responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogInfo {
    pub id: Uuid,
    pub status: String,
    pub questions_count: i32,
    pub steps_count: i32,
    pub attempts_count: i32,
    pub feedbacks_count: i32,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<sync_log::Model> for SyncLogInfo {
    fn from(model: sync_log::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            questions_count: model.questions_count,
            steps_count: model.steps_count,
            attempts_count: model.attempts_count,
            feedbacks_count: model.feedbacks_count,
            error_message: model.error_message,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            created_at: model.created_at,
        }
    }
}

/// Aggregate statistics across all recorded calls
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsInfo {
    pub total_syncs: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_questions: i64,
    pub total_steps: i64,
    pub total_attempts: i64,
    pub total_feedbacks: i64,
}

/// Response payload for the sync-logs endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncLogsResponse {
    pub logs: Vec<SyncLogInfo>,
    pub stats: SyncStatsInfo,
}

/// List the latest audit records with aggregate statistics
#[utoipa::path(
    get,
    path = "/sync-logs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sync logs listed", body = SyncLogsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn list_sync_logs(
    State(state): State<AppState>,
) -> Result<Json<SyncLogsResponse>, ApiError> {
    let repo = SyncLogRepository::new(state.db.clone());

    let logs = repo.list_recent(100).await?;
    let stats = repo.stats().await?;

    Ok(Json(SyncLogsResponse {
        logs: logs.into_iter().map(SyncLogInfo::from).collect(),
        stats: SyncStatsInfo {
            total_syncs: stats.total_syncs,
            success_count: stats.success_count,
            error_count: stats.error_count,
            total_questions: stats.total_questions,
            total_steps: stats.total_steps,
            total_attempts: stats.total_attempts,
            total_feedbacks: stats.total_feedbacks,
        },
    }))
}
