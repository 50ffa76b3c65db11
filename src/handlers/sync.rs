//! # Sync Ingestion Handler
//!
//! `POST /sync` — the mobile client's batch upload endpoint. One call carries
//! up to four entry lists (questions, solution steps, attempts, feedback),
//! processed in that order so intra-batch references resolve. Every call
//! attempt — including rejected or malformed ones — leaves exactly one audit
//! record.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::repositories::SyncLogRepository;
use crate::server::AppState;
use crate::sync::guard::verify_shared_secret;
use crate::sync::{
    BatchReconciler, CallerMeta, SyncFailure, SyncPayload, SyncSummary, audit::record_ingestion,
};

/// Response payload for a successful ingestion call
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: SyncSummary,
}

/// Ingest one sync batch from the mobile client
#[utoipa::path(
    post,
    path = "/sync",
    request_body = SyncPayload,
    responses(
        (status = 200, description = "Batch processed", body = SyncResponse),
        (status = 400, description = "Invalid payload or unresolved question reference", body = ApiError),
        (status = 401, description = "Missing or mismatched shared secret", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SyncPayload>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let meta = CallerMeta::from_headers(&headers);
    let logs = SyncLogRepository::new(state.db.clone());
    let zero = SyncSummary::default();

    // Malformed bodies still produce an audit record.
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let error = ApiError::from(rejection);
            record_ingestion(&logs, "error", &zero, &meta, Some(error.message.to_string())).await;
            return Err(error);
        }
    };

    if let Err(error) = payload.validate() {
        record_ingestion(&logs, "error", &zero, &meta, Some(error.message.to_string())).await;
        return Err(error);
    }

    if let Err(error) = verify_shared_secret(
        state.config.sync_api_key.as_deref(),
        &headers,
        payload.api_key.as_deref(),
    ) {
        record_ingestion(&logs, "error", &zero, &meta, Some("Unauthorized".to_string())).await;
        return Err(error);
    }

    let reconciler = BatchReconciler::new(state.db.clone());
    match reconciler.run(&payload).await {
        Ok(summary) => {
            record_ingestion(&logs, "success", &summary, &meta, None).await;
            Ok(Json(SyncResponse { ok: true, summary }))
        }
        Err(abort) => {
            let message = abort.failure.message();
            record_ingestion(&logs, "error", &abort.summary, &meta, Some(message.clone())).await;

            let error = match abort.failure {
                SyncFailure::UnresolvedStepReference { .. }
                | SyncFailure::UnresolvedAttemptReference { .. } => ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "UNRESOLVED_REFERENCE".to_string(),
                    message,
                ),
                SyncFailure::Store(err) => ApiError::from(err),
            };
            Err(error)
        }
    }
}
