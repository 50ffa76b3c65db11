//! # Keepalive Handler
//!
//! Store liveness probe used by uptime monitors to keep the hosted database
//! from idling out.

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::server::AppState;

/// Keepalive response payload
#[derive(Debug, Serialize, ToSchema)]
pub struct KeepaliveResponse {
    pub status: String,
    pub timestamp: String,
    pub message: String,
}

/// Probe the database connection
#[utoipa::path(
    get,
    path = "/keepalive",
    responses(
        (status = 200, description = "Database is alive", body = KeepaliveResponse),
        (status = 503, description = "Database connection failed", body = ApiError)
    ),
    tag = "health"
)]
pub async fn keepalive(State(state): State<AppState>) -> Result<Json<KeepaliveResponse>, ApiError> {
    if let Err(err) = db::health_check(&state.db).await {
        tracing::error!("Keepalive failed: {}", err);
        return Err(ErrorType::ServiceUnavailable.into());
    }

    Ok(Json(KeepaliveResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        message: "Database is alive".to_string(),
    }))
}
