//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Questboard
//! API.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod attempts;
pub mod evaluate;
pub mod feedback;
pub mod health;
pub mod metrics;
pub mod questions;
pub mod steps;
pub mod sync;
pub mod sync_logs;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[cfg(test)]
mod tests;
