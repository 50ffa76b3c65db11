//! # Data Models
//!
//! This module contains the SeaORM entity models used throughout the
//! Questboard API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod attempt;
pub mod feedback;
pub mod question;
pub mod solution_step;
pub mod sync_log;

pub use attempt::Entity as Attempt;
pub use feedback::Entity as Feedback;
pub use question::Entity as Question;
pub use solution_step::Entity as SolutionStep;
pub use sync_log::Entity as SyncLog;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "questboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
