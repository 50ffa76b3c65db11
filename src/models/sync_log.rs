//! SyncLog entity model
//!
//! Append-only audit record for the ingestion endpoint: exactly one row per
//! call attempt, successful or not.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Outcome of the call ("success" | "error")
    pub status: String,

    /// Questions upserted before the call finished or aborted
    pub questions_count: i32,

    /// Solution steps upserted before the call finished or aborted
    pub steps_count: i32,

    /// Attempts upserted before the call finished or aborted
    pub attempts_count: i32,

    /// Feedback rows upserted before the call finished or aborted
    pub feedbacks_count: i32,

    /// Diagnostic message for failed calls
    pub error_message: Option<String>,

    /// Best-effort caller address from forwarding headers
    pub ip_address: Option<String>,

    /// Best-effort caller user agent
    pub user_agent: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
