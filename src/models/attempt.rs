//! Attempt entity model
//!
//! One student answer to a question, as reported by the mobile client. The
//! topic/difficulty columns are a denormalized snapshot taken at attempt time,
//! independent of the question's current labels.

use super::question::Entity as Question;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Client-assigned sync idempotency key; without one, every sync delivery
    /// inserts a fresh row
    #[sea_orm(unique)]
    pub external_id: Option<String>,

    /// Owning question
    pub question_id: Uuid,

    /// Submitter identifiers, used only for grouping in the dashboard
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,

    /// Whether the answer was correct
    pub correct: bool,

    /// Elapsed time in milliseconds, non-negative
    pub time_ms: i32,

    /// Number of tries before the answer was submitted
    pub attempt_count: i32,

    /// Origin label, defaults to "app"
    pub source: String,

    /// Topic snapshot at attempt time
    pub topic: Option<String>,

    /// Difficulty snapshot at attempt time
    pub difficulty: Option<String>,

    /// Client-suppliable; defaults to ingestion time
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Question",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
}

impl Related<Question> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
