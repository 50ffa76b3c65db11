//! Feedback entity model
//!
//! Ratings and free-text comments from users, from the sync client, or
//! synthesized by the completion service (student_name "IA"). question_id is
//! nullable: a row with no owning question is general platform feedback.

use super::question::Entity as Question;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Client-assigned sync idempotency key, unique when present
    #[sea_orm(unique)]
    pub external_id: Option<String>,

    /// Owning question, absent for general feedback
    pub question_id: Option<Uuid>,

    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,

    /// Rating, 1..=5
    pub rating: i32,

    /// Free text; completion-service evaluations embed structured output here
    pub comment: Option<String>,

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
