//! SolutionStep entity model
//!
//! Ordered worked-solution fragments for one question. Order values are
//! caller-supplied and gap-tolerant; (question_id, step_order) is the natural
//! key when no external id is given.

use super::question::Entity as Question;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "solution_steps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Client-assigned sync idempotency key, unique when present
    #[sea_orm(unique)]
    pub external_id: Option<String>,

    /// Owning question
    pub question_id: Uuid,

    /// Position within the solution, >= 1, unique per question
    pub step_order: i32,

    /// Step text
    pub content: String,

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
