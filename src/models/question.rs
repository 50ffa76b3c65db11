//! Question entity model
//!
//! This module contains the SeaORM entity model for the questions table, the
//! root entity that solution steps, attempts, and question-bound feedback
//! reference.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Question entity representing one math question in the content pipeline
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    /// Unique identifier for the question (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Client-assigned identifier used as the sync idempotency key.
    /// A question without one can never be targeted by later sync batches.
    #[sea_orm(unique)]
    pub external_id: Option<String>,

    /// Short title shown in listings
    pub title: String,

    /// Full question statement
    pub content: String,

    /// Staff-assigned topic label
    pub topic: Option<String>,

    /// Staff-assigned difficulty (EASY | MEDIUM | HARD)
    pub difficulty: Option<String>,

    /// Topic derived by the completion service
    pub ai_topic: Option<String>,

    /// Difficulty derived by the completion service
    pub ai_difficulty: Option<String>,

    /// Clarity/adequacy score (0-100) from the completion service
    pub ai_score: Option<i32>,

    /// Timestamp of the last completion-service evaluation
    pub last_ai_evaluated_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the question was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::solution_step::Entity")]
    SolutionSteps,
    #[sea_orm(has_many = "super::attempt::Entity")]
    Attempts,
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedbacks,
}

impl Related<super::solution_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SolutionSteps.def()
    }
}

impl Related<super::attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedbacks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
