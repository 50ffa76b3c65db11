//! # SolutionStep Repository
//!
//! Repository operations for the solution_steps table. The sync endpoint
//! upserts by the step's own external id when present, otherwise by the
//! natural key (question_id, step_order).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::models::solution_step::{ActiveModel, Column, Entity, Model};

/// Upsert key, resolved once per entry before touching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpsertKey {
    /// Idempotency key supplied by the sync client
    ExternalId(String),
    /// Natural key used when the client supplied no external id
    QuestionOrder { question_id: Uuid, step_order: i32 },
}

/// Fields written on every step upsert
#[derive(Debug, Clone)]
pub struct StepData {
    pub question_id: Uuid,
    pub step_order: i32,
    pub content: String,
}

/// Repository for solution step database operations
pub struct SolutionStepRepository {
    db: DatabaseConnection,
}

impl SolutionStepRepository {
    /// Create a new SolutionStepRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Steps of one question in solution order
    pub async fn list_for_question(&self, question_id: Uuid) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .order_by_asc(Column::StepOrder)
            .all(&self.db)
            .await
    }

    /// Insert a step directly (admin API path)
    pub async fn insert(
        &self,
        data: StepData,
        external_id: Option<String>,
    ) -> Result<Model, DbErr> {
        let step = ActiveModel {
            id: Set(Uuid::new_v4()),
            external_id: Set(external_id),
            question_id: Set(data.question_id),
            step_order: Set(data.step_order),
            content: Set(data.content),
            created_at: Set(Utc::now().fixed_offset()),
        };

        step.insert(&self.db).await
    }

    /// Upsert keyed by the resolved strategy
    pub async fn upsert(&self, key: StepUpsertKey, data: StepData) -> Result<Model, DbErr> {
        let existing = match &key {
            StepUpsertKey::ExternalId(external_id) => {
                Entity::find()
                    .filter(Column::ExternalId.eq(external_id.as_str()))
                    .one(&self.db)
                    .await?
            }
            StepUpsertKey::QuestionOrder {
                question_id,
                step_order,
            } => {
                Entity::find()
                    .filter(Column::QuestionId.eq(*question_id))
                    .filter(Column::StepOrder.eq(*step_order))
                    .one(&self.db)
                    .await?
            }
        };

        match existing {
            Some(model) => {
                let mut am: ActiveModel = model.into();
                am.question_id = Set(data.question_id);
                am.step_order = Set(data.step_order);
                am.content = Set(data.content);
                am.update(&self.db).await
            }
            None => {
                let external_id = match key {
                    StepUpsertKey::ExternalId(external_id) => Some(external_id),
                    StepUpsertKey::QuestionOrder { .. } => None,
                };
                self.insert(data, external_id).await
            }
        }
    }
}
