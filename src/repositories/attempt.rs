//! # Attempt Repository
//!
//! Repository operations for the attempts table. Attempts have no natural key
//! without an external id, so the sync endpoint inserts a fresh row in that
//! case.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::models::attempt::{ActiveModel, Column, Entity, Model};

/// Fields for one attempt row
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub question_id: Uuid,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub correct: bool,
    pub time_ms: i32,
    pub attempt_count: i32,
    pub source: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    /// Client-supplied creation time; ingestion time when absent
    pub created_at: Option<DateTimeWithTimeZone>,
}

/// Repository for attempt database operations
pub struct AttemptRepository {
    db: DatabaseConnection,
}

impl AttemptRepository {
    /// Create a new AttemptRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Latest attempts across all questions, newest first
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// All attempts for one question, newest first
    pub async fn list_for_question(&self, question_id: Uuid) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Most recent attempt for one question, if any
    pub async fn latest_for_question(&self, question_id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .order_by_desc(Column::CreatedAt)
            .one(&self.db)
            .await
    }

    /// Insert a new attempt row
    pub async fn insert(
        &self,
        data: NewAttempt,
        external_id: Option<String>,
    ) -> Result<Model, DbErr> {
        let attempt = ActiveModel {
            id: Set(Uuid::new_v4()),
            external_id: Set(external_id),
            question_id: Set(data.question_id),
            user_id: Set(data.user_id),
            app_user_id: Set(data.app_user_id),
            student_name: Set(data.student_name),
            correct: Set(data.correct),
            time_ms: Set(data.time_ms),
            attempt_count: Set(data.attempt_count),
            source: Set(data.source),
            topic: Set(data.topic),
            difficulty: Set(data.difficulty),
            created_at: Set(data.created_at.unwrap_or_else(|| Utc::now().fixed_offset())),
        };

        attempt.insert(&self.db).await
    }

    /// Upsert keyed by external id
    pub async fn upsert_by_external_id(
        &self,
        external_id: &str,
        data: NewAttempt,
    ) -> Result<Model, DbErr> {
        let existing = Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?;

        match existing {
            Some(model) => {
                let mut am: ActiveModel = model.into();
                am.question_id = Set(data.question_id);
                am.user_id = Set(data.user_id);
                am.app_user_id = Set(data.app_user_id);
                am.student_name = Set(data.student_name);
                am.correct = Set(data.correct);
                am.time_ms = Set(data.time_ms);
                am.attempt_count = Set(data.attempt_count);
                am.source = Set(data.source);
                am.topic = Set(data.topic);
                am.difficulty = Set(data.difficulty);
                if let Some(created_at) = data.created_at {
                    am.created_at = Set(created_at);
                }
                am.update(&self.db).await
            }
            None => self.insert(data, Some(external_id.to_string())).await,
        }
    }
}
