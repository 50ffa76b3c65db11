//! # Feedback Repository
//!
//! Repository operations for the feedbacks table. question_id is nullable:
//! rows without one are general platform feedback.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::models::feedback::{ActiveModel, Column, Entity, Model};

/// Fields for one feedback row
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub question_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Option<DateTimeWithTimeZone>,
}

/// Repository for feedback database operations
pub struct FeedbackRepository {
    db: DatabaseConnection,
}

impl FeedbackRepository {
    /// Create a new FeedbackRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Latest feedback, optionally scoped to one question
    pub async fn list(
        &self,
        question_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().order_by_desc(Column::CreatedAt).limit(limit);

        if let Some(question_id) = question_id {
            query = query.filter(Column::QuestionId.eq(question_id));
        }

        query.all(&self.db).await
    }

    /// Insert a new feedback row
    pub async fn insert(
        &self,
        data: NewFeedback,
        external_id: Option<String>,
    ) -> Result<Model, DbErr> {
        let feedback = ActiveModel {
            id: Set(Uuid::new_v4()),
            external_id: Set(external_id),
            question_id: Set(data.question_id),
            user_id: Set(data.user_id),
            app_user_id: Set(data.app_user_id),
            student_name: Set(data.student_name),
            rating: Set(data.rating),
            comment: Set(data.comment),
            created_at: Set(data.created_at.unwrap_or_else(|| Utc::now().fixed_offset())),
        };

        feedback.insert(&self.db).await
    }

    /// Upsert keyed by external id
    pub async fn upsert_by_external_id(
        &self,
        external_id: &str,
        data: NewFeedback,
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
                am.rating = Set(data.rating);
                am.comment = Set(data.comment);
                if let Some(created_at) = data.created_at {
                    am.created_at = Set(created_at);
                }
                am.update(&self.db).await
            }
            None => self.insert(data, Some(external_id.to_string())).await,
        }
    }

    /// Delete one feedback row, returning false when it does not exist
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
