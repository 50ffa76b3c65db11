//! # Question Repository
//!
//! This module provides repository operations for the questions table,
//! including the external-id upsert used by the sync endpoint and the
//! explicit dependent-row cascade used by the admin delete.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::models::question::{ActiveModel, Column, Entity, Model};
use crate::models::{attempt, feedback, solution_step};

/// Fields written by the sync endpoint on every upsert. AI-derived fields are
/// deliberately untouched by sync.
#[derive(Debug, Clone)]
pub struct QuestionSyncData {
    pub title: String,
    pub content: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

/// Fields for direct question creation through the admin API.
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub external_id: Option<String>,
    pub title: String,
    pub content: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub ai_topic: Option<String>,
    pub ai_difficulty: Option<String>,
    pub ai_score: Option<i32>,
    pub last_ai_evaluated_at: Option<DateTimeWithTimeZone>,
}

/// Partial update through the admin API; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

/// Listing filters for the dashboard question browser.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Case-insensitive substring over title, content, and topic
    pub q: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

/// Repository for question database operations
pub struct QuestionRepository {
    db: DatabaseConnection,
}

impl QuestionRepository {
    /// Create a new QuestionRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await
    }

    /// List questions newest first with optional filters
    pub async fn list(&self, filter: &QuestionFilter) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().order_by_desc(Column::CreatedAt);

        if let Some(q) = filter.q.as_deref().filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(Column::Title))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(Column::Content))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(Column::Topic))).like(pattern)),
            );
        }

        if let Some(topic) = filter.topic.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(Column::Topic.eq(topic));
        }

        if let Some(difficulty) = filter.difficulty.as_deref().filter(|d| !d.is_empty()) {
            query = query.filter(Column::Difficulty.eq(difficulty));
        }

        query.all(&self.db).await
    }

    /// Create a question with a freshly assigned internal id
    pub async fn create(&self, data: NewQuestion) -> Result<Model, DbErr> {
        let question = ActiveModel {
            id: Set(Uuid::new_v4()),
            external_id: Set(data.external_id),
            title: Set(data.title),
            content: Set(data.content),
            topic: Set(data.topic),
            difficulty: Set(data.difficulty),
            ai_topic: Set(data.ai_topic),
            ai_difficulty: Set(data.ai_difficulty),
            ai_score: Set(data.ai_score),
            last_ai_evaluated_at: Set(data.last_ai_evaluated_at),
            created_at: Set(Utc::now().fixed_offset()),
        };

        question.insert(&self.db).await
    }

    /// Upsert keyed by external id: update title/content/topic/difficulty on
    /// an existing row, otherwise insert a new one. AI fields survive updates.
    pub async fn upsert_by_external_id(
        &self,
        external_id: &str,
        data: QuestionSyncData,
    ) -> Result<Model, DbErr> {
        if let Some(existing) = self.find_by_external_id(external_id).await? {
            let mut am: ActiveModel = existing.into();
            am.title = Set(data.title);
            am.content = Set(data.content);
            am.topic = Set(data.topic);
            am.difficulty = Set(data.difficulty);
            am.update(&self.db).await
        } else {
            self.create(NewQuestion {
                external_id: Some(external_id.to_string()),
                title: data.title,
                content: data.content,
                topic: data.topic,
                difficulty: data.difficulty,
                ..Default::default()
            })
            .await
        }
    }

    /// Upsert through the admin API: unlike the sync upsert, this overwrites
    /// AI-derived fields too, since the admin create path computes them.
    pub async fn upsert_full_by_external_id(
        &self,
        external_id: &str,
        data: NewQuestion,
    ) -> Result<Model, DbErr> {
        if let Some(existing) = self.find_by_external_id(external_id).await? {
            let mut am: ActiveModel = existing.into();
            am.title = Set(data.title);
            am.content = Set(data.content);
            am.topic = Set(data.topic);
            am.difficulty = Set(data.difficulty);
            am.ai_topic = Set(data.ai_topic);
            am.ai_difficulty = Set(data.ai_difficulty);
            am.ai_score = Set(data.ai_score);
            am.last_ai_evaluated_at = Set(data.last_ai_evaluated_at);
            am.update(&self.db).await
        } else {
            self.create(NewQuestion {
                external_id: Some(external_id.to_string()),
                ..data
            })
            .await
        }
    }

    /// Apply a partial update, returning `None` when the question is absent
    pub async fn update(&self, id: Uuid, patch: QuestionPatch) -> Result<Option<Model>, DbErr> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut am: ActiveModel = existing.into();
        if let Some(external_id) = patch.external_id {
            am.external_id = Set(Some(external_id));
        }
        if let Some(title) = patch.title {
            am.title = Set(title);
        }
        if let Some(content) = patch.content {
            am.content = Set(content);
        }
        if let Some(topic) = patch.topic {
            am.topic = Set(Some(topic));
        }
        if let Some(difficulty) = patch.difficulty {
            am.difficulty = Set(Some(difficulty));
        }

        am.update(&self.db).await.map(Some)
    }

    /// Record a completion-service evaluation on the question
    pub async fn record_ai_evaluation(
        &self,
        id: Uuid,
        score: Option<i32>,
    ) -> Result<Option<Model>, DbErr> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut am: ActiveModel = existing.into();
        am.ai_score = Set(score);
        am.last_ai_evaluated_at = Set(Some(Utc::now().fixed_offset()));

        am.update(&self.db).await.map(Some)
    }

    /// Delete a question together with its steps, attempts, and feedback.
    /// Returns false when the question does not exist.
    pub async fn delete_with_dependents(&self, id: Uuid) -> Result<bool, DbErr> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let txn = self.db.begin().await?;

        solution_step::Entity::delete_many()
            .filter(solution_step::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;

        attempt::Entity::delete_many()
            .filter(attempt::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;

        feedback::Entity::delete_many()
            .filter(feedback::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;

        Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Questions evaluated (or, lacking an evaluation, created) since `start`.
    /// Feeds the dashboard metrics endpoint.
    pub async fn evaluated_or_created_since(
        &self,
        start: DateTimeWithTimeZone,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(
                Condition::any()
                    .add(Column::LastAiEvaluatedAt.gte(start))
                    .add(
                        Condition::all()
                            .add(Column::LastAiEvaluatedAt.is_null())
                            .add(Column::CreatedAt.gte(start)),
                    ),
            )
            .all(&self.db)
            .await
    }
}
