//! # SyncLog Repository
//!
//! Repository operations for the append-only sync_logs audit table, plus the
//! aggregate statistics shown on the sync-logs dashboard page.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::models::sync_log::{ActiveModel, Column, Entity, Model};

/// Fields for one audit record
#[derive(Debug, Clone)]
pub struct NewSyncLog {
    pub status: String,
    pub questions_count: i32,
    pub steps_count: i32,
    pub attempts_count: i32,
    pub feedbacks_count: i32,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Aggregate statistics across all recorded ingestion calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncLogStats {
    pub total_syncs: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_questions: i64,
    pub total_steps: i64,
    pub total_attempts: i64,
    pub total_feedbacks: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountSums {
    total_questions: Option<i64>,
    total_steps: Option<i64>,
    total_attempts: Option<i64>,
    total_feedbacks: Option<i64>,
}

/// Repository for sync log database operations
pub struct SyncLogRepository {
    db: DatabaseConnection,
}

impl SyncLogRepository {
    /// Create a new SyncLogRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one audit record
    pub async fn append(&self, data: NewSyncLog) -> Result<Model, DbErr> {
        let log = ActiveModel {
            id: Set(Uuid::new_v4()),
            status: Set(data.status),
            questions_count: Set(data.questions_count),
            steps_count: Set(data.steps_count),
            attempts_count: Set(data.attempts_count),
            feedbacks_count: Set(data.feedbacks_count),
            error_message: Set(data.error_message),
            ip_address: Set(data.ip_address),
            user_agent: Set(data.user_agent),
            created_at: Set(Utc::now().fixed_offset()),
        };

        log.insert(&self.db).await
    }

    /// Latest audit records, newest first
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Aggregate statistics across all recorded calls
    pub async fn stats(&self) -> Result<SyncLogStats, DbErr> {
        let total_syncs = Entity::find().count(&self.db).await?;
        let success_count = Entity::find()
            .filter(Column::Status.eq("success"))
            .count(&self.db)
            .await?;
        let error_count = Entity::find()
            .filter(Column::Status.eq("error"))
            .count(&self.db)
            .await?;

        let sums = Entity::find()
            .select_only()
            .column_as(Column::QuestionsCount.sum(), "total_questions")
            .column_as(Column::StepsCount.sum(), "total_steps")
            .column_as(Column::AttemptsCount.sum(), "total_attempts")
            .column_as(Column::FeedbacksCount.sum(), "total_feedbacks")
            .into_model::<CountSums>()
            .one(&self.db)
            .await?;

        let sums = sums.unwrap_or(CountSums {
            total_questions: None,
            total_steps: None,
            total_attempts: None,
            total_feedbacks: None,
        });

        Ok(SyncLogStats {
            total_syncs,
            success_count,
            error_count,
            total_questions: sums.total_questions.unwrap_or(0),
            total_steps: sums.total_steps.unwrap_or(0),
            total_attempts: sums.total_attempts.unwrap_or(0),
            total_feedbacks: sums.total_feedbacks.unwrap_or(0),
        })
    }
}
