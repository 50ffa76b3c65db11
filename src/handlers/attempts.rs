//! # Attempt Handlers
//!
//! Recent-attempt listing and direct attempt creation. Unlike the sync
//! endpoint's lenient feedback handling, a direct attempt submission with an
//! unresolvable question reference is rejected.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::models::attempt;
use crate::repositories::attempt::NewAttempt;
use crate::repositories::{AttemptRepository, QuestionRepository};
use crate::server::AppState;
use crate::sync::payload::Difficulty;

/// One attempt in API responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInfo {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub question_id: Uuid,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub correct: bool,
    pub time_ms: i32,
    pub attempts: i32,
    pub source: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<attempt::Model> for AttemptInfo {
    fn from(model: attempt::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            question_id: model.question_id,
            user_id: model.user_id,
            app_user_id: model.app_user_id,
            student_name: model.student_name,
            correct: model.correct,
            time_ms: model.time_ms,
            attempts: model.attempt_count,
            source: model.source,
            topic: model.topic,
            difficulty: model.difficulty,
            created_at: model.created_at,
        }
    }
}

/// Listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct AttemptsResponse {
    pub items: Vec<AttemptInfo>,
}

/// Query parameters for listing attempts
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAttemptsQuery {
    /// Maximum number of attempts to return (default: 50, max: 200)
    pub limit: Option<u64>,
}

/// Request body for creating an attempt
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptRequest {
    pub external_id: Option<String>,
    pub question_id: Option<Uuid>,
    pub question_external_id: Option<String>,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub correct: bool,
    pub time_ms: i32,
    pub attempts: Option<i32>,
    pub source: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// List the most recent attempts
#[utoipa::path(
    get,
    path = "/attempts",
    security(("bearer_auth" = [])),
    params(ListAttemptsQuery),
    responses(
        (status = 200, description = "Attempts listed", body = AttemptsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "attempts"
)]
pub async fn list_attempts(
    State(state): State<AppState>,
    Query(query): Query<ListAttemptsQuery>,
) -> Result<Json<AttemptsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(50).min(200);

    let attempts = AttemptRepository::new(state.db.clone())
        .list_recent(limit)
        .await?;

    Ok(Json(AttemptsResponse {
        items: attempts.into_iter().map(AttemptInfo::from).collect(),
    }))
}

/// Create one attempt
#[utoipa::path(
    post,
    path = "/attempts",
    security(("bearer_auth" = [])),
    request_body = CreateAttemptRequest,
    responses(
        (status = 201, description = "Attempt created", body = AttemptInfo),
        (status = 400, description = "Invalid attempt or unresolved question reference", body = ApiError)
    ),
    tag = "attempts"
)]
pub async fn create_attempt(
    State(state): State<AppState>,
    Json(request): Json<CreateAttemptRequest>,
) -> Result<(StatusCode, Json<AttemptInfo>), ApiError> {
    if request.time_ms < 0 {
        return Err(validation_error(
            "Invalid attempt",
            json!({ "timeMs": "must be non-negative" }),
        ));
    }
    if let Some(tries) = request.attempts
        && tries < 1
    {
        return Err(validation_error(
            "Invalid attempt",
            json!({ "attempts": "must be at least 1" }),
        ));
    }

    let questions = QuestionRepository::new(state.db.clone());

    let mut question_id = request.question_id;
    if question_id.is_none()
        && let Some(external) = &request.question_external_id
    {
        match questions.find_by_external_id(external).await? {
            Some(question) => question_id = Some(question.id),
            None => {
                return Err(validation_error(
                    "Question not found for externalId",
                    json!({ "questionExternalId": external }),
                ));
            }
        }
    }

    let Some(question_id) = question_id else {
        return Err(validation_error(
            "Missing questionId",
            json!({ "questionId": "either questionId or questionExternalId is required" }),
        ));
    };

    let attempt = AttemptRepository::new(state.db.clone())
        .insert(
            NewAttempt {
                question_id,
                user_id: request.user_id,
                app_user_id: request.app_user_id,
                student_name: request.student_name,
                correct: request.correct,
                time_ms: request.time_ms,
                attempt_count: request.attempts.unwrap_or(1),
                source: request.source.unwrap_or_else(|| "app".to_string()),
                topic: request.topic,
                difficulty: request.difficulty.map(|d| d.as_str().to_string()),
                created_at: request.created_at,
            },
            request.external_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AttemptInfo::from(attempt))))
}
