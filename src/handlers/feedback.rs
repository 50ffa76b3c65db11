//! # Feedback Handlers
//!
//! Feedback listing, direct creation, and deletion. The direct creation path
//! is strict about question references, unlike the sync endpoint which
//! degrades unresolvable references to general feedback.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::models::feedback;
use crate::repositories::feedback::NewFeedback;
use crate::repositories::{FeedbackRepository, QuestionRepository};
use crate::server::AppState;

/// One feedback row in API responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInfo {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub question_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<feedback::Model> for FeedbackInfo {
    fn from(model: feedback::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            question_id: model.question_id,
            user_id: model.user_id,
            app_user_id: model.app_user_id,
            student_name: model.student_name,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}

/// Listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbacksResponse {
    pub items: Vec<FeedbackInfo>,
}

/// Query parameters for listing feedback
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListFeedbackQuery {
    /// Scope to one question
    pub question_id: Option<Uuid>,
}

/// Request body for creating feedback
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub external_id: Option<String>,
    pub question_id: Option<Uuid>,
    pub question_external_id: Option<String>,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// List recent feedback, optionally scoped to one question
#[utoipa::path(
    get,
    path = "/feedback",
    security(("bearer_auth" = [])),
    params(ListFeedbackQuery),
    responses(
        (status = 200, description = "Feedback listed", body = FeedbacksResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "feedback"
)]
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<ListFeedbackQuery>,
) -> Result<Json<FeedbacksResponse>, ApiError> {
    let limit = if query.question_id.is_some() { 100 } else { 50 };

    let feedbacks = FeedbackRepository::new(state.db.clone())
        .list(query.question_id, limit)
        .await?;

    Ok(Json(FeedbacksResponse {
        items: feedbacks.into_iter().map(FeedbackInfo::from).collect(),
    }))
}

/// Create one feedback row
#[utoipa::path(
    post,
    path = "/feedback",
    security(("bearer_auth" = [])),
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback created", body = FeedbackInfo),
        (status = 400, description = "Invalid feedback or unresolved question reference", body = ApiError)
    ),
    tag = "feedback"
)]
pub async fn create_feedback(
    State(state): State<AppState>,
    Json(request): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackInfo>), ApiError> {
    if !(1..=5).contains(&request.rating) {
        return Err(validation_error(
            "Invalid feedback",
            json!({ "rating": "must be between 1 and 5" }),
        ));
    }

    let mut question_id = request.question_id;
    if question_id.is_none()
        && let Some(external) = &request.question_external_id
    {
        let questions = QuestionRepository::new(state.db.clone());
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

    let feedback = FeedbackRepository::new(state.db.clone())
        .insert(
            NewFeedback {
                question_id,
                user_id: request.user_id,
                app_user_id: request.app_user_id,
                student_name: request.student_name,
                rating: request.rating,
                comment: request.comment,
                created_at: request.created_at,
            },
            request.external_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(FeedbackInfo::from(feedback))))
}

/// Delete one feedback row
#[utoipa::path(
    delete,
    path = "/feedback/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "Feedback deleted"),
        (status = 404, description = "Feedback not found", body = ApiError)
    ),
    tag = "feedback"
)]
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = FeedbackRepository::new(state.db.clone())
        .delete_by_id(id)
        .await?;

    if deleted {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(not_found("Feedback not found"))
    }
}
