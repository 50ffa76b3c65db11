//! # Solution Step Handlers
//!
//! Listing and direct creation of worked-solution steps for one question.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::models::solution_step;
use crate::repositories::solution_step::StepData;
use crate::repositories::{QuestionRepository, SolutionStepRepository};
use crate::server::AppState;

/// One solution step in API responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub question_id: Uuid,
    pub order: i32,
    pub content: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<solution_step::Model> for StepInfo {
    fn from(model: solution_step::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            question_id: model.question_id,
            order: model.step_order,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

/// Listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct StepsResponse {
    pub items: Vec<StepInfo>,
}

/// Request body for creating a step
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStepRequest {
    pub external_id: Option<String>,
    pub order: i32,
    pub content: String,
}

/// List the steps of one question in solution order
#[utoipa::path(
    get,
    path = "/questions/{id}/steps",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Steps listed", body = StepsResponse),
        (status = 404, description = "Question not found", body = ApiError)
    ),
    tag = "steps"
)]
pub async fn list_steps(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<StepsResponse>, ApiError> {
    let questions = QuestionRepository::new(state.db.clone());
    if questions.find_by_id(question_id).await?.is_none() {
        return Err(not_found("Question not found"));
    }

    let steps = SolutionStepRepository::new(state.db.clone())
        .list_for_question(question_id)
        .await?;

    Ok(Json(StepsResponse {
        items: steps.into_iter().map(StepInfo::from).collect(),
    }))
}

/// Create a step for one question
#[utoipa::path(
    post,
    path = "/questions/{id}/steps",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = CreateStepRequest,
    responses(
        (status = 201, description = "Step created", body = StepInfo),
        (status = 400, description = "Invalid step", body = ApiError),
        (status = 404, description = "Question not found", body = ApiError)
    ),
    tag = "steps"
)]
pub async fn create_step(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(request): Json<CreateStepRequest>,
) -> Result<(StatusCode, Json<StepInfo>), ApiError> {
    if request.order < 1 {
        return Err(validation_error(
            "Invalid step",
            json!({ "order": "must be at least 1" }),
        ));
    }
    if request.content.is_empty() {
        return Err(validation_error(
            "Invalid step",
            json!({ "content": "must not be empty" }),
        ));
    }

    let questions = QuestionRepository::new(state.db.clone());
    if questions.find_by_id(question_id).await?.is_none() {
        return Err(not_found("Question not found"));
    }

    let step = SolutionStepRepository::new(state.db.clone())
        .insert(
            StepData {
                question_id,
                step_order: request.order,
                content: request.content,
            },
            request.external_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(StepInfo::from(step))))
}
