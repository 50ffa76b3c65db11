//! # Question Handlers
//!
//! Dashboard CRUD for questions: filtered listing, creation with best-effort
//! completion-service classification, detail with related rows, partial
//! update, and explicit-cascade deletion.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::handlers::attempts::AttemptInfo;
use crate::handlers::feedback::FeedbackInfo;
use crate::handlers::steps::StepInfo;
use crate::models::question;
use crate::repositories::question::{NewQuestion, QuestionFilter, QuestionPatch};
use crate::repositories::{
    AttemptRepository, FeedbackRepository, QuestionRepository, SolutionStepRepository,
};
use crate::server::AppState;
use crate::sync::payload::Difficulty;

/// Query parameters for listing questions
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuestionsQuery {
    /// Case-insensitive substring over title, content, and topic
    pub q: Option<String>,
    /// Exact topic filter
    pub topic: Option<String>,
    /// Exact difficulty filter (EASY | MEDIUM | HARD)
    pub difficulty: Option<String>,
}

/// Submitter of the most recent attempt, shown in listings
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastAttemptInfo {
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
}

/// One question in the dashboard listing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInfo {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub title: String,
    pub content: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub ai_topic: Option<String>,
    pub ai_difficulty: Option<String>,
    pub ai_score: Option<i32>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_ai_evaluated_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<LastAttemptInfo>,
}

impl QuestionInfo {
    fn from_model(model: question::Model, last_attempt: Option<LastAttemptInfo>) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            title: model.title,
            content: model.content,
            topic: model.topic,
            difficulty: model.difficulty,
            ai_topic: model.ai_topic,
            ai_difficulty: model.ai_difficulty,
            ai_score: model.ai_score,
            last_ai_evaluated_at: model.last_ai_evaluated_at,
            created_at: model.created_at,
            last_attempt,
        }
    }
}

/// Listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsResponse {
    pub items: Vec<QuestionInfo>,
}

/// Request body for creating a question
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub external_id: Option<String>,
    pub title: String,
    pub content: String,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Request body for partially updating a question
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Question detail with related rows
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: QuestionInfo,
    pub steps: Vec<StepInfo>,
    pub attempts: Vec<AttemptInfo>,
    pub feedbacks: Vec<FeedbackInfo>,
}

fn validate_question_fields(
    title: Option<&str>,
    content: Option<&str>,
    topic: Option<&str>,
) -> Result<(), ApiError> {
    let mut field_errors = Map::new();

    if let Some(title) = title
        && title.trim().len() < 3
    {
        field_errors.insert("title".to_string(), json!("must be at least 3 characters"));
    }
    if let Some(content) = content
        && content.trim().len() < 3
    {
        field_errors.insert("content".to_string(), json!("must be at least 3 characters"));
    }
    if let Some(topic) = topic
        && topic.trim().len() < 2
    {
        field_errors.insert("topic".to_string(), json!("must be at least 2 characters"));
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(validation_error(
            "Invalid question",
            Value::Object(field_errors),
        ))
    }
}

/// List questions with optional filters, newest first
#[utoipa::path(
    get,
    path = "/questions",
    security(("bearer_auth" = [])),
    params(ListQuestionsQuery),
    responses(
        (status = 200, description = "Questions listed", body = QuestionsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "questions"
)]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let questions = QuestionRepository::new(state.db.clone());
    let attempts = AttemptRepository::new(state.db.clone());

    let filter = QuestionFilter {
        q: query.q,
        topic: query.topic,
        difficulty: query.difficulty,
    };

    let models = questions.list(&filter).await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        let last_attempt = attempts
            .latest_for_question(model.id)
            .await?
            .map(|attempt| LastAttemptInfo {
                app_user_id: attempt.app_user_id,
                student_name: attempt.student_name,
            });
        items.push(QuestionInfo::from_model(model, last_attempt));
    }

    Ok(Json(QuestionsResponse { items }))
}

/// Create a question, classifying it when topic or difficulty is missing
#[utoipa::path(
    post,
    path = "/questions",
    security(("bearer_auth" = [])),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionInfo),
        (status = 400, description = "Invalid question", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "questions"
)]
pub async fn create_question(
    State(state): State<AppState>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionInfo>), ApiError> {
    validate_question_fields(
        Some(&request.title),
        Some(&request.content),
        request.topic.as_deref(),
    )?;

    // Classification is best-effort: a failed or unconfigured completion
    // service never fails the create.
    let classification = if request.topic.is_none() || request.difficulty.is_none() {
        state.completion.classify(&request.content).await
    } else {
        None
    };

    let ai_topic = classification.as_ref().and_then(|c| c.topic.clone());
    let ai_difficulty = classification.as_ref().and_then(|c| c.difficulty.clone());
    let ai_score = classification.as_ref().and_then(|c| c.score);
    let evaluated = ai_topic.is_some() || ai_difficulty.is_some() || ai_score.is_some();

    let data = NewQuestion {
        external_id: request.external_id.clone(),
        title: request.title,
        content: request.content,
        topic: request
            .topic
            .or_else(|| ai_topic.clone())
            .or_else(|| Some("Math".to_string())),
        difficulty: request
            .difficulty
            .map(|d| d.as_str().to_string())
            .or_else(|| ai_difficulty.clone()),
        ai_topic,
        ai_difficulty,
        ai_score,
        last_ai_evaluated_at: evaluated.then(|| Utc::now().fixed_offset()),
    };

    let repo = QuestionRepository::new(state.db.clone());
    let item = match &request.external_id {
        Some(external_id) => repo.upsert_full_by_external_id(external_id, data).await?,
        None => repo.create(data).await?,
    };

    info!(question_id = %item.id, "Question created");
    Ok((
        StatusCode::CREATED,
        Json(QuestionInfo::from_model(item, None)),
    ))
}

/// Fetch one question with its steps, attempts, and feedback
#[utoipa::path(
    get,
    path = "/questions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question detail", body = QuestionDetail),
        (status = 404, description = "Question not found", body = ApiError)
    ),
    tag = "questions"
)]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionDetail>, ApiError> {
    let questions = QuestionRepository::new(state.db.clone());

    let Some(model) = questions.find_by_id(id).await? else {
        return Err(not_found("Question not found"));
    };

    let steps = SolutionStepRepository::new(state.db.clone())
        .list_for_question(id)
        .await?;
    let attempts = AttemptRepository::new(state.db.clone())
        .list_for_question(id)
        .await?;
    let feedbacks = FeedbackRepository::new(state.db.clone())
        .list(Some(id), 100)
        .await?;

    Ok(Json(QuestionDetail {
        question: QuestionInfo::from_model(model, None),
        steps: steps.into_iter().map(StepInfo::from).collect(),
        attempts: attempts.into_iter().map(AttemptInfo::from).collect(),
        feedbacks: feedbacks.into_iter().map(FeedbackInfo::from).collect(),
    }))
}

/// Partially update a question
#[utoipa::path(
    patch,
    path = "/questions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = QuestionInfo),
        (status = 400, description = "Invalid question", body = ApiError),
        (status = 404, description = "Question not found", body = ApiError)
    ),
    tag = "questions"
)]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<QuestionInfo>, ApiError> {
    validate_question_fields(
        request.title.as_deref(),
        request.content.as_deref(),
        request.topic.as_deref(),
    )?;

    let patch = QuestionPatch {
        external_id: request.external_id,
        title: request.title,
        content: request.content,
        topic: request.topic,
        difficulty: request.difficulty.map(|d| d.as_str().to_string()),
    };

    let repo = QuestionRepository::new(state.db.clone());
    match repo.update(id, patch).await? {
        Some(model) => Ok(Json(QuestionInfo::from_model(model, None))),
        None => Err(not_found("Question not found")),
    }
}

/// Delete a question together with its dependent rows
#[utoipa::path(
    delete,
    path = "/questions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Question not found", body = ApiError)
    ),
    tag = "questions"
)]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = QuestionRepository::new(state.db.clone());

    if repo.delete_with_dependents(id).await? {
        info!(question_id = %id, "Question deleted with dependents");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Question not found"))
    }
}
