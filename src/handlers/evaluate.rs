//! # Evaluation Handlers
//!
//! Completion-service-backed grading and suggestion endpoints. Grading can
//! persist its result onto the question and append a synthetic feedback row
//! attributed to "IA"; suggestion can additionally render an illustration,
//! tolerating image failures in-band.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::completion::{CompletionError, Evaluation};
use crate::error::{ApiError, completion_error, not_found};
use crate::repositories::feedback::NewFeedback;
use crate::repositories::{FeedbackRepository, QuestionRepository};
use crate::server::AppState;

/// Request body for grading a question
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// Question statement to grade
    pub question: String,
    /// Optional student answer for context
    pub answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    /// When set, the score is persisted onto this question and a synthetic
    /// "IA" feedback row is appended
    pub question_id: Option<Uuid>,
}

/// Request body for suggesting a replacement question
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    /// Current question statement
    pub question: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    /// Request an illustration even when the model offers no image prompt
    #[serde(default)]
    pub force_image: bool,
}

/// Response payload for the suggest endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    pub question: Option<String>,
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
}

/// Map a 0-100 score onto the 1-5 feedback rating scale; 3 when unscored.
pub(crate) fn rating_from_score(score: Option<i32>) -> i32 {
    match score {
        Some(score) => ((f64::from(score) / 20.0).round() as i32).clamp(1, 5),
        None => 3,
    }
}

/// Fold an evaluation into a feedback comment.
pub(crate) fn comment_from_evaluation(evaluation: &Evaluation) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(summary) = &evaluation.summary
        && !summary.is_empty()
    {
        parts.push(summary.clone());
    }
    if !evaluation.suggestions.is_empty() {
        parts.push(format!("Suggestions: {}", evaluation.suggestions.join("; ")));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn map_completion_error(err: CompletionError) -> ApiError {
    match err {
        CompletionError::NotConfigured => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "COMPLETION_NOT_CONFIGURED",
            "Completion service is not configured",
        ),
        CompletionError::Upstream { status, body } => completion_error(status, Some(body)),
        CompletionError::Network(err) => {
            tracing::error!("Completion service network error: {}", err);
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "COMPLETION_ERROR",
                "Completion service unreachable",
            )
        }
        CompletionError::Malformed(detail) => {
            tracing::error!("Malformed completion response: {}", detail);
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "COMPLETION_ERROR",
                "Completion service returned an unexpected response",
            )
        }
    }
}

/// Grade a question statement, optionally persisting the result
#[utoipa::path(
    post,
    path = "/evaluate",
    security(("bearer_auth" = [])),
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Evaluation result", body = Evaluation),
        (status = 400, description = "Missing question statement", body = ApiError),
        (status = 404, description = "Question to persist onto not found", body = ApiError),
        (status = 502, description = "Completion service failure", body = ApiError)
    ),
    tag = "evaluate"
)]
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(crate::error::validation_error(
            "Question statement is required",
            serde_json::json!({ "question": "must not be empty" }),
        ));
    }

    let evaluation = state
        .completion
        .evaluate(
            &request.question,
            request.answer.as_deref(),
            request.topic.as_deref(),
            request.difficulty.as_deref(),
        )
        .await
        .map_err(map_completion_error)?;

    if let Some(question_id) = request.question_id {
        let questions = QuestionRepository::new(state.db.clone());
        if questions
            .record_ai_evaluation(question_id, evaluation.score)
            .await?
            .is_none()
        {
            return Err(not_found("Question not found"));
        }

        FeedbackRepository::new(state.db.clone())
            .insert(
                NewFeedback {
                    question_id: Some(question_id),
                    user_id: None,
                    app_user_id: None,
                    student_name: Some("IA".to_string()),
                    rating: rating_from_score(evaluation.score),
                    comment: comment_from_evaluation(&evaluation),
                    created_at: None,
                },
                None,
            )
            .await?;
    }

    Ok(Json(evaluation))
}

/// Suggest a replacement question, optionally with an illustration
#[utoipa::path(
    post,
    path = "/evaluate/suggest",
    security(("bearer_auth" = [])),
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggested question", body = SuggestResponse),
        (status = 400, description = "Missing question statement", body = ApiError),
        (status = 502, description = "Completion service failure", body = ApiError)
    ),
    tag = "evaluate"
)]
pub async fn suggest(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(crate::error::validation_error(
            "Question statement is required",
            serde_json::json!({ "question": "must not be empty" }),
        ));
    }

    let suggestion = state
        .completion
        .suggest(
            &request.question,
            request.topic.as_deref(),
            request.difficulty.as_deref(),
        )
        .await
        .map_err(map_completion_error)?;

    let mut image_prompt = suggestion.image_prompt.clone();
    if image_prompt.is_none() && request.force_image {
        let subject = suggestion
            .question
            .clone()
            .unwrap_or_else(|| request.question.clone());
        image_prompt = Some(format!("Illustrate simply and playfully: {}", subject));
    }

    let mut image_base64 = None;
    let mut image_error = None;
    if let Some(prompt) = &image_prompt {
        // Image failures are reported in-band, never as a request failure.
        match state.completion.generate_image(prompt).await {
            Ok(data) => image_base64 = Some(data),
            Err(err) => {
                tracing::warn!("Illustration generation failed: {}", err);
                image_error = Some(err.to_string());
            }
        }
    }

    Ok(Json(SuggestResponse {
        question: suggestion.question,
        rationale: suggestion.rationale,
        image_prompt,
        image_base64,
        image_error,
    }))
}
