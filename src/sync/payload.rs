//! Sync payload schema and validation.
//!
//! The wire format mirrors what the mobile client sends: camelCase fields,
//! four optional entry lists, and an optional in-body api key. Question
//! entries must carry an external id (it is their upsert key); steps,
//! attempts, and feedback may omit theirs, falling back to natural-key or
//! insert semantics.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};

/// Difficulty label for questions and attempt snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

/// One ingestion request body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    /// Shared secret; the x-api-key header takes precedence when both are set
    pub api_key: Option<String>,
    pub questions: Option<Vec<QuestionEntry>>,
    pub solution_steps: Option<Vec<StepEntry>>,
    pub attempts: Option<Vec<AttemptEntry>>,
    pub feedbacks: Option<Vec<FeedbackEntry>>,
}

/// Question entry: external id is the upsert key and therefore required
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub external_id: String,
    pub title: String,
    pub content: String,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
}

/// Solution step entry
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepEntry {
    pub external_id: Option<String>,
    /// Internal question id; takes precedence over questionExternalId
    pub question_id: Option<Uuid>,
    pub question_external_id: Option<String>,
    pub order: i32,
    pub content: String,
}

/// Attempt entry
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptEntry {
    pub external_id: Option<String>,
    pub question_id: Option<Uuid>,
    pub question_external_id: Option<String>,
    pub user_id: Option<String>,
    pub app_user_id: Option<String>,
    pub student_name: Option<String>,
    pub correct: bool,
    pub time_ms: i32,
    /// Number of tries, defaults to 1
    pub attempts: Option<i32>,
    /// Origin label, defaults to "app"
    pub source: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// Feedback entry
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
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

impl SyncPayload {
    /// Validate field constraints, collecting every violation into one
    /// VALIDATION_FAILED error before any processing starts.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut field_errors = Map::new();

        if let Some(questions) = &self.questions {
            for (index, question) in questions.iter().enumerate() {
                if question.external_id.trim().is_empty() {
                    field_errors.insert(
                        format!("questions[{}].externalId", index),
                        json!("must not be empty"),
                    );
                }
                if question.title.trim().len() < 3 {
                    field_errors.insert(
                        format!("questions[{}].title", index),
                        json!("must be at least 3 characters"),
                    );
                }
                if question.content.trim().len() < 3 {
                    field_errors.insert(
                        format!("questions[{}].content", index),
                        json!("must be at least 3 characters"),
                    );
                }
                if let Some(topic) = &question.topic
                    && topic.trim().len() < 2
                {
                    field_errors.insert(
                        format!("questions[{}].topic", index),
                        json!("must be at least 2 characters"),
                    );
                }
            }
        }

        if let Some(steps) = &self.solution_steps {
            for (index, step) in steps.iter().enumerate() {
                if step.order < 1 {
                    field_errors.insert(
                        format!("solutionSteps[{}].order", index),
                        json!("must be at least 1"),
                    );
                }
                if step.content.is_empty() {
                    field_errors.insert(
                        format!("solutionSteps[{}].content", index),
                        json!("must not be empty"),
                    );
                }
            }
        }

        if let Some(attempts) = &self.attempts {
            for (index, attempt) in attempts.iter().enumerate() {
                if attempt.time_ms < 0 {
                    field_errors.insert(
                        format!("attempts[{}].timeMs", index),
                        json!("must be non-negative"),
                    );
                }
                if let Some(tries) = attempt.attempts
                    && tries < 1
                {
                    field_errors.insert(
                        format!("attempts[{}].attempts", index),
                        json!("must be at least 1"),
                    );
                }
            }
        }

        if let Some(feedbacks) = &self.feedbacks {
            for (index, feedback) in feedbacks.iter().enumerate() {
                if !(1..=5).contains(&feedback.rating) {
                    field_errors.insert(
                        format!("feedbacks[{}].rating", index),
                        json!("must be between 1 and 5"),
                    );
                }
            }
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(validation_error(
                "Invalid sync payload",
                Value::Object(field_errors),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_question() -> QuestionEntry {
        QuestionEntry {
            external_id: "Q1".to_string(),
            title: "Counting apples".to_string(),
            content: "How many apples are in the basket?".to_string(),
            topic: None,
            difficulty: None,
        }
    }

    #[test]
    fn test_empty_payload_is_valid() {
        assert!(SyncPayload::default().validate().is_ok());
    }

    #[test]
    fn test_valid_question_passes() {
        let payload = SyncPayload {
            questions: Some(vec![valid_question()]),
            ..Default::default()
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_short_title_is_rejected() {
        let mut question = valid_question();
        question.title = "ab".to_string();
        let payload = SyncPayload {
            questions: Some(vec![question]),
            ..Default::default()
        };

        let error = payload.validate().unwrap_err();
        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        let details = error.details.unwrap();
        assert!(details.as_object().unwrap().contains_key("questions[0].title"));
    }

    #[test]
    fn test_blank_question_external_id_is_rejected() {
        let mut question = valid_question();
        question.external_id = "  ".to_string();
        let payload = SyncPayload {
            questions: Some(vec![question]),
            ..Default::default()
        };

        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_step_order_below_one_is_rejected() {
        let payload = SyncPayload {
            solution_steps: Some(vec![StepEntry {
                external_id: None,
                question_id: None,
                question_external_id: Some("Q1".to_string()),
                order: 0,
                content: "count them".to_string(),
            }]),
            ..Default::default()
        };

        let error = payload.validate().unwrap_err();
        let details = error.details.unwrap();
        assert!(
            details
                .as_object()
                .unwrap()
                .contains_key("solutionSteps[0].order")
        );
    }

    #[test]
    fn test_negative_time_ms_is_rejected() {
        let payload = SyncPayload {
            attempts: Some(vec![AttemptEntry {
                external_id: Some("A1".to_string()),
                question_id: None,
                question_external_id: Some("Q1".to_string()),
                user_id: None,
                app_user_id: None,
                student_name: None,
                correct: true,
                time_ms: -5,
                attempts: None,
                source: None,
                topic: None,
                difficulty: None,
                created_at: None,
            }]),
            ..Default::default()
        };

        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_rating_out_of_range_is_rejected() {
        for rating in [0, 6] {
            let payload = SyncPayload {
                feedbacks: Some(vec![FeedbackEntry {
                    external_id: None,
                    question_id: None,
                    question_external_id: None,
                    user_id: None,
                    app_user_id: None,
                    student_name: None,
                    rating,
                    comment: None,
                    created_at: None,
                }]),
                ..Default::default()
            };
            assert!(payload.validate().is_err());
        }
    }

    #[test]
    fn test_difficulty_deserializes_from_screaming_case() {
        let entry: QuestionEntry = serde_json::from_value(serde_json::json!({
            "externalId": "Q1",
            "title": "Counting",
            "content": "How many?",
            "difficulty": "MEDIUM",
        }))
        .unwrap();

        assert_eq!(entry.difficulty, Some(Difficulty::Medium));
        assert_eq!(entry.difficulty.unwrap().as_str(), "MEDIUM");
    }

    #[test]
    fn test_unknown_difficulty_fails_deserialization() {
        let result: Result<QuestionEntry, _> = serde_json::from_value(serde_json::json!({
            "externalId": "Q1",
            "title": "Counting",
            "content": "How many?",
            "difficulty": "IMPOSSIBLE",
        }));

        assert!(result.is_err());
    }
}
