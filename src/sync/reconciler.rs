//! Batch reconciler for the sync ingestion endpoint.
//!
//! Processes one ingestion payload in fixed dependency order — questions,
//! then solution steps, then attempts, then feedback — so that entries of
//! later types can reference questions created earlier in the same batch.
//! Entries are processed one at a time, in array order; counters are
//! incremented only after a successful persist.
//!
//! There is no transaction spanning the batch: work committed before a fatal
//! failure stays committed, and the audit record reports exactly how far the
//! call got. Retry is the client's responsibility; the external-id upsert
//! keys make redelivery safe.

use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::repositories::solution_step::{StepData, StepUpsertKey};
use crate::repositories::{
    AttemptRepository, FeedbackRepository, QuestionRepository, SolutionStepRepository,
    attempt::NewAttempt, feedback::NewFeedback, question::QuestionSyncData,
};
use crate::sync::payload::SyncPayload;
use crate::sync::resolver::{QuestionIdMemo, resolve_question_id};

/// Per-type counts of successfully persisted entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub questions: i32,
    pub solution_steps: i32,
    pub attempts: i32,
    pub feedbacks: i32,
}

/// Fatal conditions that abort the remainder of a batch
#[derive(Debug)]
pub enum SyncFailure {
    /// A solution step referenced a question that resolves to nothing
    UnresolvedStepReference { external_id: String },
    /// An attempt referenced a question that resolves to nothing
    UnresolvedAttemptReference { external_id: String },
    /// The underlying store failed
    Store(DbErr),
}

impl SyncFailure {
    /// Human-readable message, naming the offending entry where applicable
    pub fn message(&self) -> String {
        match self {
            SyncFailure::UnresolvedStepReference { external_id } => {
                format!("Question not found for solution step {}", external_id)
            }
            SyncFailure::UnresolvedAttemptReference { external_id } => {
                format!("Question not found for attempt {}", external_id)
            }
            SyncFailure::Store(err) => err.to_string(),
        }
    }
}

/// An aborted batch: the failure plus however much was persisted before it
#[derive(Debug)]
pub struct SyncAbort {
    pub summary: SyncSummary,
    pub failure: SyncFailure,
}

/// Reconciles one ingestion payload against the store
pub struct BatchReconciler {
    questions: QuestionRepository,
    steps: SolutionStepRepository,
    attempts: AttemptRepository,
    feedbacks: FeedbackRepository,
}

impl BatchReconciler {
    /// Create a new BatchReconciler over the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            questions: QuestionRepository::new(db.clone()),
            steps: SolutionStepRepository::new(db.clone()),
            attempts: AttemptRepository::new(db.clone()),
            feedbacks: FeedbackRepository::new(db),
        }
    }

    /// Process the payload, returning per-type counts on success or the
    /// counts accumulated before the first fatal failure.
    pub async fn run(&self, payload: &SyncPayload) -> Result<SyncSummary, SyncAbort> {
        let mut summary = SyncSummary::default();
        let mut memo = QuestionIdMemo::new();

        if let Some(questions) = &payload.questions {
            for entry in questions {
                let data = QuestionSyncData {
                    title: entry.title.clone(),
                    content: entry.content.clone(),
                    topic: entry.topic.clone(),
                    difficulty: entry.difficulty.map(|d| d.as_str().to_string()),
                };

                let saved = self
                    .questions
                    .upsert_by_external_id(&entry.external_id, data)
                    .await
                    .map_err(|err| store_abort(summary, err))?;

                memo.insert(entry.external_id.clone(), saved.id);
                summary.questions += 1;
                counter!("sync_entries_processed_total", "entity" => "question").increment(1);
            }
        }

        if let Some(steps) = &payload.solution_steps {
            for entry in steps {
                let mut question_id = entry.question_id;
                if question_id.is_none()
                    && let Some(external) = &entry.question_external_id
                {
                    question_id = resolve_question_id(&self.questions, &mut memo, external)
                        .await
                        .map_err(|err| store_abort(summary, err))?;
                }

                let Some(question_id) = question_id else {
                    return Err(SyncAbort {
                        summary,
                        failure: SyncFailure::UnresolvedStepReference {
                            external_id: entry.external_id.clone().unwrap_or_default(),
                        },
                    });
                };

                let key = match &entry.external_id {
                    Some(external_id) => StepUpsertKey::ExternalId(external_id.clone()),
                    None => StepUpsertKey::QuestionOrder {
                        question_id,
                        step_order: entry.order,
                    },
                };

                self.steps
                    .upsert(
                        key,
                        StepData {
                            question_id,
                            step_order: entry.order,
                            content: entry.content.clone(),
                        },
                    )
                    .await
                    .map_err(|err| store_abort(summary, err))?;

                summary.solution_steps += 1;
                counter!("sync_entries_processed_total", "entity" => "solution_step").increment(1);
            }
        }

        if let Some(attempts) = &payload.attempts {
            for entry in attempts {
                let mut question_id = entry.question_id;
                if question_id.is_none()
                    && let Some(external) = &entry.question_external_id
                {
                    question_id = resolve_question_id(&self.questions, &mut memo, external)
                        .await
                        .map_err(|err| store_abort(summary, err))?;
                }

                let Some(question_id) = question_id else {
                    return Err(SyncAbort {
                        summary,
                        failure: SyncFailure::UnresolvedAttemptReference {
                            external_id: entry.external_id.clone().unwrap_or_default(),
                        },
                    });
                };

                let data = NewAttempt {
                    question_id,
                    user_id: entry.user_id.clone(),
                    app_user_id: entry.app_user_id.clone(),
                    student_name: entry.student_name.clone(),
                    correct: entry.correct,
                    time_ms: entry.time_ms,
                    attempt_count: entry.attempts.unwrap_or(1),
                    source: entry.source.clone().unwrap_or_else(|| "app".to_string()),
                    topic: entry.topic.clone(),
                    difficulty: entry.difficulty.map(|d| d.as_str().to_string()),
                    created_at: entry.created_at,
                };

                match &entry.external_id {
                    Some(external_id) => self
                        .attempts
                        .upsert_by_external_id(external_id, data)
                        .await
                        .map_err(|err| store_abort(summary, err))?,
                    None => self
                        .attempts
                        .insert(data, None)
                        .await
                        .map_err(|err| store_abort(summary, err))?,
                };

                summary.attempts += 1;
                counter!("sync_entries_processed_total", "entity" => "attempt").increment(1);
            }
        }

        if let Some(feedbacks) = &payload.feedbacks {
            for entry in feedbacks {
                let mut question_id = entry.question_id;
                if question_id.is_none()
                    && let Some(external) = &entry.question_external_id
                {
                    // Lenient by design: a feedback entry whose question
                    // reference resolves to nothing is kept as general
                    // feedback instead of failing the batch.
                    question_id = resolve_question_id(&self.questions, &mut memo, external)
                        .await
                        .map_err(|err| store_abort(summary, err))?;
                }

                let data = NewFeedback {
                    question_id,
                    user_id: entry.user_id.clone(),
                    app_user_id: entry.app_user_id.clone(),
                    student_name: entry.student_name.clone(),
                    rating: entry.rating,
                    comment: entry.comment.clone(),
                    created_at: entry.created_at,
                };

                match &entry.external_id {
                    Some(external_id) => self
                        .feedbacks
                        .upsert_by_external_id(external_id, data)
                        .await
                        .map_err(|err| store_abort(summary, err))?,
                    None => self
                        .feedbacks
                        .insert(data, None)
                        .await
                        .map_err(|err| store_abort(summary, err))?,
                };

                summary.feedbacks += 1;
                counter!("sync_entries_processed_total", "entity" => "feedback").increment(1);
            }
        }

        info!(
            questions = summary.questions,
            solution_steps = summary.solution_steps,
            attempts = summary.attempts,
            feedbacks = summary.feedbacks,
            "Sync batch reconciled"
        );

        Ok(summary)
    }
}

fn store_abort(summary: SyncSummary, err: DbErr) -> SyncAbort {
    SyncAbort {
        summary,
        failure: SyncFailure::Store(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_name_the_offending_entry() {
        let failure = SyncFailure::UnresolvedStepReference {
            external_id: "S1".to_string(),
        };
        assert_eq!(failure.message(), "Question not found for solution step S1");

        let failure = SyncFailure::UnresolvedAttemptReference {
            external_id: "A1".to_string(),
        };
        assert_eq!(failure.message(), "Question not found for attempt A1");
    }

    #[test]
    fn test_failure_message_with_no_external_id_is_still_well_formed() {
        let failure = SyncFailure::UnresolvedStepReference {
            external_id: String::new(),
        };
        assert_eq!(failure.message(), "Question not found for solution step ");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = SyncSummary {
            questions: 1,
            solution_steps: 2,
            attempts: 3,
            feedbacks: 4,
        };

        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["questions"], 1);
        assert_eq!(value["solutionSteps"], 2);
        assert_eq!(value["attempts"], 3);
        assert_eq!(value["feedbacks"], 4);
    }
}
