//! Integration tests for the sync ingestion endpoint.
//!
//! These exercise the full HTTP surface of `POST /sync` against an in-memory
//! database: idempotent upserts, intra-batch reference resolution, the
//! asymmetric failure policy between attempts and feedback, partial-commit
//! semantics, audit completeness, and shared-secret gating.

mod test_utils;

use questboard::models::{attempt, feedback, question, solution_step, sync_log};
use reqwest::Client;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::{Value, json};
use test_utils::{count_rows, setup_test_db, spawn_app, spawn_app_with_config, test_config};

fn question_entry(external_id: &str, title: &str) -> Value {
    json!({
        "externalId": external_id,
        "title": title,
        "content": "How many apples are left in the basket?",
    })
}

#[tokio::test]
async fn test_resending_a_question_is_idempotent() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let payload = json!({ "questions": [question_entry("Q1", "Counting apples")] });

    for _ in 0..2 {
        let response = client
            .post(format!("{}/sync", url))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["ok"], true);
        // "Processed" means upserted, so the repeat call still counts it.
        assert_eq!(body["questions"], 1);
        assert_eq!(body["solutionSteps"], 0);
    }

    assert_eq!(count_rows(&db, "questions").await.unwrap(), 1);
}

#[tokio::test]
async fn test_resending_updates_in_place() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    for title in ["A", "B"] {
        let payload = json!({ "questions": [{
            "externalId": "Q1",
            "title": format!("Title {}", title),
            "content": "Some content here",
        }] });
        let response = client
            .post(format!("{}/sync", url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let questions = question::Entity::find().all(&db).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].title, "Title B");
    assert_eq!(questions[0].external_id.as_deref(), Some("Q1"));
}

#[tokio::test]
async fn test_step_resolves_question_created_in_the_same_batch() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let payload = json!({
        "questions": [question_entry("Q1", "Counting apples")],
        "solutionSteps": [{
            "externalId": "S1",
            "questionExternalId": "Q1",
            "order": 1,
            "content": "Count the apples one by one",
        }],
    });

    let response = client
        .post(format!("{}/sync", url))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["questions"], 1);
    assert_eq!(body["solutionSteps"], 1);

    let question = question::Entity::find()
        .filter(question::Column::ExternalId.eq("Q1"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let step = solution_step::Entity::find()
        .filter(solution_step::Column::ExternalId.eq("S1"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(step.question_id, question.id);
}

#[tokio::test]
async fn test_unresolved_attempt_reference_fails_the_call() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let payload = json!({ "attempts": [{
        "externalId": "A1",
        "questionExternalId": "Q-missing",
        "correct": true,
        "timeMs": 100,
    }] });

    let response = client
        .post(format!("{}/sync", url))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNRESOLVED_REFERENCE");
    assert!(body["message"].as_str().unwrap().contains("A1"));

    assert_eq!(count_rows(&db, "attempts").await.unwrap(), 0);

    let log = sync_log::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(log.status, "error");
    assert_eq!(log.attempts_count, 0);
    assert!(log.error_message.as_deref().unwrap().contains("A1"));
}

#[tokio::test]
async fn test_unresolved_feedback_reference_degrades_to_general_feedback() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let payload = json!({ "feedbacks": [{
        "externalId": "F1",
        "questionExternalId": "Q-missing",
        "rating": 5,
    }] });

    let response = client
        .post(format!("{}/sync", url))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["feedbacks"], 1);

    let feedbacks = feedback::Entity::find().all(&db).await.unwrap();
    assert_eq!(feedbacks.len(), 1);
    assert_eq!(feedbacks[0].question_id, None);
    assert_eq!(feedbacks[0].rating, 5);
}

#[tokio::test]
async fn test_steps_without_external_id_upsert_by_question_and_order() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    // Seed the question, then send the same (question, order) step twice
    // with different content.
    let seed = json!({ "questions": [question_entry("Q1", "Counting apples")] });
    client
        .post(format!("{}/sync", url))
        .json(&seed)
        .send()
        .await
        .unwrap();

    for content in ["first version", "second version"] {
        let payload = json!({ "solutionSteps": [{
            "questionExternalId": "Q1",
            "order": 1,
            "content": content,
        }] });
        let response = client
            .post(format!("{}/sync", url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let steps = solution_step::Entity::find().all(&db).await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].content, "second version");
    assert_eq!(steps[0].external_id, None);
}

#[tokio::test]
async fn test_partial_progress_is_retained_and_audited() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    // The question upserts before the attempt aborts the batch; the commit
    // is not rolled back.
    let payload = json!({
        "questions": [question_entry("Q1", "Counting apples")],
        "attempts": [{
            "externalId": "A1",
            "questionExternalId": "Q-missing",
            "correct": false,
            "timeMs": 40,
        }],
        "feedbacks": [{ "externalId": "F1", "rating": 4 }],
    });

    let response = client
        .post(format!("{}/sync", url))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(count_rows(&db, "questions").await.unwrap(), 1);
    // Nothing after the failing attempt was processed.
    assert_eq!(count_rows(&db, "feedbacks").await.unwrap(), 0);

    let log = sync_log::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(log.status, "error");
    assert_eq!(log.questions_count, 1);
    assert_eq!(log.attempts_count, 0);
    assert_eq!(log.feedbacks_count, 0);
}

#[tokio::test]
async fn test_every_call_appends_exactly_one_audit_record() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    // Success.
    client
        .post(format!("{}/sync", url))
        .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
        .send()
        .await
        .unwrap();

    // Reference failure.
    client
        .post(format!("{}/sync", url))
        .json(&json!({ "attempts": [{
            "externalId": "A1",
            "questionExternalId": "nope",
            "correct": true,
            "timeMs": 1,
        }] }))
        .send()
        .await
        .unwrap();

    // Validation failure (rating out of range).
    client
        .post(format!("{}/sync", url))
        .json(&json!({ "feedbacks": [{ "externalId": "F1", "rating": 9 }] }))
        .send()
        .await
        .unwrap();

    let logs = sync_log::Entity::find()
        .order_by_asc(sync_log::Column::CreatedAt)
        .all(&db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].status, "success");
    assert_eq!(logs[0].questions_count, 1);
    assert_eq!(logs[1].status, "error");
    assert_eq!(logs[2].status, "error");
    assert_eq!(logs[2].questions_count, 0);
}

#[tokio::test]
async fn test_malformed_payload_is_rejected_and_audited() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let response = client
        .post(format!("{}/sync", url))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);

    let logs = sync_log::Entity::find().all(&db).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "error");
    assert_eq!(logs[0].questions_count, 0);
}

#[tokio::test]
async fn test_caller_metadata_is_recorded() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    client
        .post(format!("{}/sync", url))
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .header("user-agent", "questapp/2.1")
        .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
        .send()
        .await
        .unwrap();

    let log = sync_log::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(log.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(log.user_agent.as_deref(), Some("questapp/2.1"));
}

mod shared_secret {
    use super::*;

    async fn spawn_guarded_app() -> (String, sea_orm::DatabaseConnection) {
        let db = setup_test_db().await.unwrap();
        let mut config = test_config();
        config.sync_api_key = Some("sync-secret".to_string());
        let url = spawn_app_with_config(db.clone(), config).await.unwrap();
        (url, db)
    }

    #[tokio::test]
    async fn test_mismatched_secret_is_rejected_and_logged() {
        let (url, db) = spawn_guarded_app().await;
        let client = Client::new();

        let response = client
            .post(format!("{}/sync", url))
            .header("x-api-key", "wrong")
            .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
        assert_eq!(count_rows(&db, "questions").await.unwrap(), 0);

        let log = sync_log::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(log.status, "error");
        assert_eq!(log.questions_count, 0);
        assert_eq!(log.error_message.as_deref(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn test_missing_secret_is_rejected() {
        let (url, _db) = spawn_guarded_app().await;
        let client = Client::new();

        let response = client
            .post(format!("{}/sync", url))
            .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_matching_header_secret_is_accepted() {
        let (url, _db) = spawn_guarded_app().await;
        let client = Client::new();

        let response = client
            .post(format!("{}/sync", url))
            .header("x-api-key", "sync-secret")
            .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_payload_api_key_is_accepted_without_header() {
        let (url, _db) = spawn_guarded_app().await;
        let client = Client::new();

        let response = client
            .post(format!("{}/sync", url))
            .json(&json!({
                "apiKey": "sync-secret",
                "questions": [question_entry("Q1", "Counting apples")],
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_header_takes_precedence_over_payload_key() {
        let (url, _db) = spawn_guarded_app().await;
        let client = Client::new();

        // A wrong header is not rescued by a correct in-body key.
        let response = client
            .post(format!("{}/sync", url))
            .header("x-api-key", "wrong")
            .json(&json!({
                "apiKey": "sync-secret",
                "questions": [question_entry("Q1", "Counting apples")],
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
    }
}

#[tokio::test]
async fn test_attempt_defaults_are_applied() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    let payload = json!({
        "questions": [question_entry("Q1", "Counting apples")],
        "attempts": [{
            "externalId": "A1",
            "questionExternalId": "Q1",
            "correct": true,
            "timeMs": 1500,
        }],
    });

    let response = client
        .post(format!("{}/sync", url))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let attempt = attempt::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(attempt.attempt_count, 1);
    assert_eq!(attempt.source, "app");
    assert_eq!(attempt.time_ms, 1500);
    assert!(attempt.correct);
}

#[tokio::test]
async fn test_attempt_upsert_by_external_id_does_not_duplicate() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    for time_ms in [100, 250] {
        let payload = json!({
            "questions": [question_entry("Q1", "Counting apples")],
            "attempts": [{
                "externalId": "A1",
                "questionExternalId": "Q1",
                "correct": true,
                "timeMs": time_ms,
            }],
        });
        client
            .post(format!("{}/sync", url))
            .json(&payload)
            .send()
            .await
            .unwrap();
    }

    let attempts = attempt::Entity::find().all(&db).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].time_ms, 250);
}

#[tokio::test]
async fn test_sync_does_not_touch_ai_fields() {
    let (url, db) = spawn_app().await.unwrap();
    let client = Client::new();

    // First sync creates the question; simulate a completion-service
    // evaluation landing on it; a second sync must leave it intact.
    client
        .post(format!("{}/sync", url))
        .json(&json!({ "questions": [question_entry("Q1", "Counting apples")] }))
        .send()
        .await
        .unwrap();

    let repo = questboard::repositories::QuestionRepository::new(db.clone());
    let question = question::Entity::find().one(&db).await.unwrap().unwrap();
    repo.record_ai_evaluation(question.id, Some(88))
        .await
        .unwrap()
        .unwrap();

    client
        .post(format!("{}/sync", url))
        .json(&json!({ "questions": [question_entry("Q1", "Counting apples v2")] }))
        .send()
        .await
        .unwrap();

    let question = question::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(question.title, "Counting apples v2");
    assert_eq!(question.ai_score, Some(88));
    assert!(question.last_ai_evaluated_at.is_some());
}
