//! External-to-internal question id resolution.
//!
//! Steps, attempts, and feedback in a sync batch reference questions by
//! external id. Resolution consults a per-call memo first — many entries in
//! one batch typically reference the same handful of questions — and only
//! then the store, writing the result back into the memo. The memo is owned
//! by the caller and discarded at the end of each call; it must never be
//! shared across calls.

use std::collections::HashMap;

use sea_orm::DbErr;
use uuid::Uuid;

use crate::repositories::QuestionRepository;

/// Per-call cache of already-resolved external ids
pub type QuestionIdMemo = HashMap<String, Uuid>;

/// Resolve an external question id to the internal id, if the question
/// exists. No side effects beyond the memo write-back.
pub async fn resolve_question_id(
    questions: &QuestionRepository,
    memo: &mut QuestionIdMemo,
    external_id: &str,
) -> Result<Option<Uuid>, DbErr> {
    if let Some(id) = memo.get(external_id) {
        return Ok(Some(*id));
    }

    let Some(question) = questions.find_by_external_id(external_id).await? else {
        return Ok(None);
    };

    memo.insert(external_id.to_string(), question.id);
    Ok(Some(question.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    #[tokio::test]
    async fn test_memo_is_consulted_before_the_store() {
        // A disconnected store would fail any query; a memo hit must not
        // reach it at all.
        let questions = QuestionRepository::new(DatabaseConnection::default());
        let id = Uuid::new_v4();
        let mut memo = QuestionIdMemo::new();
        memo.insert("Q1".to_string(), id);

        let resolved = resolve_question_id(&questions, &mut memo, "Q1")
            .await
            .unwrap();
        assert_eq!(resolved, Some(id));
    }
}
