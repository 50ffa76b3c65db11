//! # Tests for Handlers
//!
//! This module contains unit tests for API handlers and their pure helpers.

use axum::response::Json;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::handlers::root;
use crate::models::ServiceInfo;
use crate::models::question;

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "questboard");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;

    let json_value: Value =
        serde_json::to_value(&service_info).expect("Failed to serialize ServiceInfo");

    assert!(json_value.get("service").is_some());
    assert!(json_value.get("version").is_some());
    assert_eq!(
        json_value.get("service").unwrap().as_str().unwrap(),
        "questboard"
    );
}

#[test]
fn test_service_info_default() {
    let service_info = ServiceInfo::default();

    assert_eq!(service_info.service, "questboard");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

mod rating_tests {
    use crate::completion::Evaluation;
    use crate::handlers::evaluate::{comment_from_evaluation, rating_from_score};

    #[test]
    fn test_rating_from_score_maps_extremes() {
        assert_eq!(rating_from_score(Some(100)), 5);
        assert_eq!(rating_from_score(Some(0)), 1);
    }

    #[test]
    fn test_rating_from_score_rounds_midpoints() {
        assert_eq!(rating_from_score(Some(50)), 3);
        assert_eq!(rating_from_score(Some(85)), 4);
        assert_eq!(rating_from_score(Some(90)), 5);
    }

    #[test]
    fn test_rating_from_score_defaults_to_three() {
        assert_eq!(rating_from_score(None), 3);
    }

    #[test]
    fn test_comment_folds_summary_and_suggestions() {
        let evaluation = Evaluation {
            score: Some(72),
            summary: Some("Clear but wordy".to_string()),
            suggestions: vec!["shorten the statement".to_string(), "add a picture".to_string()],
        };

        assert_eq!(
            comment_from_evaluation(&evaluation).unwrap(),
            "Clear but wordy | Suggestions: shorten the statement; add a picture"
        );
    }

    #[test]
    fn test_comment_is_none_when_evaluation_is_empty() {
        assert!(comment_from_evaluation(&Evaluation::default()).is_none());
    }
}

mod metrics_tests {
    use super::*;
    use crate::handlers::metrics::{build_metrics, score_bucket};

    fn question_on(day: NaiveDate, ai_score: Option<i32>) -> question::Model {
        let created_at = Utc
            .from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap())
            .fixed_offset();
        question::Model {
            id: Uuid::new_v4(),
            external_id: None,
            title: "t".to_string(),
            content: "c".to_string(),
            topic: None,
            difficulty: None,
            ai_topic: None,
            ai_difficulty: None,
            ai_score,
            last_ai_evaluated_at: ai_score.map(|_| created_at),
            created_at,
        }
    }

    #[test]
    fn test_score_buckets_cover_the_range() {
        assert_eq!(score_bucket(0), "0-49");
        assert_eq!(score_bucket(49), "0-49");
        assert_eq!(score_bucket(50), "50-69");
        assert_eq!(score_bucket(69), "50-69");
        assert_eq!(score_bucket(70), "70-84");
        assert_eq!(score_bucket(84), "70-84");
        assert_eq!(score_bucket(85), "85-100");
        assert_eq!(score_bucket(100), "85-100");
    }

    #[test]
    fn test_build_metrics_keeps_empty_days_on_the_axis() {
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let metrics = build_metrics(start, &[]);

        assert_eq!(metrics.daily_counts.len(), 14);
        assert_eq!(metrics.daily_counts[0].date, "2026-07-01");
        assert_eq!(metrics.daily_counts[13].date, "2026-07-14");
        assert!(metrics.daily_counts.iter().all(|day| day.total == 0));
        assert!(
            metrics
                .score_distribution
                .iter()
                .all(|bucket| bucket.value == 0)
        );
    }

    #[test]
    fn test_build_metrics_averages_scores_per_day() {
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 7, 3).unwrap();

        let questions = vec![
            question_on(day, Some(80)),
            question_on(day, Some(85)),
            question_on(day, None),
        ];

        let metrics = build_metrics(start, &questions);
        let entry = metrics
            .daily_counts
            .iter()
            .find(|d| d.date == "2026-07-03")
            .unwrap();

        assert_eq!(entry.total, 3);
        assert_eq!(entry.avg_ai_score, Some(82.5));

        let bucket = |label: &str| {
            metrics
                .score_distribution
                .iter()
                .find(|b| b.label == label)
                .unwrap()
                .value
        };
        assert_eq!(bucket("70-84"), 1);
        assert_eq!(bucket("85-100"), 1);
        assert_eq!(bucket("0-49"), 0);
    }
}
