//! # Dashboard Metrics Handler
//!
//! Fourteen-day daily question counts with average AI score, plus the AI
//! score distribution in fixed buckets. Days with no activity are kept in the
//! series so chart axes stay continuous.

use axum::{extract::State, response::Json};
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::question;
use crate::repositories::QuestionRepository;
use crate::server::AppState;

/// Number of days shown on the dashboard charts, including today
const WINDOW_DAYS: u64 = 14;

/// One day in the evaluated-questions series
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    /// Day formatted YYYY-MM-DD
    pub date: String,
    pub total: u32,
    /// Average AI score for the day, one decimal place; absent when no
    /// scored questions fell on the day
    pub avg_ai_score: Option<f64>,
}

/// One AI-score histogram bucket
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreBucket {
    pub label: String,
    pub value: u32,
}

/// Response payload for the dashboard metrics endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetricsResponse {
    pub daily_counts: Vec<DailyCount>,
    pub score_distribution: Vec<ScoreBucket>,
}

pub(crate) const SCORE_BUCKETS: [&str; 4] = ["0-49", "50-69", "70-84", "85-100"];

pub(crate) fn score_bucket(score: i32) -> &'static str {
    if score <= 49 {
        SCORE_BUCKETS[0]
    } else if score <= 69 {
        SCORE_BUCKETS[1]
    } else if score <= 84 {
        SCORE_BUCKETS[2]
    } else {
        SCORE_BUCKETS[3]
    }
}

pub(crate) fn build_metrics(
    start_day: NaiveDate,
    questions: &[question::Model],
) -> DashboardMetricsResponse {
    let mut totals: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    let mut score_sums: BTreeMap<NaiveDate, (i64, u32)> = BTreeMap::new();
    let mut buckets: BTreeMap<&'static str, u32> =
        SCORE_BUCKETS.iter().map(|label| (*label, 0)).collect();

    // Pre-fill the window so days without activity stay on the axis.
    for offset in 0..WINDOW_DAYS {
        let day = start_day
            .checked_add_days(Days::new(offset))
            .expect("day within chart window");
        totals.insert(day, 0);
    }

    for question in questions {
        let reference = question
            .last_ai_evaluated_at
            .unwrap_or(question.created_at)
            .date_naive();
        *totals.entry(reference).or_insert(0) += 1;

        if let Some(score) = question.ai_score {
            let entry = score_sums.entry(reference).or_insert((0, 0));
            entry.0 += i64::from(score);
            entry.1 += 1;

            *buckets.entry(score_bucket(score)).or_insert(0) += 1;
        }
    }

    let daily_counts = totals
        .into_iter()
        .map(|(day, total)| {
            let avg_ai_score = score_sums.get(&day).map(|(sum, count)| {
                let avg = *sum as f64 / f64::from(*count);
                (avg * 10.0).round() / 10.0
            });
            DailyCount {
                date: day.format("%Y-%m-%d").to_string(),
                total,
                avg_ai_score,
            }
        })
        .collect();

    let score_distribution = SCORE_BUCKETS
        .iter()
        .map(|label| ScoreBucket {
            label: (*label).to_string(),
            value: buckets.get(label).copied().unwrap_or(0),
        })
        .collect();

    DashboardMetricsResponse {
        daily_counts,
        score_distribution,
    }
}

/// Dashboard chart data for the last fourteen days
#[utoipa::path(
    get,
    path = "/dashboard-metrics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard metrics", body = DashboardMetricsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "metrics"
)]
pub async fn dashboard_metrics(
    State(state): State<AppState>,
) -> Result<Json<DashboardMetricsResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let start_day = today
        .checked_sub_days(Days::new(WINDOW_DAYS - 1))
        .expect("window start within calendar");
    let start = start_day
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
        .fixed_offset();

    let questions = QuestionRepository::new(state.db.clone())
        .evaluated_or_created_since(start)
        .await?;

    Ok(Json(build_metrics(start_day, &questions)))
}
