//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! Questboard API: shared state, routing, middleware layering, and the
//! OpenAPI document.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::auth;
use crate::completion::CompletionClient;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub completion: Arc<CompletionClient>,
}

impl AppState {
    /// State over a disconnected store and default configuration, for unit
    /// tests that never reach the database.
    pub fn for_tests(config: Arc<AppConfig>) -> Self {
        let completion = Arc::new(CompletionClient::new(&config.completion));
        Self {
            config,
            db: DatabaseConnection::default(),
            completion,
        }
    }
}

/// Attach a per-request trace context so error responses carry a correlation
/// id that also appears in logs.
async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext {
        trace_id: format!("req-{}", &Uuid::new_v4().to_string()[..8]),
    };
    request.extensions_mut().insert(context.clone());
    telemetry::with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/questions",
            get(handlers::questions::list_questions).post(handlers::questions::create_question),
        )
        .route(
            "/questions/{id}",
            get(handlers::questions::get_question)
                .patch(handlers::questions::update_question)
                .delete(handlers::questions::delete_question),
        )
        .route(
            "/questions/{id}/steps",
            get(handlers::steps::list_steps).post(handlers::steps::create_step),
        )
        .route(
            "/attempts",
            get(handlers::attempts::list_attempts).post(handlers::attempts::create_attempt),
        )
        .route(
            "/feedback",
            get(handlers::feedback::list_feedback).post(handlers::feedback::create_feedback),
        )
        .route("/feedback/{id}", delete(handlers::feedback::delete_feedback))
        .route("/sync-logs", get(handlers::sync_logs::list_sync_logs))
        .route(
            "/dashboard-metrics",
            get(handlers::metrics::dashboard_metrics),
        )
        .route("/evaluate", post(handlers::evaluate::evaluate))
        .route("/evaluate/suggest", post(handlers::evaluate::suggest))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth::admin_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/keepalive", get(handlers::health::keepalive))
        .route("/sync", post(handlers::sync::ingest))
        .merge(admin_routes)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let completion = Arc::new(CompletionClient::new(&config.completion));
    let state = AppState {
        config: Arc::new(config),
        db,
        completion,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on: {}", addr);
    tracing::info!("Running in profile: {}", profile);

    axum::serve(listener, app).await?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("opaque")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health::keepalive,
        crate::handlers::sync::ingest,
        crate::handlers::sync_logs::list_sync_logs,
        crate::handlers::questions::list_questions,
        crate::handlers::questions::create_question,
        crate::handlers::questions::get_question,
        crate::handlers::questions::update_question,
        crate::handlers::questions::delete_question,
        crate::handlers::steps::list_steps,
        crate::handlers::steps::create_step,
        crate::handlers::attempts::list_attempts,
        crate::handlers::attempts::create_attempt,
        crate::handlers::feedback::list_feedback,
        crate::handlers::feedback::create_feedback,
        crate::handlers::feedback::delete_feedback,
        crate::handlers::metrics::dashboard_metrics,
        crate::handlers::evaluate::evaluate,
        crate::handlers::evaluate::suggest,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::sync::payload::SyncPayload,
            crate::sync::payload::QuestionEntry,
            crate::sync::payload::StepEntry,
            crate::sync::payload::AttemptEntry,
            crate::sync::payload::FeedbackEntry,
            crate::sync::payload::Difficulty,
            crate::sync::reconciler::SyncSummary,
            crate::handlers::sync::SyncResponse,
            crate::handlers::sync_logs::SyncLogInfo,
            crate::handlers::sync_logs::SyncStatsInfo,
            crate::handlers::sync_logs::SyncLogsResponse,
            crate::handlers::questions::QuestionInfo,
            crate::handlers::questions::QuestionsResponse,
            crate::handlers::questions::QuestionDetail,
            crate::handlers::questions::CreateQuestionRequest,
            crate::handlers::questions::UpdateQuestionRequest,
            crate::handlers::questions::LastAttemptInfo,
            crate::handlers::steps::StepInfo,
            crate::handlers::steps::StepsResponse,
            crate::handlers::steps::CreateStepRequest,
            crate::handlers::attempts::AttemptInfo,
            crate::handlers::attempts::AttemptsResponse,
            crate::handlers::attempts::CreateAttemptRequest,
            crate::handlers::feedback::FeedbackInfo,
            crate::handlers::feedback::FeedbacksResponse,
            crate::handlers::feedback::CreateFeedbackRequest,
            crate::handlers::metrics::DailyCount,
            crate::handlers::metrics::ScoreBucket,
            crate::handlers::metrics::DashboardMetricsResponse,
            crate::handlers::health::KeepaliveResponse,
            crate::handlers::evaluate::EvaluateRequest,
            crate::completion::Evaluation,
            crate::handlers::evaluate::SuggestRequest,
            crate::handlers::evaluate::SuggestResponse,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Questboard API",
        description = "Administrative API for the math-question content pipeline",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
