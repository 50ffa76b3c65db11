//! Test utilities for database and server testing.
//!
//! Provides in-memory SQLite databases with migrations applied and a helper
//! that serves the full application on a random local port.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use questboard::completion::CompletionClient;
use questboard::config::AppConfig;
use questboard::server::{AppState, create_app};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::net::TcpListener;

/// Bearer token accepted by the admin routes in tests
#[allow(dead_code)]
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Sets up an in-memory SQLite database with all migrations applied.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // SQLite does not enforce our Postgres foreign key semantics; disable FK
    // checks so fixtures can be inserted without satisfying cross-table
    // relations the application enforces itself.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Default test configuration: one admin token, open sync endpoint, no
/// completion service.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        admin_tokens: vec![ADMIN_TOKEN.to_string()],
        ..Default::default()
    }
}

/// Helper function to get a random available port
async fn get_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Start the full application over the given database and configuration,
/// returning its base URL.
#[allow(dead_code)]
pub async fn spawn_app_with_config(
    db: DatabaseConnection,
    config: AppConfig,
) -> Result<String> {
    let port = get_available_port().await;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let completion = Arc::new(CompletionClient::new(&config.completion));
    let state = AppState {
        config: Arc::new(config),
        db,
        completion,
    };

    let app = create_app(state);
    let listener = TcpListener::bind(addr).await?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    Ok(format!("http://127.0.0.1:{}", port))
}

/// Start the application with a fresh in-memory database and default test
/// configuration, returning the base URL and the database handle.
#[allow(dead_code)]
pub async fn spawn_app() -> Result<(String, DatabaseConnection)> {
    let db = setup_test_db().await?;
    let url = spawn_app_with_config(db.clone(), test_config()).await?;
    Ok((url, db))
}

/// Count rows in a table by name.
#[allow(dead_code)]
pub async fn count_rows(db: &DatabaseConnection, table: &str) -> Result<i64> {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {}", table),
        ))
        .await?
        .expect("count query returns one row");

    Ok(row.try_get::<i64>("", "n")?)
}
