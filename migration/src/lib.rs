//! Database migrations for the Questboard API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_07_10_090000_create_questions;
mod m2025_07_10_090100_create_solution_steps;
mod m2025_07_10_090200_create_attempts;
mod m2025_07_10_090300_create_feedbacks;
mod m2025_07_12_140000_create_sync_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_07_10_090000_create_questions::Migration),
            Box::new(m2025_07_10_090100_create_solution_steps::Migration),
            Box::new(m2025_07_10_090200_create_attempts::Migration),
            Box::new(m2025_07_10_090300_create_feedbacks::Migration),
            Box::new(m2025_07_12_140000_create_sync_logs::Migration),
        ]
    }
}
