//! Migration to create the attempts table.
//!
//! Attempts are append-only in spirit: without an external id there is no
//! natural key, so sync inserts a fresh row on every delivery.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attempts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attempts::ExternalId).text().null())
                    .col(ColumnDef::new(Attempts::QuestionId).uuid().not_null())
                    .col(ColumnDef::new(Attempts::UserId).text().null())
                    .col(ColumnDef::new(Attempts::AppUserId).text().null())
                    .col(ColumnDef::new(Attempts::StudentName).text().null())
                    .col(ColumnDef::new(Attempts::Correct).boolean().not_null())
                    .col(ColumnDef::new(Attempts::TimeMs).integer().not_null())
                    .col(
                        ColumnDef::new(Attempts::AttemptCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Attempts::Source)
                            .text()
                            .not_null()
                            .default("app"),
                    )
                    .col(ColumnDef::new(Attempts::Topic).text().null())
                    .col(ColumnDef::new(Attempts::Difficulty).text().null())
                    .col(
                        ColumnDef::new(Attempts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attempts_question_id")
                            .from(Attempts::Table, Attempts::QuestionId)
                            .to(Questions::Table, Questions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_attempts_external_id")
                    .table(Attempts::Table)
                    .col(Attempts::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attempts_question_created")
                    .table(Attempts::Table)
                    .col(Attempts::QuestionId)
                    .col(Attempts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_attempts_external_id").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_attempts_question_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Attempts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attempts {
    Table,
    Id,
    ExternalId,
    QuestionId,
    UserId,
    AppUserId,
    StudentName,
    Correct,
    TimeMs,
    AttemptCount,
    Source,
    Topic,
    Difficulty,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
}
