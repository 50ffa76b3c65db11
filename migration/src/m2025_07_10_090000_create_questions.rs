//! Migration to create the questions table.
//!
//! Questions are the root entity of the content pipeline: every solution step,
//! attempt, and question-bound feedback row references one. The optional
//! external_id is the idempotency key used by the mobile-client sync endpoint.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::ExternalId).text().null())
                    .col(ColumnDef::new(Questions::Title).text().not_null())
                    .col(ColumnDef::new(Questions::Content).text().not_null())
                    .col(ColumnDef::new(Questions::Topic).text().null())
                    .col(ColumnDef::new(Questions::Difficulty).text().null())
                    .col(ColumnDef::new(Questions::AiTopic).text().null())
                    .col(ColumnDef::new(Questions::AiDifficulty).text().null())
                    .col(ColumnDef::new(Questions::AiScore).integer().null())
                    .col(
                        ColumnDef::new(Questions::LastAiEvaluatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // External ids are unique when present; NULLs stay repeatable so
        // manually created questions never collide with each other.
        manager
            .create_index(
                Index::create()
                    .name("uq_questions_external_id")
                    .table(Questions::Table)
                    .col(Questions::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_created_at")
                    .table(Questions::Table)
                    .col(Questions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_questions_external_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_questions_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    ExternalId,
    Title,
    Content,
    Topic,
    Difficulty,
    AiTopic,
    AiDifficulty,
    AiScore,
    LastAiEvaluatedAt,
    CreatedAt,
}
