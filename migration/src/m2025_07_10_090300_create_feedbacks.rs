//! Migration to create the feedbacks table.
//!
//! question_id is nullable: feedback with no owning question is "general"
//! platform-level input, and the sync endpoint also downgrades unresolvable
//! question references to general feedback instead of failing the batch.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedbacks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedbacks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedbacks::ExternalId).text().null())
                    .col(ColumnDef::new(Feedbacks::QuestionId).uuid().null())
                    .col(ColumnDef::new(Feedbacks::UserId).text().null())
                    .col(ColumnDef::new(Feedbacks::AppUserId).text().null())
                    .col(ColumnDef::new(Feedbacks::StudentName).text().null())
                    .col(ColumnDef::new(Feedbacks::Rating).integer().not_null())
                    .col(ColumnDef::new(Feedbacks::Comment).text().null())
                    .col(
                        ColumnDef::new(Feedbacks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedbacks_question_id")
                            .from(Feedbacks::Table, Feedbacks::QuestionId)
                            .to(Questions::Table, Questions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_feedbacks_external_id")
                    .table(Feedbacks::Table)
                    .col(Feedbacks::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feedbacks_question_created")
                    .table(Feedbacks::Table)
                    .col(Feedbacks::QuestionId)
                    .col(Feedbacks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_feedbacks_external_id").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_feedbacks_question_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Feedbacks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Feedbacks {
    Table,
    Id,
    ExternalId,
    QuestionId,
    UserId,
    AppUserId,
    StudentName,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
}
