//! Migration to create the solution_steps table.
//!
//! Steps carry caller-supplied order values; (question_id, step_order) is the
//! natural key used for sync upserts when no external id is given.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SolutionSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SolutionSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SolutionSteps::ExternalId).text().null())
                    .col(ColumnDef::new(SolutionSteps::QuestionId).uuid().not_null())
                    .col(
                        ColumnDef::new(SolutionSteps::StepOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SolutionSteps::Content).text().not_null())
                    .col(
                        ColumnDef::new(SolutionSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_solution_steps_question_id")
                            .from(SolutionSteps::Table, SolutionSteps::QuestionId)
                            .to(Questions::Table, Questions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_solution_steps_external_id")
                    .table(SolutionSteps::Table)
                    .col(SolutionSteps::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_solution_steps_question_order")
                    .table(SolutionSteps::Table)
                    .col(SolutionSteps::QuestionId)
                    .col(SolutionSteps::StepOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_solution_steps_external_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uq_solution_steps_question_order")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(SolutionSteps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SolutionSteps {
    Table,
    Id,
    ExternalId,
    QuestionId,
    StepOrder,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
}
