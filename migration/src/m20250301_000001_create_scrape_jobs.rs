// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeJobs::Status).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Source).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Location).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::MaxPages).integer().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::Total).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeJobs::LeadsFound).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(ScrapeJobs::Cancelled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ScrapeJobs::Error).text())
                    .col(
                        ColumnDef::new(ScrapeJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScrapeJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ScrapeJobs::CompletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_jobs_status")
                    .table(ScrapeJobs::Table)
                    .col(ScrapeJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeJobs {
    Table,
    Id,
    Status,
    Source,
    Location,
    MaxPages,
    Progress,
    Total,
    LeadsFound,
    Cancelled,
    Error,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
