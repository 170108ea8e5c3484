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
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Listings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Listings::AgentId).uuid().not_null())
                    .col(ColumnDef::new(Listings::Title).text().not_null())
                    .col(ColumnDef::new(Listings::Price).string())
                    .col(ColumnDef::new(Listings::Location).string().not_null())
                    .col(ColumnDef::new(Listings::PropertyType).string().not_null())
                    .col(ColumnDef::new(Listings::Bedrooms).integer())
                    .col(ColumnDef::new(Listings::Bathrooms).integer())
                    .col(ColumnDef::new(Listings::Url).text().not_null())
                    .col(ColumnDef::new(Listings::ImageUrl).text())
                    .col(
                        ColumnDef::new(Listings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listings_agent")
                            .from(Listings::Table, Listings::AgentId)
                            .to(Agents::Table, Agents::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listings_url")
                    .table(Listings::Table)
                    .col(Listings::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listings_agent_id")
                    .table(Listings::Table)
                    .col(Listings::AgentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Listings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Listings {
    Table,
    Id,
    AgentId,
    Title,
    Price,
    Location,
    PropertyType,
    Bedrooms,
    Bathrooms,
    Url,
    ImageUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Agents {
    Table,
    Id,
}
