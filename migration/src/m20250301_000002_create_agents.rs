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
                    .table(Agents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Agents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Agents::Name).string().not_null())
                    .col(ColumnDef::new(Agents::Phone).string())
                    .col(ColumnDef::new(Agents::Email).string())
                    .col(ColumnDef::new(Agents::Location).string())
                    .col(ColumnDef::new(Agents::PropertyTypes).json().not_null())
                    .col(ColumnDef::new(Agents::ProfileUrl).text())
                    .col(ColumnDef::new(Agents::Website).text())
                    .col(ColumnDef::new(Agents::IsLead).boolean().not_null().default(false))
                    .col(ColumnDef::new(Agents::Source).string().not_null())
                    .col(
                        ColumnDef::new(Agents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Identity lookups hit each arm of the phone/email/name disjunction
        for (name, column) in [
            ("idx_agents_phone", Agents::Phone),
            ("idx_agents_email", Agents::Email),
            ("idx_agents_name", Agents::Name),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Agents::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Agents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Agents {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Location,
    PropertyTypes,
    ProfileUrl,
    Website,
    IsLead,
    Source,
    CreatedAt,
}
