//! Create the site_options table

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SiteOptions::Table)
                    .if_not_exists()
                    .col(big_integer(SiteOptions::SiteId).not_null())
                    .col(string_len(SiteOptions::OptionName, 191).not_null())
                    .col(text(SiteOptions::OptionValue).not_null())
                    .primary_key(
                        Index::create()
                            .col(SiteOptions::SiteId)
                            .col(SiteOptions::OptionName),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiteOptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SiteOptions {
    Table,
    SiteId,
    OptionName,
    OptionValue,
}
