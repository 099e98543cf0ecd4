//! Create the sites table

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(big_integer(Sites::Id).auto_increment().primary_key())
                    .col(string_len(Sites::Domain, 255).not_null())
                    .col(string_len(Sites::Path, 255).not_null().default("/"))
                    .col(
                        timestamp_with_time_zone(Sites::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Domain lookups run on every site creation
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sites_domain")
                    .table(Sites::Table)
                    .col(Sites::Domain)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
    Domain,
    Path,
    CreatedAt,
}
