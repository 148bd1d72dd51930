use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeocodeCache::Table)
                    .if_not_exists()
                    .col(text(GeocodeCache::Query).primary_key())
                    .col(json(GeocodeCache::Results))
                    .col(timestamp_with_time_zone(GeocodeCache::ExpiresAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-geocode_cache-expires_at")
                    .table(GeocodeCache::Table)
                    .col(GeocodeCache::ExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GeocodeCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum GeocodeCache {
    Table,
    Query,
    Results,
    ExpiresAt,
}
