use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000001_create_users::Users;
use super::m20250601_000002_create_cities::Cities;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(SearchHistory::Id))
                    .col(integer(SearchHistory::UserId))
                    .col(integer(SearchHistory::CityId))
                    .col(timestamp_with_time_zone(SearchHistory::SearchedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-search_history-user_id")
                            .from(SearchHistory::Table, SearchHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-search_history-city_id")
                            .from(SearchHistory::Table, SearchHistory::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-search_history-user-searched_at")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::UserId)
                    .col(SearchHistory::SearchedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SearchHistory {
    Table,
    Id,
    UserId,
    CityId,
    SearchedAt,
}
