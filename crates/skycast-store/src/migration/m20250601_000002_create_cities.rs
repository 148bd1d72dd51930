use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(pk_auto(Cities::Id))
                    .col(string(Cities::Name))
                    .col(string(Cities::Admin1).default(""))
                    .col(string(Cities::Country))
                    .col(double(Cities::Latitude))
                    .col(double(Cities::Longitude))
                    .col(string(Cities::FullDisplayName).default(""))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cities-name-admin1-country")
                    .table(Cities::Table)
                    .col(Cities::Name)
                    .col(Cities::Admin1)
                    .col(Cities::Country)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cities-lat-lon")
                    .table(Cities::Table)
                    .col(Cities::Latitude)
                    .col(Cities::Longitude)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Cities {
    Table,
    Id,
    Name,
    Admin1,
    Country,
    Latitude,
    Longitude,
    FullDisplayName,
}
