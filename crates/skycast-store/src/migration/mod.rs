pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users;
mod m20250601_000002_create_cities;
mod m20250601_000003_create_search_history;
mod m20250601_000004_create_sessions;
mod m20250601_000005_create_geocode_cache;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users::Migration),
            Box::new(m20250601_000002_create_cities::Migration),
            Box::new(m20250601_000003_create_search_history::Migration),
            Box::new(m20250601_000004_create_sessions::Migration),
            Box::new(m20250601_000005_create_geocode_cache::Migration),
        ]
    }
}
