//! Persistence layer for Skycast
//!
//! SeaORM entities and migrations for users, cities, search history, the
//! session table and the geocode cache, plus the query layer on top of them.

pub mod cache;
pub mod entity;
pub mod error;
pub mod migration;
pub mod search;
pub mod sessions;
pub mod users;

pub use error::{StoreError, StoreResult};
pub use migration::Migrator;
pub use sessions::DbSessionStore;
