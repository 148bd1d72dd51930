//! SeaORM entity definitions.
//!
//! One module per table. The schema itself is created by the migrations in
//! [`crate::migration`]; these models must stay in sync with them.

pub mod city;
pub mod geocode_cache;
pub mod search_history;
pub mod session;
pub mod user;
