//! The Skycast HTTP application
//!
//! Routes, handlers and session plumbing. The binary in `main.rs` wires this
//! up against Postgres; the integration tests drive the same router against
//! SQLite and mock upstreams.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod location;
pub mod routes;
pub mod state;
