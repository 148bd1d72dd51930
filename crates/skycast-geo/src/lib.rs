//! City geocoding for Skycast
//!
//! Client for the Open-Meteo Geocoding API: autocomplete suggestions and
//! exact single-city lookups. No API key required.

pub mod client;
pub mod types;

pub use client::GeoClient;
pub use types::{CitySuggestion, GeoError, GeocodedCity};
