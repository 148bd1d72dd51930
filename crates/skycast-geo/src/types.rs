use serde::{Deserialize, Serialize};

/// A single autocomplete suggestion, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    /// City name with quote characters stripped
    pub city: String,
    /// First-level administrative area, empty when the API omits it
    pub admin1: String,
    /// Two-letter country code
    pub country: String,
    /// Short label, e.g. "Munich, Bavaria"
    pub display: String,
    /// Full label, e.g. "Munich, Bavaria, DE"
    pub full_display: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A city resolved to a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedCity {
    pub lat: f64,
    pub lon: f64,
    /// Joined from the non-empty components, e.g. "Munich, Bavaria, DE"
    pub display_name: String,
    pub name: String,
    pub admin1: String,
    pub country: String,
}

/// Geocoding client errors.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
}
