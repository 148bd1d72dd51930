//! Open-Meteo Geocoding API client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{CitySuggestion, GeoError, GeocodedCity};

const GEOCODING_API_BASE: &str = "https://geocoding-api.open-meteo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 3;
const GEOCODING_LANGUAGE: &str = "en";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: Option<String>,
    admin1: Option<String>,
    country_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GeoClient {
    client: Client,
    base_url: String,
}

impl GeoClient {
    /// Create a client against the public Open-Meteo geocoding endpoint.
    ///
    /// A `timeout_secs` of zero falls back to the default timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, GeoError> {
        let timeout = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: GEOCODING_API_BASE.to_string(),
        })
    }

    /// Point the client at a different base URL (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch autocomplete suggestions for a partial city name.
    ///
    /// Items the API returns without a usable name are skipped.
    #[instrument(skip(self), level = "debug")]
    pub async fn suggest(&self, query: &str, count: u8) -> Result<Vec<CitySuggestion>, GeoError> {
        let places = self.search(query, count).await?;
        Ok(places.into_iter().filter_map(suggestion_from_raw).collect())
    }

    /// Resolve a city name to a single location.
    ///
    /// Returns `None` when the API has no match or the match carries no
    /// coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn geocode_exact(&self, name: &str) -> Result<Option<GeocodedCity>, GeoError> {
        let mut places = self.search(name, 1).await?;
        if places.is_empty() {
            return Ok(None);
        }
        let item = places.remove(0);

        let (Some(lat), Some(lon)) = (item.latitude, item.longitude) else {
            tracing::warn!("geocoding result for {name:?} is missing coordinates");
            return Ok(None);
        };

        let city = clean_component(item.name);
        let admin1 = clean_component(item.admin1);
        let country = clean_component(item.country_code);

        let display_name = [city.as_str(), admin1.as_str(), country.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Some(GeocodedCity {
            lat,
            lon,
            display_name,
            name: city,
            admin1,
            country,
        }))
    }

    async fn search(&self, query: &str, count: u8) -> Result<Vec<RawPlace>, GeoError> {
        let url = format!("{}/v1/search", self.base_url);
        let count = count.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query),
                ("count", count.as_str()),
                ("language", GEOCODING_LANGUAGE),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

fn clean_component(value: Option<String>) -> String {
    value.unwrap_or_default().trim().to_string()
}

fn suggestion_from_raw(item: RawPlace) -> Option<CitySuggestion> {
    // Quotes in names break the client-side suggestion markup
    let city = item.name?.replace(['\'', '"'], "").trim().to_string();
    if city.is_empty() {
        return None;
    }
    let admin1 = clean_component(item.admin1);
    let country = clean_component(item.country_code);

    let display = if admin1.is_empty() {
        city.clone()
    } else {
        format!("{city}, {admin1}")
    };
    let full_display = if admin1.is_empty() {
        format!("{city}, {country}")
    } else {
        format!("{city}, {admin1}, {country}")
    };

    Some(CitySuggestion {
        city,
        admin1,
        country,
        display,
        full_display,
        lat: item.latitude,
        lon: item.longitude,
    })
}
