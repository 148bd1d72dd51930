//! Session-held location state and its resolution to coordinates.
//!
//! A location enters the session as whatever the search form submitted: a
//! picked suggestion with coordinates, a bare city name, or a raw "lat,lon"
//! pair. [`resolve`] turns any of these into a [`GeocodedCity`], falling back
//! to exact geocoding only when nothing better is available.

use serde::{Deserialize, Serialize};
use skycast_geo::{GeoClient, GeoError, GeocodedCity};

/// Session key holding the selected location.
pub const LOCATION_KEY: &str = "location";
/// Session key holding the last processed forecast.
pub const WEATHER_KEY: &str = "weather_data";
/// Session key holding the signed-in user id.
pub const USER_KEY: &str = "user_id";

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_COUNTRY: &str = "XX";

/// Location as stored in the session: the raw form selection right after
/// `POST /api/location`, the fully resolved city after a weather fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLocation {
    pub display: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SessionLocation {
    /// Build the pending entry from the submitted form fields.
    ///
    /// Coordinates arrive as strings; comma decimal separators are accepted.
    /// Values that fail to parse are stored as absent rather than rejected.
    pub fn from_submission(city: &str, lat: Option<&str>, lon: Option<&str>) -> Self {
        let (lat, lon) = match (lat, lon) {
            (Some(lat_raw), Some(lon_raw)) => {
                match (parse_coordinate(lat_raw), parse_coordinate(lon_raw)) {
                    (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
                    _ => {
                        tracing::warn!(
                            "invalid coordinates for {city:?}: lat={lat_raw:?} lon={lon_raw:?}"
                        );
                        (None, None)
                    }
                }
            }
            _ => (None, None),
        };

        Self {
            display: city.trim().to_string(),
            lat,
            lon,
            name: None,
            admin1: None,
            country: None,
        }
    }

    pub fn from_resolved(city: &GeocodedCity) -> Self {
        Self {
            display: city.display_name.clone(),
            lat: Some(city.lat),
            lon: Some(city.lon),
            name: Some(city.name.clone()),
            admin1: Some(city.admin1.clone()),
            country: Some(city.country.clone()),
        }
    }
}

/// Resolve the session location to exact coordinates.
///
/// In order: coordinates stored with the selection; a "lat,lon" display
/// string; exact geocoding of the display name. `None` means nothing usable
/// could be determined.
pub async fn resolve(
    location: &SessionLocation,
    geo: &GeoClient,
) -> Result<Option<GeocodedCity>, GeoError> {
    if let (Some(lat), Some(lon)) = (location.lat, location.lon) {
        return Ok(Some(resolved_from_parts(location, lat, lon)));
    }

    let display = location.display.trim();
    if display.is_empty() {
        tracing::warn!("session location has neither coordinates nor a name");
        return Ok(None);
    }

    if let Some((lat, lon)) = parse_coordinate_pair(display) {
        // Keep the raw pair as the name so the city row stays identifiable
        return Ok(Some(GeocodedCity {
            lat,
            lon,
            display_name: display.to_string(),
            name: display.to_string(),
            admin1: String::new(),
            country: UNKNOWN_COUNTRY.to_string(),
        }));
    }

    geo.geocode_exact(display).await
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    // Accept a European decimal comma, e.g. "48,137"
    raw.trim().replace(',', ".").parse().ok()
}

/// Exactly one comma, both sides numeric, e.g. "48.137,11.576".
fn parse_coordinate_pair(value: &str) -> Option<(f64, f64)> {
    if value.matches(',').count() != 1 {
        return None;
    }
    let (lat_raw, lon_raw) = value.split_once(',')?;
    let lat = lat_raw.trim().parse().ok()?;
    let lon = lon_raw.trim().parse().ok()?;
    Some((lat, lon))
}

fn resolved_from_parts(location: &SessionLocation, lat: f64, lon: f64) -> GeocodedCity {
    let display = if location.display.is_empty() {
        format!("{lat:.4},{lon:.4}")
    } else {
        location.display.clone()
    };

    let mut name = component(&location.name);
    let mut admin1 = component(&location.admin1);
    let mut country = component(&location.country);

    // Components missing: recover them from the display label
    if name.is_empty() || country.is_empty() {
        let parts: Vec<&str> = display.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [] => {}
            [only] => {
                name = (*only).to_string();
            }
            [first, last] => {
                name = (*first).to_string();
                country = (*last).to_string();
            }
            [first, second, .., last] => {
                name = (*first).to_string();
                admin1 = (*second).to_string();
                country = (*last).to_string();
            }
        }
        if name.is_empty() {
            name = UNKNOWN_NAME.to_string();
        }
        if country.is_empty() {
            country = UNKNOWN_COUNTRY.to_string();
        }
    }

    GeocodedCity {
        lat,
        lon,
        display_name: display,
        name,
        admin1,
        country,
    }
}

fn component(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}
