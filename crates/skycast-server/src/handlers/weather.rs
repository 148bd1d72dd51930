//! Location selection and the weather orchestration flow.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use skycast_geo::GeocodedCity;
use skycast_store::search::{self, NewCity};
use skycast_store::StoreError;
use skycast_weather::WeatherReport;

use crate::error::ApiError;
use crate::location::{self, SessionLocation, LOCATION_KEY, USER_KEY, WEATHER_KEY};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    pub city: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub location: Option<SessionLocation>,
    pub weather: Option<WeatherReport>,
}

/// POST /api/location — remember the selected city in the session.
pub async fn select_location(
    session: Session,
    Json(form): Json<LocationForm>,
) -> Result<Json<SessionLocation>, ApiError> {
    let city = form.city.trim();
    if city.is_empty() {
        return Err(ApiError::unprocessable("Enter a city name."));
    }

    let pending =
        SessionLocation::from_submission(city, form.lat.as_deref(), form.lon.as_deref());
    session.insert(LOCATION_KEY, &pending).await?;

    Ok(Json(pending))
}

/// GET /api/weather — resolve the session location, fetch and process the
/// forecast, store both in the session, log the search, return the report.
pub async fn get_weather(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<WeatherReport>, ApiError> {
    let stored: Option<SessionLocation> = session.get(LOCATION_KEY).await?;
    let Some(stored) = stored else {
        return Err(ApiError::no_location());
    };

    let resolved = location::resolve(&stored, &state.geo)
        .await?
        .ok_or_else(ApiError::no_location)?;

    let report = state.weather.fetch(resolved.lat, resolved.lon).await?;

    session.insert(WEATHER_KEY, &report).await?;
    session
        .insert(LOCATION_KEY, &SessionLocation::from_resolved(&resolved))
        .await?;

    // Recording the lookup must never break the response
    let user_id: Option<i32> = session.get(USER_KEY).await.unwrap_or(None);
    if let Err(e) = record_lookup(&state, user_id, &resolved).await {
        tracing::error!(
            "failed to update city/search history for {}: {e}",
            resolved.display_name
        );
    }

    Ok(Json(report))
}

/// GET /api/weather/results — re-serve what the last fetch stored.
///
/// An absent report is not an error; clients use it to tell "nothing fetched
/// yet" apart from a failed fetch.
pub async fn results(session: Session) -> Result<Json<ResultsResponse>, ApiError> {
    let location: Option<SessionLocation> = session.get(LOCATION_KEY).await?;
    let weather: Option<WeatherReport> = session.get(WEATHER_KEY).await?;

    if weather.is_none() {
        tracing::warn!("weather results requested with nothing in the session");
    }

    Ok(Json(ResultsResponse { location, weather }))
}

async fn record_lookup(
    state: &AppState,
    user_id: Option<i32>,
    resolved: &GeocodedCity,
) -> Result<(), StoreError> {
    let city = search::upsert_city(
        &state.db,
        &NewCity {
            name: resolved.name.clone(),
            admin1: resolved.admin1.clone(),
            country: resolved.country.clone(),
            lat: resolved.lat,
            lon: resolved.lon,
        },
    )
    .await?;

    if let Some(user_id) = user_id {
        search::record_search(&state.db, user_id, city.id).await?;
    }

    Ok(())
}
