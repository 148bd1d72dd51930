//! City autocomplete.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use skycast_geo::CitySuggestion;
use skycast_store::cache;

use crate::error::ApiError;
use crate::state::AppState;

/// Queries shorter than this return no suggestions.
const MIN_QUERY_LENGTH: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub city: String,
}

/// GET /api/search — autocomplete suggestions for a partial city name.
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CitySuggestion>>, ApiError> {
    let query = params.city.trim();
    if query.chars().count() < MIN_QUERY_LENGTH {
        return Ok(Json(Vec::new()));
    }

    if let Some(cached) = cache::get(&state.db, query).await? {
        let suggestions: Vec<CitySuggestion> = serde_json::from_value(cached).unwrap_or_default();
        return Ok(Json(suggestions));
    }

    // Upstream failure degrades to an empty list; the empty result is cached
    // like any other so a flapping upstream is not hammered.
    let suggestions = match state
        .geo
        .suggest(query, state.config.geocoding.suggestion_count)
        .await
    {
        Ok(suggestions) => suggestions,
        Err(e) => {
            tracing::warn!("autocomplete lookup for {query:?} failed: {e}");
            Vec::new()
        }
    };

    cache::put(
        &state.db,
        query,
        serde_json::to_value(&suggestions)?,
        state.config.geocoding.cache_ttl_secs,
    )
    .await?;

    Ok(Json(suggestions))
}
