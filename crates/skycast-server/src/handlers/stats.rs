//! The authenticated statistics page.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use skycast_store::search::{self, TopSearch, UserSearch};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub top_searches: Vec<TopSearch>,
    pub user_searches: Vec<UserSearch>,
    pub total_searches: u64,
    pub unique_cities: u64,
}

/// GET /api/statistics — global and per-user search statistics.
pub async fn statistics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(StatsResponse {
        top_searches: search::top_searches(&state.db).await?,
        user_searches: search::user_recent_searches(&state.db, user.id).await?,
        total_searches: search::total_searches(&state.db).await?,
        unique_cities: search::unique_cities(&state.db).await?,
    }))
}
