//! Route table.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use crate::error::ApiError;
use crate::handlers::{auth, search, stats, weather};
use crate::state::AppState;

/// Build the application router. The session layer is attached by the
/// caller, which owns the session store.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/search", get(search::autocomplete))
        .route("/api/location", post(weather::select_location))
        .route("/api/weather", get(weather::get_weather))
        .route("/api/weather/results", get(weather::results))
        .route("/api/statistics", get(stats::statistics))
        .route("/api/auth/settings", get(auth::settings))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .with_state(state)
}

/// Liveness probe: verifies the database answers.
async fn health(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.db.ping().await?;
    Ok("ok")
}
