//! Mapping from service errors to JSON error responses.
//!
//! Internal detail goes to the log; clients only ever see the taxonomy's
//! `user_message()` strings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use skycast_core::error::{AppError, AuthError, DbErrExt, ReqwestErrorExt};
use skycast_geo::GeoError;
use skycast_store::StoreError;
use skycast_weather::WeatherError;

/// An error ready to go on the wire: status code plus a safe message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.",
        )
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Nothing usable in the session to fetch weather for.
    pub fn no_location() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "Select a city before requesting weather.",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = match &err {
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(auth) => match auth {
                AuthError::NotAuthenticated | AuthError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::RegistrationDisabled => StatusCode::FORBIDDEN,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::InvalidEmail | AuthError::WeakPassword => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AuthError::SessionStorage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        tracing::debug!("api error: {err}");
        Self::new(status, err.user_message())
    }
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        tracing::warn!("geocoding failed: {err}");
        let GeoError::Request(inner) = err;
        AppError::from(inner.into_network_error()).into()
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        tracing::warn!("forecast fetch failed: {err}");
        let WeatherError::Request(inner) = err;
        AppError::from(inner.into_network_error()).into()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => AppError::from(AuthError::EmailTaken).into(),
            StoreError::Db(e) => {
                tracing::error!("database error: {e}");
                AppError::from(e.into_database_error()).into()
            }
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        tracing::error!("database error: {err}");
        AppError::from(err.into_database_error()).into()
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        tracing::error!("session error: {err}");
        AppError::from(AuthError::SessionStorage(err.to_string())).into()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("serialization error: {err}");
        Self::internal()
    }
}
