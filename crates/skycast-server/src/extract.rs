//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use skycast_core::error::{AppError, AuthError};
use skycast_store::entity::user;
use skycast_store::users;

use crate::error::ApiError;
use crate::location::USER_KEY;
use crate::state::AppState;

/// The signed-in user, loaded from the session.
///
/// Rejects with 401 when the session carries no user id or the account no
/// longer exists.
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| ApiError::new(status, message))?;

        let user_id: Option<i32> = session.get(USER_KEY).await?;
        let Some(user_id) = user_id else {
            return Err(AppError::from(AuthError::NotAuthenticated).into());
        };

        users::find_by_id(&state.db, user_id)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::from(AuthError::NotAuthenticated).into())
    }
}
