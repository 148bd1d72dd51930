//! Email + password accounts over server-side sessions.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use skycast_core::error::{AppError, AuthError};
use skycast_store::users;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::location::USER_KEY;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSettings {
    pub allow_registration: bool,
}

/// GET /api/auth/settings — flags the client needs to render account UI.
pub async fn settings(State(state): State<AppState>) -> Json<AuthSettings> {
    Json(AuthSettings {
        allow_registration: state.config.auth.allow_registration,
    })
}

/// POST /api/auth/register — create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !state.config.auth.allow_registration {
        return Err(AppError::from(AuthError::RegistrationDisabled).into());
    }

    let email = credentials.email.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(AppError::from(AuthError::InvalidEmail).into());
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::from(AuthError::WeakPassword).into());
    }

    let password_hash = hash_password(&credentials.password)?;
    let user = users::create_user(&state.db, &email, &password_hash).await?;

    sign_in(&session, user.id).await?;
    tracing::info!("registered account {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/auth/login — verify credentials and attach the user to the
/// session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = users::find_by_email(&state.db, &credentials.email).await?;

    // Unknown email and wrong password get the same rejection
    let Some(user) = user else {
        return Err(AppError::from(AuthError::InvalidCredentials).into());
    };
    if !verify_password(&user.password_hash, &credentials.password) {
        return Err(AppError::from(AuthError::InvalidCredentials).into());
    }

    sign_in(&session, user.id).await?;

    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
    }))
}

/// POST /api/auth/logout — drop the session. Fine to call anonymously.
pub async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me — the signed-in account.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        email: user.email,
    })
}

/// Rotate the session id and attach the user to it.
async fn sign_in(session: &Session, user_id: i32) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.insert(USER_KEY, user_id).await?;
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {e}");
            ApiError::internal()
        })
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
