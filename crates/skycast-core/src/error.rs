//! Centralized error types for the Skycast application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for response bodies
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// All errors in the Skycast application should be convertible to this type.
/// Use `user_message()` to get a message safe to put on the wire.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl AppError {
    /// Returns a user-friendly message suitable for a response body.
    ///
    /// These messages are designed to be actionable and non-technical.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "An upstream service could not be reached. Please try again."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "An upstream service is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Constraint violated: {0}")]
    ConstraintViolated(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "The service is temporarily unavailable. Please try again."
            }
            DatabaseError::QueryFailed(_) => "A data operation failed. Please try again.",
            DatabaseError::ConstraintViolated(_) => "That record already exists.",
            DatabaseError::MigrationFailed(_) => {
                "The service is temporarily unavailable. Please try again."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "The service is misconfigured. Contact the operator.",
            ConfigError::MissingSetting(_) => {
                "The service is misconfigured. Contact the operator."
            }
        }
    }
}

/// Authentication and account errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Registration is disabled")]
    RegistrationDisabled,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password too weak")]
    WeakPassword,

    #[error("Session storage error: {0}")]
    SessionStorage(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "Please sign in to access this page.",
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::RegistrationDisabled => "New registrations are currently closed.",
            AuthError::EmailTaken => "An account with that email already exists.",
            AuthError::InvalidEmail => "Please enter a valid email address.",
            AuthError::WeakPassword => "Password must be at least 8 characters.",
            AuthError::SessionStorage(_) => "Your session could not be saved. Please try again.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting SeaORM errors to our error types.
pub trait DbErrExt {
    fn into_database_error(self) -> DatabaseError;
}

impl DbErrExt for sea_orm::DbErr {
    fn into_database_error(self) -> DatabaseError {
        match self.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                DatabaseError::ConstraintViolated(msg)
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                DatabaseError::ConstraintViolated(msg)
            }
            _ => match self {
                sea_orm::DbErr::Conn(e) => DatabaseError::ConnectionFailed(e.to_string()),
                other => DatabaseError::QueryFailed(other.to_string()),
            },
        }
    }
}
