use thiserror::Error;

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("Email already registered")]
    EmailTaken,
}

pub type StoreResult<T> = Result<T, StoreError>;
