//! Account lookups and creation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entity::user;
use crate::error::{StoreError, StoreResult};

/// Insert a new account. The email is stored trimmed and lowercased.
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    password_hash: &str,
) -> StoreResult<user::Model> {
    let model = user::ActiveModel {
        email: Set(normalize_email(email)),
        password_hash: Set(password_hash.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(user) => Ok(user),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(StoreError::EmailTaken),
            _ => Err(e.into()),
        },
    }
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> StoreResult<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> StoreResult<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
