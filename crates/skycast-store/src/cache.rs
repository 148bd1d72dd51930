//! Database-backed TTL cache for autocomplete lookups.
//!
//! Keyed by the lowercased query string. Expired rows are ignored on read,
//! overwritten on write, and reaped in bulk by [`purge_expired`].

use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::geocode_cache;
use crate::error::StoreResult;

/// Look up an unexpired cached result.
pub async fn get(db: &DatabaseConnection, query: &str) -> StoreResult<Option<serde_json::Value>> {
    let Some(row) = geocode_cache::Entity::find_by_id(cache_key(query)).one(db).await? else {
        return Ok(None);
    };
    if row.expires_at <= Utc::now() {
        return Ok(None);
    }
    Ok(Some(row.results))
}

/// Store a result, replacing any previous entry for the query.
pub async fn put(
    db: &DatabaseConnection,
    query: &str,
    results: serde_json::Value,
    ttl_secs: i64,
) -> StoreResult<()> {
    let model = geocode_cache::ActiveModel {
        query: Set(cache_key(query)),
        results: Set(results),
        expires_at: Set(Utc::now() + Duration::seconds(ttl_secs)),
    };

    geocode_cache::Entity::insert(model)
        .on_conflict(
            OnConflict::column(geocode_cache::Column::Query)
                .update_columns([
                    geocode_cache::Column::Results,
                    geocode_cache::Column::ExpiresAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

/// Drop all expired rows, returning how many were removed.
pub async fn purge_expired(db: &DatabaseConnection) -> StoreResult<u64> {
    let result = geocode_cache::Entity::delete_many()
        .filter(geocode_cache::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        tracing::debug!("purged {} expired cache rows", result.rows_affected);
    }
    Ok(result.rows_affected)
}

fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}
