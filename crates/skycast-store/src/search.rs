//! Cities, search history and the statistics aggregates.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::Serialize;

use crate::entity::{city, search_history};
use crate::error::StoreResult;

pub const TOP_SEARCH_LIMIT: u64 = 10;
pub const RECENT_SEARCH_LIMIT: u64 = 20;

const COORD_PRECISION: f64 = 1e5;

/// City facts as resolved by geocoding.
#[derive(Debug, Clone)]
pub struct NewCity {
    pub name: String,
    pub admin1: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// One row of the "most searched cities" aggregate.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct TopSearch {
    pub city: String,
    pub search_count: i64,
}

/// One row of a user's recent search history.
#[derive(Debug, Clone, Serialize)]
pub struct UserSearch {
    pub city: String,
    pub searched_at: DateTime<Utc>,
}

/// Round a coordinate to the 5-decimal identity used by the cities table.
fn round_coord(value: f64) -> f64 {
    (value * COORD_PRECISION).round() / COORD_PRECISION
}

/// Derived display label, kept in sync with the component columns.
fn full_display_name(name: &str, admin1: &str, country: &str) -> String {
    if admin1.is_empty() {
        format!("{name}, {country}")
    } else {
        format!("{name}, {admin1}, {country}")
    }
}

/// Find a city by rounded coordinates, creating it or refreshing its
/// components as needed.
pub async fn upsert_city(db: &DatabaseConnection, facts: &NewCity) -> StoreResult<city::Model> {
    let lat = round_coord(facts.lat);
    let lon = round_coord(facts.lon);

    let existing = city::Entity::find()
        .filter(city::Column::Latitude.eq(lat))
        .filter(city::Column::Longitude.eq(lon))
        .one(db)
        .await?;

    let Some(found) = existing else {
        let model = city::ActiveModel {
            name: Set(facts.name.clone()),
            admin1: Set(facts.admin1.clone()),
            country: Set(facts.country.clone()),
            latitude: Set(lat),
            longitude: Set(lon),
            full_display_name: Set(full_display_name(
                &facts.name,
                &facts.admin1,
                &facts.country,
            )),
            ..Default::default()
        };
        let created = model.insert(db).await?;
        tracing::debug!("created city {} ({lat}, {lon})", created.full_display_name);
        return Ok(created);
    };

    let changed = found.name != facts.name
        || found.admin1 != facts.admin1
        || found.country != facts.country;
    if !changed {
        return Ok(found);
    }

    let mut model: city::ActiveModel = found.into();
    model.name = Set(facts.name.clone());
    model.admin1 = Set(facts.admin1.clone());
    model.country = Set(facts.country.clone());
    model.full_display_name = Set(full_display_name(
        &facts.name,
        &facts.admin1,
        &facts.country,
    ));
    Ok(model.update(db).await?)
}

/// Append a history row for an authenticated user's lookup.
pub async fn record_search(
    db: &DatabaseConnection,
    user_id: i32,
    city_id: i32,
) -> StoreResult<search_history::Model> {
    let model = search_history::ActiveModel {
        user_id: Set(user_id),
        city_id: Set(city_id),
        searched_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Top cities by search count, descending.
pub async fn top_searches(db: &DatabaseConnection) -> StoreResult<Vec<TopSearch>> {
    Ok(search_history::Entity::find()
        .select_only()
        .column_as(city::Column::FullDisplayName, "city")
        .column_as(search_history::Column::Id.count(), "search_count")
        .join(JoinType::InnerJoin, search_history::Relation::City.def())
        .group_by(city::Column::FullDisplayName)
        .order_by_desc(Expr::col(Alias::new("search_count")))
        .limit(TOP_SEARCH_LIMIT)
        .into_model::<TopSearch>()
        .all(db)
        .await?)
}

/// A user's most recent searches, newest first.
pub async fn user_recent_searches(
    db: &DatabaseConnection,
    user_id: i32,
) -> StoreResult<Vec<UserSearch>> {
    let rows = search_history::Entity::find()
        .filter(search_history::Column::UserId.eq(user_id))
        .find_also_related(city::Entity)
        .order_by_desc(search_history::Column::SearchedAt)
        .limit(RECENT_SEARCH_LIMIT)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, city)| UserSearch {
            city: city.map(|c| c.full_display_name).unwrap_or_default(),
            searched_at: entry.searched_at,
        })
        .collect())
}

pub async fn total_searches(db: &DatabaseConnection) -> StoreResult<u64> {
    Ok(search_history::Entity::find().count(db).await?)
}

pub async fn unique_cities(db: &DatabaseConnection) -> StoreResult<u64> {
    Ok(city::Entity::find().count(db).await?)
}
