//! `tower-sessions` backend over the sessions table.

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::{session_store, ExpiredDeletion, SessionStore};

use crate::entity::session;

/// Session store persisting `tower-sessions` records with SeaORM.
///
/// Records serialize with MessagePack. Expired rows are filtered out at the
/// query level on load and reaped in bulk by
/// [`ExpiredDeletion::delete_expired`].
#[derive(Debug, Clone)]
pub struct DbSessionStore {
    conn: DatabaseConnection,
}

impl DbSessionStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn backend_err(e: impl std::fmt::Display) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

// tower-sessions speaks `time`, SeaORM speaks `chrono`.
fn to_db_time(value: OffsetDateTime) -> DateTimeWithTimeZone {
    chrono::DateTime::from_timestamp(value.unix_timestamp(), value.nanosecond())
        .unwrap_or_default()
        .into()
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let txn = self.conn.begin().await.map_err(backend_err)?;

        // Regenerate the id on collision
        while session::Entity::find_by_id(record.id.to_string())
            .one(&txn)
            .await
            .map_err(backend_err)?
            .is_some()
        {
            record.id = Id::default();
        }

        let data = rmp_serde::to_vec(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let model = session::ActiveModel {
            id: Set(record.id.to_string()),
            data: Set(data),
            expiry_date: Set(to_db_time(record.expiry_date)),
        };
        model.insert(&txn).await.map_err(backend_err)?;

        txn.commit().await.map_err(backend_err)?;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data = rmp_serde::to_vec(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;
        let expiry_date = to_db_time(record.expiry_date);

        match session::Entity::find_by_id(record.id.to_string())
            .one(&self.conn)
            .await
            .map_err(backend_err)?
        {
            Some(existing) => {
                let mut model = existing.into_active_model();
                model.data = Set(data);
                model.expiry_date = Set(expiry_date);
                model.update(&self.conn).await.map_err(backend_err)?;
            }
            None => {
                let model = session::ActiveModel {
                    id: Set(record.id.to_string()),
                    data: Set(data),
                    expiry_date: Set(expiry_date),
                };
                model.insert(&self.conn).await.map_err(backend_err)?;
            }
        }

        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = to_db_time(OffsetDateTime::now_utc());

        let row = session::Entity::find_by_id(session_id.to_string())
            .filter(session::Column::ExpiryDate.gt(now))
            .one(&self.conn)
            .await
            .map_err(backend_err)?;

        row.map(|model| {
            rmp_serde::from_slice(&model.data)
                .map_err(|e| session_store::Error::Decode(e.to_string()))
        })
        .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        session::Entity::delete_by_id(session_id.to_string())
            .exec(&self.conn)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for DbSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = to_db_time(OffsetDateTime::now_utc());

        session::Entity::delete_many()
            .filter(session::Column::ExpiryDate.lt(now))
            .exec(&self.conn)
            .await
            .map_err(backend_err)?;

        Ok(())
    }
}
