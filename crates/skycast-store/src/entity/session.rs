use sea_orm::entity::prelude::*;

/// A `tower-sessions` record.
///
/// `data` holds the MessagePack-serialized record; `expiry_date` is used both
/// to filter expired sessions on load and to reap them in bulk.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    pub data: Vec<u8>,
    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
