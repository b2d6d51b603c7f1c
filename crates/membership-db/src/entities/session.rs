//! Server-side session rows

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Opaque session id carried by the cookie
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Sealed session payload
    #[sea_orm(column_type = "Text")]
    pub payload: String,

    /// Absolute expiry, fixed when the session is created
    pub expires_at: ChronoDateTimeUtc,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
