//! Registered member accounts

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role given to every new account
pub const ROLE_MEMBER: &str = "member";

/// Role that unlocks the admin area
pub const ROLE_ADMIN: &str = "admin";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login email; indexed but not unique at the storage level
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password: String,

    /// Role name. Usually `member` or `admin`, but any string is stored as given.
    pub user_type: String,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_admin(&self) -> bool {
        self.user_type == ROLE_ADMIN
    }
}
