//! Session store backed by the sessions table
//!
//! Rows hold an already-sealed payload and a fixed expiry. Reading a row never
//! extends its expiry.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::debug;

use crate::entities::session;

pub use crate::entities::session::Model as SessionRecord;

#[derive(Clone, Debug)]
pub struct SessionStore {
    db: DatabaseConnection,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Write a new session row
    pub async fn create(
        &self,
        id: &str,
        payload: String,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRecord, DbErr> {
        let model = session::ActiveModel {
            id: Set(id.to_string()),
            payload: Set(payload),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        };

        model.insert(&self.db).await
    }

    /// Load a session that has not yet expired at `now`
    ///
    /// An expired row is deleted and reported as missing.
    pub async fn load(&self, id: &str, now: DateTime<Utc>) -> Result<Option<SessionRecord>, DbErr> {
        let Some(record) = session::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        if record.expires_at <= now {
            debug!("Session {} expired at {}", id, record.expires_at);
            self.destroy(id).await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Remove a session row entirely
    pub async fn destroy(&self, id: &str) -> Result<(), DbErr> {
        session::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Delete every session that expired at or before `now`
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
