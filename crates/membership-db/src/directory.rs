//! User directory: lookups and writes against the users table keyed by email
//!
//! Every call goes to the database; nothing is cached.

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::user::{self, ROLE_MEMBER};

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Already-hashed password
    pub password_hash: String,
    pub user_type: String,
}

impl NewUser {
    /// A fresh account with the default `member` role
    pub fn member(name: String, email: String, password_hash: String) -> Self {
        Self {
            name,
            email,
            password_hash,
            user_type: ROLE_MEMBER.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserDirectory {
    db: DatabaseConnection,
}

impl UserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// First user registered under `email`, if any
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .order_by_asc(user::Column::CreatedAt)
            .one(&self.db)
            .await
    }

    /// Every user registered under `email`
    ///
    /// Normally zero or one, but the table has no unique constraint.
    pub async fn find_all_by_email(&self, email: &str) -> Result<Vec<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Insert a new user record
    ///
    /// This does not check for an existing user with the same email; callers
    /// that need that must call [`find_by_email`](Self::find_by_email) first,
    /// and two such sequences can still interleave.
    pub async fn insert(&self, new_user: NewUser) -> Result<user::Model, DbErr> {
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email),
            password: Set(new_user.password_hash),
            user_type: Set(new_user.user_type),
            created_at: Set(Utc::now()),
        };

        model.insert(&self.db).await
    }

    /// The whole users collection, oldest first
    pub async fn list_all(&self) -> Result<Vec<user::Model>, DbErr> {
        user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Overwrite the role of the first user registered under `email`
    ///
    /// `new_role` is stored verbatim. Later duplicates of the same email keep
    /// their role. Returns the number of records changed, which is zero when
    /// no user has that email.
    pub async fn update_role(&self, email: &str, new_role: &str) -> Result<u64, DbErr> {
        let Some(target) = self.find_by_email(email).await? else {
            return Ok(0);
        };

        let result = user::Entity::update_many()
            .col_expr(user::Column::UserType, Expr::value(new_role.to_string()))
            .filter(user::Column::Id.eq(target.id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
