//! Session payloads and form bodies

use membership_db::entities::user;
use serde::{Deserialize, Serialize};

/// Snapshot of a user taken at signup or login
///
/// Not refreshed afterwards: a role change made while the session is alive
/// is only seen after the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub user_type: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.user_type == membership_db::ROLE_ADMIN
    }
}

impl From<&user::Model> for Identity {
    fn from(user: &user::Model) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            user_type: user.user_type.clone(),
        }
    }
}

/// Server-side session payload: `{authenticated, user: {name, email, userType}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    authenticated: bool,
    user: Option<Identity>,
}

impl SessionData {
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            authenticated: true,
            user: Some(identity),
        }
    }

    /// The identity, only when the session is authenticated
    pub fn identity(&self) -> Option<&Identity> {
        if self.authenticated {
            self.user.as_ref()
        } else {
            None
        }
    }
}

/// Session resolved for the current request
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    /// Store id, when the browser presented a valid cookie
    pub id: Option<String>,
    pub data: SessionData,
}

impl CurrentSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.data.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

/// Body of `POST /changeRole`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeRoleForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "newRole")]
    pub new_role: String,
}
