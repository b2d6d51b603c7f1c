//! Cookie-backed sessions
//!
//! The browser holds only a signed session id. The payload lives in the
//! session store, sealed, with an absolute expiry set when the session is
//! started.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use membership_auth::{CookieError, CookieSigner, SealError, SessionSealer};
use membership_db::SessionStore;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{CurrentSession, Identity, SessionData};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "membership.sid";

/// Session lifetime in seconds
pub const SESSION_TTL_SECS: i64 = 60 * 60;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store error: {0}")]
    Store(#[from] DbErr),

    #[error("Failed to seal session payload: {0}")]
    Seal(#[from] SealError),

    #[error("Failed to sign session cookie: {0}")]
    Cookie(#[from] CookieError),

    #[error("Invalid cookie header: {0}")]
    Header(#[from] header::InvalidHeaderValue),
}

#[derive(Clone, Debug)]
pub struct SessionManager {
    store: SessionStore,
    signer: CookieSigner,
    sealer: SessionSealer,
    ttl: Duration,
}

impl SessionManager {
    /// `session_secret` signs cookies; `store_secret` encrypts stored payloads
    pub fn new(store: SessionStore, session_secret: &[u8], store_secret: &[u8]) -> Self {
        Self {
            store,
            signer: CookieSigner::new(session_secret),
            sealer: SessionSealer::new(store_secret),
            ttl: Duration::seconds(SESSION_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolve the session carried by the request's cookie
    ///
    /// Missing, forged and expired cookies all resolve to an anonymous session.
    pub async fn current(&self, headers: &HeaderMap) -> Result<CurrentSession, SessionError> {
        let Some(raw) = session_cookie(headers) else {
            return Ok(CurrentSession::anonymous());
        };

        let id = match self.signer.unsign(raw) {
            Ok(id) => id,
            Err(e) => {
                debug!("Ignoring session cookie: {}", e);
                return Ok(CurrentSession::anonymous());
            }
        };

        let Some(record) = self.store.load(&id, Utc::now()).await? else {
            return Ok(CurrentSession::anonymous());
        };

        let data = match self.sealer.open::<SessionData>(&record.payload) {
            Ok(data) => data,
            Err(e) => {
                warn!("Discarding unreadable session {}: {}", id, e);
                self.store.destroy(&id).await?;
                return Ok(CurrentSession::anonymous());
            }
        };

        Ok(CurrentSession { id: Some(id), data })
    }

    /// Start an authenticated session for `identity`
    ///
    /// Any session the request already had is replaced. Returns the
    /// `Set-Cookie` value for the response.
    pub async fn start(
        &self,
        current: &CurrentSession,
        identity: Identity,
    ) -> Result<HeaderValue, SessionError> {
        if let Some(old) = &current.id {
            self.store.destroy(old).await?;
        }

        let id = Uuid::new_v4().to_string();
        let payload = self.sealer.seal(&SessionData::authenticated(identity))?;
        self.store
            .create(&id, payload, Utc::now() + self.ttl)
            .await?;

        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            self.signer.sign(&id)?,
            self.ttl.num_seconds().max(0)
        );

        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Destroy the request's session and return a cookie that clears it
    pub async fn end(&self, current: &CurrentSession) -> Result<HeaderValue, SessionError> {
        if let Some(id) = &current.id {
            self.store.destroy(id).await?;
        }

        Ok(HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE
        ))?)
    }
}

/// Raw value of the session cookie, if the request has one
fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    let prefix = format!("{}=", SESSION_COOKIE);

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(|c| c.trim())
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .filter(|v| !v.is_empty())
}
