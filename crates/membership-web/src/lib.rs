pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session;
pub mod views;

use axum::{
    handler::HandlerWithoutStateExt,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

use membership_db::{SessionStore, UserDirectory};
use sea_orm::DatabaseConnection;

pub use error::WebError;
pub use session::{SessionManager, SESSION_COOKIE, SESSION_TTL_SECS};

/// Application state shared across handlers
pub struct AppState {
    pub directory: UserDirectory,
    pub sessions: SessionManager,
}

/// Web server configuration
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind the web server
    pub bind_addr: SocketAddr,
    /// Secret used to sign the session cookie
    pub session_secret: String,
    /// Secret used to encrypt session payloads in the store
    pub session_store_secret: String,
    /// Directory of static assets served at `/`
    pub public_dir: PathBuf,
    /// Lifetime of a session, fixed at creation
    pub session_ttl: chrono::Duration,
    /// How often expired sessions are purged from the store
    pub reap_interval: Duration,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            session_secret: String::new(),
            session_store_secret: String::new(),
            public_dir: PathBuf::from("public"),
            session_ttl: chrono::Duration::seconds(SESSION_TTL_SECS),
            reap_interval: Duration::from_secs(10 * 60),
        }
    }
}

/// Web Server
pub struct WebServer {
    config: WebServerConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server over an already-migrated database
    pub fn new(config: WebServerConfig, db: DatabaseConnection) -> Self {
        let sessions = SessionManager::new(
            SessionStore::new(db.clone()),
            config.session_secret.as_bytes(),
            config.session_store_secret.as_bytes(),
        )
        .with_ttl(config.session_ttl);

        let state = Arc::new(AppState {
            directory: UserDirectory::new(db),
            sessions,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // Open to everyone
        let public_router = Router::new()
            .route("/", get(handlers::home))
            .route("/signup", get(handlers::signup_page))
            .route("/signupSubmit", post(handlers::signup_submit))
            .route("/login", get(handlers::login_page))
            .route("/loginSubmit", post(handlers::login_submit))
            .route("/logout", get(handlers::logout));

        // Tier 1: authenticated sessions
        let member_router = Router::new()
            .route("/members", get(handlers::members))
            .route_layer(axum_middleware::from_fn(middleware::require_member));

        // Tier 2: authenticated admin sessions
        let admin_router = Router::new()
            .route("/admin", get(handlers::admin))
            .route("/changeRole", post(handlers::change_role))
            .route_layer(axum_middleware::from_fn(middleware::require_admin));

        // Static assets, then the 404 page
        let static_files = ServeDir::new(&self.config.public_dir)
            .not_found_service(handlers::not_found.into_service());

        Router::new()
            .merge(public_router)
            .merge(member_router)
            .merge(admin_router)
            .fallback_service(static_files)
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::resolve_session,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        let _reaper = spawn_session_reaper(
            self.state.sessions.store().clone(),
            self.config.reap_interval,
        );

        info!("Starting web server on {}", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

/// Periodically delete expired sessions from the store
///
/// Expired sessions are already ignored when read; this only reclaims rows
/// for browsers that never came back.
pub fn spawn_session_reaper(store: SessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;

            match store.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => debug!("Purged {} expired session(s)", purged),
                Err(e) => warn!("Failed to purge expired sessions: {}", e),
            }
        }
    })
}
