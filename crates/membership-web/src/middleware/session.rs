//! Session middleware
//!
//! [`resolve_session`] runs for every request and places a [`CurrentSession`]
//! in the request extensions. The tier gates then read it:
//!
//! 1. [`require_member`]: not authenticated redirects to `/`
//! 2. [`require_admin`]: tier 1 first, then a role other than `admin` gets
//!    403 and the no-access page
//!
//! Both gates insert the session's [`Identity`] into the request extensions
//! for the handler.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::WebError;
use crate::handlers::found;
use crate::models::{CurrentSession, Identity};
use crate::views::View;
use crate::AppState;

/// Resolve the request's session from its cookie
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let session = state.sessions.current(request.headers()).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Tier 1: the session must be authenticated
pub async fn require_member(mut request: Request, next: Next) -> Response {
    let Some(identity) = authenticated(&request) else {
        return found("/");
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Tier 2: the session must be authenticated and carry the admin role
pub async fn require_admin(mut request: Request, next: Next) -> Response {
    let Some(identity) = authenticated(&request) else {
        return found("/");
    };

    if !identity.is_admin() {
        return (StatusCode::FORBIDDEN, View::NoAccess).into_response();
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn authenticated(request: &Request) -> Option<Identity> {
    request
        .extensions()
        .get::<CurrentSession>()
        .and_then(|session| session.identity())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionData;
    use axum::{body::Body, http::header, middleware, routing::get, Extension, Router};
    use tower::ServiceExt; // For oneshot()

    async fn whoami(Extension(identity): Extension<Identity>) -> String {
        identity.name
    }

    fn session(role: Option<&str>) -> CurrentSession {
        match role {
            None => CurrentSession::anonymous(),
            Some(role) => CurrentSession {
                id: Some("sid".to_string()),
                data: SessionData::authenticated(Identity {
                    name: "Ann".to_string(),
                    email: "ann@x.com".to_string(),
                    user_type: role.to_string(),
                }),
            },
        }
    }

    fn app(session: CurrentSession) -> Router {
        Router::new()
            .route(
                "/members",
                get(whoami).route_layer(middleware::from_fn(require_member)),
            )
            .route(
                "/admin",
                get(whoami).route_layer(middleware::from_fn(require_admin)),
            )
            .layer(Extension(session))
    }

    async fn get_path(app: Router, path: &str) -> Response {
        app.oneshot(
            axum::http::Request::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_redirected_from_both_tiers() {
        for path in ["/members", "/admin"] {
            let response = get_path(app(session(None)), path).await;

            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(response.headers()[header::LOCATION], "/");
        }
    }

    #[tokio::test]
    async fn test_member_passes_tier_one() {
        let response = get_path(app(session(Some("member"))), "/members").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Ann");
    }

    #[tokio::test]
    async fn test_member_forbidden_from_tier_two() {
        let response = get_path(app(session(Some("member"))), "/admin").await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_text(response).await.contains("NO ACCESS"));
    }

    #[tokio::test]
    async fn test_unrecognized_role_forbidden_from_tier_two() {
        let response = get_path(app(session(Some("superuser"))), "/admin").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_passes_both_tiers() {
        for path in ["/members", "/admin"] {
            let response = get_path(app(session(Some("admin"))), path).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
