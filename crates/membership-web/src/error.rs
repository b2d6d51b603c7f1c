//! Internal failures surfaced as a generic error page

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use membership_auth::PasswordError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::session::SessionError;
use crate::views::View;

/// Faults a handler cannot turn into a form message
///
/// Validation and credential rejections never produce one of these; they
/// re-render their form instead.
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, View::Failure).into_response()
    }
}
