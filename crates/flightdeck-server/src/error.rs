//! Error types for the API server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use flightdeck_token::TokenError;

/// Errors surfaced by request handlers.
///
/// Everything infrastructural collapses to a generic 500 body; the real
/// cause goes to the logs, never to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Registration with an email that already has an account.
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// Login with a bad email or password.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Handler reached without an authenticated principal.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Token issuance failure.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing failure.
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::EmailAlreadyRegistered => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Store(_) | ApiError::Token(_) | ApiError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error handling request");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
