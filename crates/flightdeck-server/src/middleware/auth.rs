//! Authentication middleware.
//!
//! Every request passes through here before any handler. The pipeline is
//! terminal per request: excluded paths are forwarded untouched, everything
//! else must present a verifiable token resolving to a live user, or the
//! request is rejected without ever invoking the downstream handler.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;
use crate::store::{User, UserStore};

/// The authenticated principal, attached as a request extension together
/// with the raw token it was resolved from.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Axum middleware validating access tokens for protected endpoints.
///
/// Supports both `Authorization: Bearer` and cookie-based tokens, header
/// first. The principal is looked up fresh on every request so revocation
/// takes effect immediately.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if state.exclusions.matches(&path) {
        tracing::debug!(%path, "path is excluded from authentication");
        return next.run(req).await;
    }

    let Some(token) = extract_token(req.headers(), &state.cookie_name) else {
        tracing::warn!(%path, "no token provided for protected endpoint");
        return reject(StatusCode::UNAUTHORIZED, "No authentication token provided");
    };

    // Internal logs may distinguish why a token failed; the caller never
    // sees more than one uniform rejection.
    let subject = match state.codec.verify(&token) {
        Ok(subject) => subject,
        Err(err) => {
            tracing::warn!(%path, error = %err, "invalid token for endpoint");
            return reject(StatusCode::UNAUTHORIZED, "Invalid or expired token");
        }
    };

    let user = match state.users.find_by_email(&subject).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(%path, "token subject not found in user store");
            return reject(StatusCode::UNAUTHORIZED, "Invalid or expired token");
        }
        Err(err) => {
            tracing::error!(%path, error = %err, "user store failure during authentication");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    tracing::debug!(email = %user.email, %path, "authenticated user for endpoint");
    req.extensions_mut().insert(CurrentUser { user, token });
    next.run(req).await
}

/// Extract a token from the `Authorization` header (preferred) or the
/// access token cookie.
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    cookie_token(headers, cookie_name)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = header_value.to_str() else {
            continue;
        };
        for cookie in cookies.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie.strip_prefix(cookie_name)
                && let Some(value) = value.strip_prefix('=')
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
