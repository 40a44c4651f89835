//! User registration, login, and session endpoints.
//!
//! Login, registration, and refresh all issue a fresh token and persist
//! `token_expiration = now + TTL`; that persisted value is what the cleanup
//! scheduler later acts on. The token itself also travels back as an
//! HTTP-only cookie so browser clients need no header plumbing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::store::{NewUser, SessionMemoryStore, User, UserStore, chat_thread_id};
use flightdeck_token::Clock;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenResponse>,
}

impl UserResponse {
    fn from_user(user: &User, token: Option<TokenResponse>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
            token,
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    tracing::debug!(email = %req.email, "attempting to register user");

    if state.users.exists_by_email(&req.email).await? {
        tracing::warn!(email = %req.email, "registration failed: email already exists");
        return Err(ApiError::EmailAlreadyRegistered);
    }

    let password_hash = hash_password(&req.password)?;
    let expiration = state.clock.now() + state.token_ttl();
    let user = state
        .users
        .create(NewUser {
            name: req.name,
            email: req.email,
            password_hash,
            phone: req.phone,
            token_expiration: Some(expiration),
        })
        .await?;

    let token = state.codec.issue(&user.email, state.token_ttl())?;
    tracing::info!(email = %user.email, id = user.id, "registered new user");

    Ok(with_access_cookie(
        &state,
        &token,
        Json(TokenResponse::bearer(token.clone())),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    tracing::debug!(email = %req.email, "login attempt");

    let user = state.users.find_by_email(&req.email).await?;
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        tracing::warn!(email = %req.email, "failed login attempt");
        return Err(ApiError::InvalidCredentials);
    };

    let expiration = state.clock.now() + state.token_ttl();
    state
        .users
        .set_token_expiration(user.id, Some(expiration))
        .await?;

    let token = state.codec.issue(&user.email, state.token_ttl())?;
    tracing::info!(email = %user.email, id = user.id, "successful login");

    Ok(with_access_cookie(
        &state,
        &token,
        Json(UserResponse::from_user(
            &user,
            Some(TokenResponse::bearer(token.clone())),
        )),
    ))
}

/// Re-issue a token for the authenticated principal. The old token is
/// untouched; it simply ages out at its own expiry.
pub async fn refresh(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, ApiError> {
    let Some(Extension(current)) = current_user else {
        return Err(ApiError::NotAuthenticated);
    };

    let expiration = state.clock.now() + state.token_ttl();
    state
        .users
        .set_token_expiration(current.user.id, Some(expiration))
        .await?;

    let token = state.codec.issue(&current.user.email, state.token_ttl())?;
    tracing::info!(email = %current.user.email, "refreshed access token");

    Ok(with_access_cookie(
        &state,
        &token,
        Json(TokenResponse::bearer(token.clone())),
    ))
}

/// Clear the persisted expiry and drop the caller's chat memory thread
/// right away instead of waiting for the next cleanup tick.
pub async fn logout(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, ApiError> {
    let Some(Extension(current)) = current_user else {
        return Err(ApiError::NotAuthenticated);
    };

    state
        .users
        .set_token_expiration(current.user.id, None)
        .await?;
    state
        .memory
        .delete_thread(&chat_thread_id(current.user.id))
        .await?;

    tracing::info!(email = %current.user.email, "logged out");

    let cookie = clear_cookie_value(&state);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "detail": "Successfully logged out" })),
    )
        .into_response())
}

pub async fn me(
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Json<UserResponse>, ApiError> {
    let Some(Extension(current)) = current_user else {
        return Err(ApiError::NotAuthenticated);
    };
    Ok(Json(UserResponse::from_user(&current.user, None)))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn with_access_cookie(state: &AppState, token: &str, body: impl IntoResponse) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        state.cookie_name,
        token,
        state.cfg.auth.cookie_same_site.as_str(),
        state.cfg.auth.cookie_max_age_seconds()
    );
    ([(header::SET_COOKIE, cookie)], body).into_response()
}

fn clear_cookie_value(state: &AppState) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        state.cookie_name,
        state.cfg.auth.cookie_same_site.as_str()
    )
}
