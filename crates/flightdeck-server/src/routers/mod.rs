//! HTTP routers.

pub mod chat;
pub mod health;
pub mod users;

use axum::routing::{get, post};
use axum::{Json, Router, middleware::from_fn_with_state};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::require_auth;
use crate::state::AppState;

/// Assemble the full application router with the auth gate applied.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health_check))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh", post(users::refresh))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::me))
        .route(
            "/chat/history",
            get(chat::history).delete(chat::clear_history),
        )
        .layer(from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Flightdeck booking assistant API" }))
}
