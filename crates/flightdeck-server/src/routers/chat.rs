//! Conversation history endpoints.
//!
//! The assistant's own turn generation lives elsewhere; these endpoints
//! expose the caller's memory thread and let them clear it. The thread id
//! is the same one the cleanup scheduler deletes when the session expires.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::store::{ChatTurn, SessionMemoryStore, chat_thread_id};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub thread_id: String,
    pub messages: Vec<ChatTurn>,
}

pub async fn history(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Some(Extension(current)) = current_user else {
        return Err(ApiError::NotAuthenticated);
    };

    let thread_id = chat_thread_id(current.user.id);
    let messages = state.memory.history(&thread_id).await?;
    Ok(Json(HistoryResponse {
        thread_id,
        messages,
    }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<StatusCode, ApiError> {
    let Some(Extension(current)) = current_user else {
        return Err(ApiError::NotAuthenticated);
    };

    let thread_id = chat_thread_id(current.user.id);
    let existed = state.memory.delete_thread(&thread_id).await?;
    tracing::debug!(%thread_id, existed, "cleared conversation history");
    Ok(StatusCode::NO_CONTENT)
}
