//! Persistence collaborators: the user store and the per-user chat memory.

pub mod memory;
pub mod users;

use thiserror::Error;

pub use memory::{ChatTurn, InMemorySessionStore, SessionMemoryStore, TurnRole, chat_thread_id};
pub use users::{NewUser, SqliteUserStore, User, UserStore};

/// Errors from the persistence layer.
///
/// These are infrastructural, not auth decisions: the gate maps them to a
/// generic 500, and a cleanup tick that hits one is aborted and retried on
/// the next interval.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced user does not exist.
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// Store is unavailable (used by tests to simulate outages).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
