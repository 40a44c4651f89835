//! Per-user conversational memory.
//!
//! The assistant's conversation state is process-local, keyed by a thread
//! id derived from the user id. The cleanup scheduler deletes whole
//! threads; deletion of an absent thread is success, so repeated cleanup
//! passes are harmless.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::StoreError;

/// The memory thread id for a user's conversation.
pub fn chat_thread_id(user_id: i64) -> String {
    format!("chat_thread_{user_id}")
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Store of conversation threads.
#[async_trait]
pub trait SessionMemoryStore: Send + Sync {
    /// Append a turn to a thread, creating the thread if needed.
    async fn append(&self, thread_id: &str, turn: ChatTurn) -> Result<(), StoreError>;

    /// All turns of a thread, oldest first. Absent threads are empty.
    async fn history(&self, thread_id: &str) -> Result<Vec<ChatTurn>, StoreError>;

    /// Delete a whole thread. Returns whether a thread existed; deleting
    /// an absent thread is still `Ok`.
    async fn delete_thread(&self, thread_id: &str) -> Result<bool, StoreError>;
}

/// In-process implementation over a locked map.
#[derive(Default)]
pub struct InMemorySessionStore {
    threads: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionMemoryStore for InMemorySessionStore {
    async fn append(&self, thread_id: &str, turn: ChatTurn) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.to_string()).or_default().push(turn);
        Ok(())
    }

    async fn history(&self, thread_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<bool, StoreError> {
        let mut threads = self.threads.write().await;
        Ok(threads.remove(thread_id).is_some())
    }
}
