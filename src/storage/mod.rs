//! Conversation persistence.
//!
//! Information Hiding:
//! - Storage backend details hidden behind the trait; memory and
//!   filesystem backends are interchangeable
//! - The serialized form is the ordered `{role, content, category?}`
//!   record list; callers never see file layout

pub mod filesystem;
pub mod memory;

use crate::routing::message::Message;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ConversationStorage: Send + Sync {
    /// Persist the full message log for a session.
    async fn save(&self, session_id: &str, history: &[Message]) -> Result<()>;

    /// Load a session's log. Unknown sessions load as empty.
    async fn load(&self, session_id: &str) -> Result<Vec<Message>>;

    async fn delete(&self, session_id: &str) -> Result<()>;

    async fn list_sessions(&self) -> Result<Vec<String>>;

    async fn exists(&self, session_id: &str) -> Result<bool> {
        Ok(!self.load(session_id).await?.is_empty())
    }
}
