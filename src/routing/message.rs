//! Conversation log primitives.
//!
//! Information Hiding:
//! - The message vector is private; the only way in is an append
//! - A `Message` has no mutators, so an appended turn can never change

use crate::routing::category::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in the conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            category: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            category: None,
        }
    }

    pub fn assistant(content: impl Into<String>, category: Category) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            category: Some(category),
        }
    }

    /// Synthetic system turn carrying a tool's structured output back into
    /// the dispatch loop.
    pub(crate) fn observation(content: impl Into<String>, category: Category) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            category: Some(category),
        }
    }
}

/// Append-only ordered message log plus the category recorded by the most
/// recent classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    current_category: Option<Category>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a state from persisted messages.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            current_category: None,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_current_category(&mut self, category: Category) {
        self.current_category = Some(category);
    }

    pub fn current_category(&self) -> Option<&Category> {
        self.current_category.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent user turn, if any.
    pub fn latest_user(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// The user turn still awaiting an assistant reply, if any. `None`
    /// means the state is terminal and a dispatcher run is a no-op.
    pub fn pending_user_turn(&self) -> Option<&Message> {
        let last_user = self.messages.iter().rposition(|m| m.role == Role::User)?;
        let last_assistant = self.messages.iter().rposition(|m| m.role == Role::Assistant);
        match last_assistant {
            Some(idx) if idx > last_user => None,
            _ => self.messages.get(last_user),
        }
    }

    /// System turns appended after the most recent user turn: the tool
    /// observations of the in-flight run.
    pub fn observations_since_user(&self) -> impl Iterator<Item = &Message> {
        let start = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::User)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.messages[start..]
            .iter()
            .filter(|m| m.role == Role::System)
    }
}
