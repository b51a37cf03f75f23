//! Tabular user-preference lookup.
//!
//! Information Hiding:
//! - How the table is stored and searched is hidden behind the trait; the
//!   routing core only sees summaries and records
//! - Vocabulary extraction (which words count as food or weather terms) is
//!   derived from the injected data, not hardcoded

pub mod table;

use crate::routing::message::{ConversationState, Role};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use table::UserTable;

/// One row of the tabular store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRecord {
    pub username: String,
    pub contact: String,
    pub preferences: Vec<String>,
    pub weather: String,
    pub food: String,
}

/// Structured lookup result: a human-readable summary, the matching rows
/// and, when exactly one row matched, a contact identifier for follow-up
/// delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupReply {
    pub summary: String,
    pub records: Vec<LookupRecord>,
    pub contact: Option<String>,
}

impl LookupReply {
    /// Builds a reply with the single-match contact rule applied: contact
    /// is populated only when exactly one record matched.
    pub fn new(summary: impl Into<String>, records: Vec<LookupRecord>) -> Self {
        let contact = match records.as_slice() {
            [only] => Some(only.contact.clone()),
            _ => None,
        };
        Self {
            summary: summary.into(),
            records,
            contact,
        }
    }

    pub fn empty(summary: impl Into<String>) -> Self {
        Self::new(summary, Vec::new())
    }
}

/// External provider of tabular record search.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<LookupReply>;
}

/// The most recent lookup observation of the in-flight turn, if the run
/// produced one. Callers use this to pick up `records` and `contact` after
/// a dispatcher run.
pub fn latest_reply(state: &ConversationState) -> Option<LookupReply> {
    let last_user = state
        .messages()
        .iter()
        .rposition(|m| m.role == Role::User)?;
    state.messages()[last_user + 1..]
        .iter()
        .rev()
        .find(|m| m.role == Role::System)
        .and_then(|m| serde_json::from_str(&m.content).ok())
}
