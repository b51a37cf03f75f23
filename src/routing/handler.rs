//! Handler contract bound to each category.

use crate::core::error::RouteError;
use crate::routing::category::Category;
use crate::routing::message::ConversationState;
use async_trait::async_trait;
use serde_json::Value;

/// What a handler produced for the current hop.
#[derive(Debug, Clone)]
pub enum HandlerResult {
    /// Terminal response; the dispatcher appends it as the assistant turn
    /// with the given category attached.
    Reply { text: String, category: Category },
    /// Request to invoke a named external tool. The dispatcher resolves it,
    /// appends the output as a synthetic turn and re-invokes the same
    /// handler without reclassifying.
    ToolCall { tool: String, args: Value },
}

impl HandlerResult {
    pub fn reply(text: impl Into<String>, category: Category) -> Self {
        Self::Reply {
            text: text.into(),
            category,
        }
    }

    pub fn tool_call(tool: impl Into<String>, args: Value) -> Self {
        Self::ToolCall {
            tool: tool.into(),
            args,
        }
    }
}

/// Logic bound to a category. Reads the conversation, never writes it; all
/// appends go through the dispatcher.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, state: &ConversationState) -> Result<HandlerResult, RouteError>;
}
