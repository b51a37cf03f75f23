//! Lookup handler: the tool-loop agent.
//!
//! First invocation requests the lookup tool with the user's query; when
//! the dispatcher re-enters with the tool observation appended, the handler
//! reads it back and produces the final reply.

use crate::core::error::RouteError;
use crate::lookup::LookupReply;
use crate::routing::category::Category;
use crate::routing::handler::{Handler, HandlerResult};
use crate::routing::message::ConversationState;
use crate::tools::lookup::LOOKUP_TOOL_NAME;
use async_trait::async_trait;
use serde_json::json;

pub struct LookupHandler {
    category: Category,
}

impl LookupHandler {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

#[async_trait]
impl Handler for LookupHandler {
    async fn handle(&self, state: &ConversationState) -> Result<HandlerResult, RouteError> {
        let user = state.latest_user().ok_or_else(|| {
            RouteError::handler(
                self.category.name(),
                anyhow::anyhow!("no user turn to respond to"),
            )
        })?;

        if let Some(observation) = state.observations_since_user().last() {
            let reply: LookupReply =
                serde_json::from_str(&observation.content).map_err(|e| {
                    RouteError::handler(
                        self.category.name(),
                        anyhow::anyhow!("malformed lookup observation: {}", e),
                    )
                })?;
            return Ok(HandlerResult::reply(reply.summary, self.category.clone()));
        }

        Ok(HandlerResult::tool_call(
            LOOKUP_TOOL_NAME,
            json!({ "query": user.content }),
        ))
    }
}
