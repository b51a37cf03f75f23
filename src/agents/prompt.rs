//! Prompt-backed handlers.
//!
//! Each handler wraps the LLM backend with a fixed system prompt and
//! responds to the latest user turn, the way the chat agents in the demo
//! scripts did.

use crate::core::error::RouteError;
use crate::core::llm::{ChatTurn, LlmClient};
use crate::routing::category::Category;
use crate::routing::handler::{Handler, HandlerResult};
use crate::routing::message::ConversationState;
use async_trait::async_trait;

pub struct PromptHandler {
    name: String,
    category: Category,
    system_prompt: String,
    client: LlmClient,
}

impl PromptHandler {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        system_prompt: impl Into<String>,
        client: LlmClient,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            system_prompt: system_prompt.into(),
            client,
        }
    }
}

#[async_trait]
impl Handler for PromptHandler {
    async fn handle(&self, state: &ConversationState) -> Result<HandlerResult, RouteError> {
        let user = state.latest_user().ok_or_else(|| {
            RouteError::handler(
                self.category.name(),
                anyhow::anyhow!("no user turn to respond to"),
            )
        })?;

        tracing::debug!("[{}] responding to latest user turn", self.name);

        let turns = vec![
            ChatTurn::system(self.system_prompt.clone()),
            ChatTurn::user(user.content.clone()),
        ];

        let text = self
            .client
            .chat(turns)
            .await
            .map_err(|e| RouteError::handler(self.category.name(), e))?;

        Ok(HandlerResult::reply(text, self.category.clone()))
    }
}

/// Empathic responder for emotional messages.
pub fn therapist(client: LlmClient) -> PromptHandler {
    PromptHandler::new(
        "therapist",
        Category::new("emotional"),
        "You are a compassionate therapist. Focus on the emotional side of the \
         user's message: validate their feelings and ask gentle questions that \
         help them explore what they are going through. Do not offer logical \
         solutions unless explicitly asked.",
        client,
    )
}

/// Fact-focused responder.
pub fn logical(client: LlmClient) -> PromptHandler {
    PromptHandler::new(
        "logical",
        Category::new("logical"),
        "You are a purely logical assistant. Focus only on facts and \
         information. Give clear, concise answers based on logic and \
         evidence, without addressing emotions.",
        client,
    )
}

/// Suggests dishes suited to the current conditions.
pub fn food_recommender(client: LlmClient) -> PromptHandler {
    PromptHandler::new(
        "food_recommender",
        Category::new("food"),
        "You are a food recommender that suggests dishes suited to the \
         current weather and the user's cravings. Suggest a dish and briefly \
         say why it fits.",
        client,
    )
}
