//! Chat-completions client for the LLM response backend.
//!
//! The endpoint is OpenAI-compatible (the default points at Groq); base URL,
//! model and sampling parameters come from [`LlmConfig`]. Transient failures
//! are retried with exponential backoff before the error is handed to the
//! caller.

use crate::config::LlmConfig;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// One role-tagged turn on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatTurn>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatTurn,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;

impl LlmClient {
    pub fn new(api_key: String, config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }

    /// Send a chat completion request and return the generated text.
    pub async fn chat(&self, messages: Vec<ChatTurn>) -> Result<String> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let mut last_error = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "[LlmClient] retrying chat request (attempt {}/{}) after {}ms",
                    attempt + 1,
                    MAX_ATTEMPTS,
                    delay
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
            }

            let response = match self
                .client
                .post(&self.config.base_url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::warn!("[LlmClient] request failed: {}", e);
                    last_error = Some(anyhow::anyhow!("request failed: {}", e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                tracing::warn!("[LlmClient] backend returned {}: {}", status, body);
                last_error = Some(anyhow::anyhow!("backend error {}: {}", status, body));
                continue;
            }

            let completion = match response.json::<CompletionResponse>().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("[LlmClient] failed to decode response: {}", e);
                    last_error = Some(anyhow::anyhow!("response decode error: {}", e));
                    continue;
                }
            };

            return Ok(completion
                .choices
                .first()
                .map(|c| c.message.content.clone())
                .unwrap_or_default());
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("all chat attempts failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "test-model".to_string(),
            max_tokens: 256,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn chat_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hello back"}}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(
            "test-key".to_string(),
            test_config(format!("{}/chat/completions", server.uri())),
        );

        let reply = client.chat(vec![ChatTurn::user("hello")]).await.unwrap();
        assert_eq!(reply, "hello back");
    }

    #[tokio::test]
    async fn chat_surfaces_backend_errors_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = LlmClient::new(
            "test-key".to_string(),
            test_config(format!("{}/chat/completions", server.uri())),
        );

        let err = client.chat(vec![ChatTurn::user("hello")]).await.unwrap_err();
        assert!(err.to_string().contains("backend error"));
    }
}
