//! Weather handler: extracts a city from the message, fetches current
//! conditions, and has the LLM phrase them as advice.

use crate::config::WeatherConfig;
use crate::core::error::RouteError;
use crate::core::llm::{ChatTurn, LlmClient};
use crate::routing::category::Category;
use crate::routing::handler::{Handler, HandlerResult};
use crate::routing::message::ConversationState;
use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"weather in ([a-zA-Z ]+?)(?:\s+like|\s+today|\s+now|[.?!]|$)")
        .expect("city pattern is valid")
});

/// "what's the weather in bangalore today?" -> "Bangalore"
pub fn extract_city(message: &str) -> Option<String> {
    let message = message.to_lowercase();
    let captures = CITY_PATTERN.captures(&message)?;
    let city = captures.get(1)?.as_str().trim();
    if city.is_empty() {
        return None;
    }
    Some(title_case(city))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
struct Conditions {
    description: String,
    temperature: f64,
    humidity: f64,
}

pub struct WeatherHandler {
    category: Category,
    client: LlmClient,
    http: reqwest::Client,
    config: WeatherConfig,
    api_key: Option<String>,
}

impl WeatherHandler {
    pub fn new(client: LlmClient, config: WeatherConfig, api_key: Option<String>) -> Self {
        Self {
            category: Category::new("weather"),
            client,
            http: reqwest::Client::new(),
            config,
            api_key,
        }
    }

    async fn fetch_conditions(&self, city: &str, api_key: &str) -> Result<Conditions> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("q", city),
                ("appid", api_key),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .context("weather request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            anyhow::bail!("weather provider returned {}: {}", status, body);
        }

        let payload: Value = response
            .json()
            .await
            .context("failed to decode weather payload")?;

        let description = payload["weather"][0]["description"]
            .as_str()
            .context("weather payload missing description")?
            .to_string();
        let temperature = payload["main"]["temp"]
            .as_f64()
            .context("weather payload missing temperature")?;
        let humidity = payload["main"]["humidity"]
            .as_f64()
            .context("weather payload missing humidity")?;

        Ok(Conditions {
            description: title_case(&description),
            temperature,
            humidity,
        })
    }
}

#[async_trait]
impl Handler for WeatherHandler {
    async fn handle(&self, state: &ConversationState) -> Result<HandlerResult, RouteError> {
        let user = state.latest_user().ok_or_else(|| {
            RouteError::handler(
                self.category.name(),
                anyhow::anyhow!("no user turn to respond to"),
            )
        })?;

        let Some(city) = extract_city(&user.content) else {
            return Ok(HandlerResult::reply(
                "Please mention a city to get weather details.",
                self.category.clone(),
            ));
        };

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RouteError::handler(
                self.category.name(),
                anyhow::anyhow!("OPENWEATHER_API_KEY is not set"),
            )
        })?;

        tracing::info!("[WeatherHandler] fetching conditions for {}", city);

        let conditions = self
            .fetch_conditions(&city, api_key)
            .await
            .map_err(|e| RouteError::handler(self.category.name(), e))?;

        let report = format!(
            "Weather in {}:\n- Condition: {}\n- Temperature: {}\u{b0}C\n- Humidity: {}%",
            city, conditions.description, conditions.temperature, conditions.humidity
        );

        let turns = vec![
            ChatTurn::system(
                "You are a weather expert who turns raw conditions into friendly advice.",
            ),
            ChatTurn::user(format!("The user asked: {}", user.content)),
            ChatTurn::user(report),
        ];

        let text = self
            .client
            .chat(turns)
            .await
            .map_err(|e| RouteError::handler(self.category.name(), e))?;

        Ok(HandlerResult::reply(text, self.category.clone()))
    }
}
