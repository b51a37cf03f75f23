use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub llm: LlmConfig,
    pub routing: RoutingConfig,
    pub weather: WeatherConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub max_hops: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub base_url: String,
    pub units: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook endpoint for the notification side-channel. Unset disables
    /// delivery.
    #[serde(default)]
    pub endpoint: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// Layered configuration: built-in defaults, then an optional
    /// `config/{CONFIG_ENV}` file, then `APP__`-prefixed environment
    /// variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .set_default(
                "llm.base_url",
                "https://api.groq.com/openai/v1/chat/completions",
            )?
            .set_default("llm.model", "llama3-8b-8192")?
            .set_default("llm.max_tokens", 1024_i64)?
            .set_default("llm.temperature", 0.7_f64)?
            .set_default("routing.max_hops", 10_i64)?
            .set_default(
                "weather.base_url",
                "https://api.openweathermap.org/data/2.5/weather",
            )?
            .set_default("weather.units", "metric")?
            .set_default("notify.sender", "snackroute@localhost")?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn api_key() -> Result<String> {
        env::var("GROQ_API_KEY")
            .map_err(|_| anyhow::anyhow!("GROQ_API_KEY environment variable not set"))
    }

    /// Weather provider key; handlers degrade gracefully when absent.
    pub fn weather_api_key() -> Option<String> {
        env::var("OPENWEATHER_API_KEY").ok()
    }
}
