mod settings;

pub use settings::{LlmConfig, LoggingConfig, NotifyConfig, RoutingConfig, Settings, WeatherConfig};
