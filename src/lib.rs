//! Snackroute - intent-routing dispatcher for chat assistants
//!
//! Classifies each user turn into a closed, configured category set,
//! dispatches to the handler registered for that category, and loops
//! through external tool lookups under a hop bound. The lookup table, LLM
//! backend and notification channel are injected collaborators behind
//! traits.

pub mod agents;
pub mod api;
pub mod cli;
mod config;
pub mod core;
pub mod lookup;
pub mod notify;
pub mod routing;
pub mod storage;
pub mod tools;
pub mod utils;

pub use crate::api::{route_query, route_query_with_service, RouteReport};
pub use crate::config::{
    LlmConfig, LoggingConfig, NotifyConfig, RoutingConfig, Settings, WeatherConfig,
};
pub use crate::core::error::RouteError;
pub use crate::routing::{
    Category, CategorySet, Classifier, ConversationState, Dispatcher, Handler, HandlerResult,
    LlmClassifier, Message, Role, RuleClassifier, RunOutcome,
};
