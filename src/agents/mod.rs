//! Built-in assistant wirings.
//!
//! Information Hiding:
//! - Hides category sets, classifier rules and handler assignment
//! - Adding a category is a change here, not in the routing core

pub mod lookup;
pub mod prompt;
pub mod weather;

use crate::config::Settings;
use crate::core::error::RouteError;
use crate::core::llm::LlmClient;
use crate::lookup::LookupService;
use crate::routing::category::CategorySet;
use crate::routing::classifier::{Classifier, LlmClassifier, RuleClassifier};
use crate::routing::dispatcher::Dispatcher;
use crate::routing::registry::RegistryBuilder;
use crate::tools::lookup::LookupTool;
use crate::tools::registry::ToolRegistry;
use std::sync::Arc;

use lookup::LookupHandler;
use weather::WeatherHandler;

/// Categories of the lookup assistant. `general-query` is the fallback.
pub fn lookup_categories() -> Result<CategorySet, RouteError> {
    CategorySet::new(
        [
            "food-query",
            "weather-query",
            "email-query",
            "preference-query",
            "combo-query",
            "general-query",
        ],
        "general-query",
    )
}

/// Assistant that answers every intent from the injected lookup service via
/// the tool loop. Fully offline: no LLM backend involved.
pub fn lookup_assistant(
    service: Arc<dyn LookupService>,
    max_hops: usize,
) -> Result<Dispatcher, RouteError> {
    let categories = lookup_categories()?;

    let classifier = RuleClassifier::builder()
        .rule(["when it", "and prefer", "both"], "combo-query")
        .rule(["email", "contact"], "email-query")
        .rule(
            ["weather", "sunny", "rainy", "cloudy", "windy", "snowy"],
            "weather-query",
        )
        .rule(
            [
                "food", "eat", "pizza", "biryani", "pasta", "sushi", "burgers", "salad",
                "sandwich", "samosa", "likes",
            ],
            "food-query",
        )
        .rule(["preference", "hobby", "hobbies", "cricket"], "preference-query")
        .build(&categories)?;

    let mut builder = RegistryBuilder::new();
    for category in categories.members() {
        builder = builder.register(
            category.name(),
            Arc::new(LookupHandler::new(category.clone())),
        );
    }
    let registry = builder.build(&categories)?;

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(LookupTool::new(service)));

    Dispatcher::new(Arc::new(classifier), categories, registry, tools, max_hops)
}

/// Categories of the chat assistant. `logical` is the fallback.
pub fn chat_categories() -> Result<CategorySet, RouteError> {
    CategorySet::new(["weather", "food", "emotional", "logical"], "logical")
}

/// Assistant that routes each turn to a prompt agent: weather, food,
/// therapist or logical. Classification is rule-based by default, or
/// delegated to the LLM backend.
pub fn chat_assistant(
    settings: &Settings,
    api_key: String,
    use_llm_classifier: bool,
) -> Result<Dispatcher, RouteError> {
    let categories = chat_categories()?;
    let client = LlmClient::new(api_key, settings.llm.clone());

    let classifier: Arc<dyn Classifier> = if use_llm_classifier {
        Arc::new(LlmClassifier::new(client.clone()))
    } else {
        Arc::new(
            RuleClassifier::builder()
                .rule(
                    ["weather", "temperature", "forecast", "climate", "rain", "snow"],
                    "weather",
                )
                .rule(
                    ["eat", "food", "hungry", "craving", "dish", "snack", "meal"],
                    "food",
                )
                .rule(
                    ["feel", "sad", "anxious", "stress", "lonely", "overwhelmed", "therapy"],
                    "emotional",
                )
                .build(&categories)?,
        )
    };

    let registry = RegistryBuilder::new()
        .register(
            "weather",
            Arc::new(WeatherHandler::new(
                client.clone(),
                settings.weather.clone(),
                Settings::weather_api_key(),
            )),
        )
        .register("food", Arc::new(prompt::food_recommender(client.clone())))
        .register("emotional", Arc::new(prompt::therapist(client.clone())))
        .register("logical", Arc::new(prompt::logical(client)))
        .build(&categories)?;

    Dispatcher::new(
        classifier,
        categories,
        registry,
        ToolRegistry::new(),
        settings.routing.max_hops,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::UserTable;

    #[test]
    fn lookup_assistant_wires_every_category() {
        let dispatcher = lookup_assistant(Arc::new(UserTable::sample()), 10).unwrap();
        assert_eq!(dispatcher.categories().members().len(), 6);
        assert_eq!(dispatcher.categories().default_category().name(), "general-query");
    }
}
