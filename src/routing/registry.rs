//! Handler registry with startup-time coverage checks.
//!
//! A category without a handler is a configuration error at build time,
//! never a request-time fallback.

use crate::core::error::RouteError;
use crate::routing::category::{Category, CategorySet};
use crate::routing::handler::Handler;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RegistryBuilder {
    handlers: HashMap<Category, Arc<dyn Handler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(mut self, category: &str, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(Category::new(category), handler);
        self
    }

    /// Validates full coverage of the category set in both directions.
    pub fn build(self, categories: &CategorySet) -> Result<HandlerRegistry, RouteError> {
        let missing: Vec<&str> = categories
            .members()
            .iter()
            .filter(|c| !self.handlers.contains_key(c))
            .map(Category::name)
            .collect();
        if !missing.is_empty() {
            return Err(RouteError::Configuration(format!(
                "no handler registered for categories: {}",
                missing.join(", ")
            )));
        }

        for registered in self.handlers.keys() {
            if !categories.contains(registered) {
                return Err(RouteError::Configuration(format!(
                    "handler registered for unknown category '{}'",
                    registered
                )));
            }
        }

        tracing::debug!(
            "[HandlerRegistry] built with {} handlers ({})",
            self.handlers.len(),
            categories.names()
        );

        Ok(HandlerRegistry {
            handlers: self.handlers,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HandlerRegistry {
    handlers: HashMap<Category, Arc<dyn Handler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("categories", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    pub fn resolve(&self, category: &Category) -> Result<Arc<dyn Handler>, RouteError> {
        self.handlers.get(category).cloned().ok_or_else(|| {
            RouteError::Configuration(format!("no handler for category '{}'", category))
        })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
