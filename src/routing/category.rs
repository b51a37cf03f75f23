//! Closed category set configured at startup.

use crate::core::error::RouteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label partitioning user intents. Cheap to clone, compared by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of categories plus a designated default. The set is closed:
/// classifiers and registries are validated against it, never extended at
/// runtime.
#[derive(Debug, Clone)]
pub struct CategorySet {
    members: Vec<Category>,
    default: Category,
}

impl CategorySet {
    pub fn new<I, S>(members: I, default: &str) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<Category> = members.into_iter().map(Category::new).collect();

        if members.is_empty() {
            return Err(RouteError::Configuration(
                "category set must not be empty".to_string(),
            ));
        }

        for (i, member) in members.iter().enumerate() {
            if members[..i].contains(member) {
                return Err(RouteError::Configuration(format!(
                    "duplicate category '{}'",
                    member
                )));
            }
        }

        let default = members
            .iter()
            .find(|m| m.name() == default)
            .cloned()
            .ok_or_else(|| {
                RouteError::Configuration(format!(
                    "default category '{}' is not a member of the set",
                    default
                ))
            })?;

        Ok(Self { members, default })
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.members.contains(category)
    }

    /// Canonical member for a name, if configured.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn default_category(&self) -> &Category {
        &self.default
    }

    pub fn members(&self) -> &[Category] {
        &self.members
    }

    /// Member names joined for classifier prompts and error messages.
    pub fn names(&self) -> String {
        self.members
            .iter()
            .map(Category::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_set() {
        let err = CategorySet::new(Vec::<String>::new(), "logical").unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }

    #[test]
    fn rejects_duplicates() {
        let err = CategorySet::new(["food", "weather", "food"], "weather").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_default_outside_the_set() {
        let err = CategorySet::new(["food", "weather"], "logical").unwrap_err();
        assert!(err.to_string().contains("default"));
    }

    #[test]
    fn resolves_canonical_members() {
        let set = CategorySet::new(["food", "weather", "logical"], "logical").unwrap();
        assert!(set.contains(&Category::new("food")));
        assert_eq!(set.get("weather").unwrap().name(), "weather");
        assert!(set.get("emotional").is_none());
        assert_eq!(set.default_category().name(), "logical");
    }
}
