//! Category classification.
//!
//! Information Hiding:
//! - Callers cannot tell whether classification is rule-based or delegated
//!   to an LLM backend; both sit behind the same trait
//! - Rule ordering and prompt construction are internal

use crate::core::error::RouteError;
use crate::core::llm::{ChatTurn, LlmClient};
use crate::routing::category::{Category, CategorySet};
use crate::routing::message::Message;
use async_trait::async_trait;
use serde::Deserialize;

/// Maps the latest user turn to a member of the configured category set.
///
/// Implementations must be total: every message classifies to a set member,
/// with the set's default as the fallback. An out-of-set label is a
/// [`RouteError::Classification`], never coerced.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        message: &Message,
        categories: &CategorySet,
    ) -> Result<Category, RouteError>;
}

#[derive(Debug)]
struct Rule {
    keywords: Vec<String>,
    category: Category,
}

/// Ordered keyword rules: first rule with a case-insensitive substring match
/// wins, declaration order breaks ties, no match falls back to the set
/// default. Pure and deterministic.
#[derive(Debug)]
pub struct RuleClassifier {
    rules: Vec<Rule>,
}

impl RuleClassifier {
    pub fn builder() -> RuleClassifierBuilder {
        RuleClassifierBuilder { rules: Vec::new() }
    }

    fn matched_category(&self, content: &str) -> Option<&Category> {
        let haystack = content.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
            .map(|rule| &rule.category)
    }
}

pub struct RuleClassifierBuilder {
    rules: Vec<Rule>,
}

impl RuleClassifierBuilder {
    /// Append a (keyword-set, category) rule. Priority follows declaration
    /// order.
    pub fn rule<I, S>(mut self, keywords: I, category: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(Rule {
            keywords: keywords
                .into_iter()
                .map(|kw| kw.into().to_lowercase())
                .collect(),
            category: Category::new(category),
        });
        self
    }

    /// Validates every rule category against the set.
    pub fn build(self, categories: &CategorySet) -> Result<RuleClassifier, RouteError> {
        for rule in &self.rules {
            if !categories.contains(&rule.category) {
                return Err(RouteError::Configuration(format!(
                    "classifier rule targets unknown category '{}'",
                    rule.category
                )));
            }
        }
        Ok(RuleClassifier { rules: self.rules })
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    async fn classify(
        &self,
        message: &Message,
        categories: &CategorySet,
    ) -> Result<Category, RouteError> {
        let category = self
            .matched_category(&message.content)
            .unwrap_or_else(|| categories.default_category());
        Ok(category.clone())
    }
}

#[derive(Debug, Deserialize)]
struct LabelDecision {
    category: String,
}

/// Delegates classification to the LLM backend with a structured-output
/// prompt over the configured labels.
pub struct LlmClassifier {
    client: LlmClient,
}

impl LlmClassifier {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn prompt(categories: &CategorySet) -> String {
        format!(
            "You are a message classifier. Assign the user message exactly one \
             of these categories: {}.\n\n\
             Respond with valid JSON only, in this exact shape:\n\
             {{\"category\": \"<one of the listed names>\"}}\n\
             No extra text.",
            categories.names()
        )
    }

    fn extract_label(response: &str) -> Option<LabelDecision> {
        if let Ok(decision) = serde_json::from_str::<LabelDecision>(response) {
            return Some(decision);
        }
        // Backends sometimes wrap the JSON in prose.
        let start = response.find('{')?;
        let end = response.rfind('}')?;
        serde_json::from_str(&response[start..=end]).ok()
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        message: &Message,
        categories: &CategorySet,
    ) -> Result<Category, RouteError> {
        let messages = vec![
            ChatTurn::system(Self::prompt(categories)),
            ChatTurn::user(message.content.clone()),
        ];

        let response = self
            .client
            .chat(messages)
            .await
            .map_err(|e| RouteError::Classification(format!("backend call failed: {}", e)))?;

        let decision = Self::extract_label(&response).ok_or_else(|| {
            RouteError::Classification(format!("malformed backend output: {}", response))
        })?;

        categories
            .get(&decision.category)
            .cloned()
            .ok_or_else(|| {
                RouteError::Classification(format!(
                    "label '{}' is not in the configured set ({})",
                    decision.category,
                    categories.names()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> CategorySet {
        CategorySet::new(["weather", "food", "emotional", "logical"], "logical").unwrap()
    }

    fn rules(categories: &CategorySet) -> RuleClassifier {
        RuleClassifier::builder()
            .rule(["weather", "forecast"], "weather")
            .rule(["eat", "hungry"], "food")
            .rule(["sad", "feel"], "emotional")
            .build(categories)
            .unwrap()
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let set = categories();
        let classifier = rules(&set);

        // "weather" appears before "eat" in declaration order.
        let msg = Message::user("What should I eat in this weather?");
        let category = classifier.classify(&msg, &set).await.unwrap();
        assert_eq!(category.name(), "weather");
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let set = categories();
        let classifier = rules(&set);

        let msg = Message::user("I'm so HUNGRY right now");
        let category = classifier.classify(&msg, &set).await.unwrap();
        assert_eq!(category.name(), "food");
    }

    #[tokio::test]
    async fn no_match_falls_back_to_default() {
        let set = categories();
        let classifier = rules(&set);

        let msg = Message::user("zzz qqq");
        let category = classifier.classify(&msg, &set).await.unwrap();
        assert_eq!(category.name(), "logical");
    }

    #[tokio::test]
    async fn classification_is_deterministic() {
        let set = categories();
        let classifier = rules(&set);
        let msg = Message::user("I feel hungry");

        let first = classifier.classify(&msg, &set).await.unwrap();
        let second = classifier.classify(&msg, &set).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn builder_rejects_unknown_rule_category() {
        let set = categories();
        let err = RuleClassifier::builder()
            .rule(["pizza"], "snacks")
            .build(&set)
            .unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let decision =
            LlmClassifier::extract_label("Sure! Here it is: {\"category\": \"food\"} Done.")
                .unwrap();
        assert_eq!(decision.category, "food");
        assert!(LlmClassifier::extract_label("no json here").is_none());
    }
}
