//! In-memory user-preference table.

use super::{LookupRecord, LookupReply, LookupService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::path::Path;

const NO_DATA_SUMMARY: &str = "I couldn't find relevant data for your query.";
const NO_MATCH_SUMMARY: &str = "No matching user found.";

/// Built-in demo dataset.
static SAMPLE_ROWS: Lazy<Vec<LookupRecord>> = Lazy::new(|| {
    let rows = [
        ("Krish", "krish@email.com", "Sports, Music", "Sunny", "Pizza"),
        ("Anaya", "anaya@email.com", "Reading, Painting", "Rainy", "Biryani"),
        ("Rahul", "rahul@email.com", "Gaming, Travel", "Windy", "Pasta"),
        ("Meera", "meera@email.com", "Yoga, Cooking", "Cloudy", "Sushi"),
        ("Arjun", "arjun@email.com", "Running, Chess", "Snowy", "Pizza"),
        ("Sara", "sara@email.com", "Painting, Music", "Rainy", "Burgers"),
        ("Rishi", "rishi@email.com", "Trekking, Movies", "Sunny", "Salad"),
        ("Tanya", "tanya@email.com", "Reading, Dance", "Windy", "Sandwich"),
        ("Dev", "dev@email.com", "Cricket, Cooking", "Cloudy", "Biryani"),
        ("Isha", "isha@email.com", "Travel, Sports", "Sunny", "Pasta"),
        ("Vinay", "vinay@email.com", "Travel, Painting", "Rainy", "Samosa"),
    ];

    rows.iter()
        .map(|(username, contact, preferences, weather, food)| LookupRecord {
            username: username.to_string(),
            contact: contact.to_string(),
            preferences: preferences.split(", ").map(str::to_string).collect(),
            weather: weather.to_string(),
            food: food.to_string(),
        })
        .collect()
});

/// Tabular store searched with the query ladder: username first, then a
/// food+weather conjunction, then single-criterion filters, then the
/// column listings, then the no-data fallback.
pub struct UserTable {
    rows: Vec<LookupRecord>,
}

impl UserTable {
    pub fn new(rows: Vec<LookupRecord>) -> Self {
        Self { rows }
    }

    pub fn sample() -> Self {
        Self::new(SAMPLE_ROWS.clone())
    }

    /// Load rows from a JSON array of records.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read table file {:?}", path))?;
        let rows: Vec<LookupRecord> =
            serde_json::from_str(&raw).context("failed to parse table records")?;
        tracing::info!("[UserTable] loaded {} rows from {:?}", rows.len(), path);
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[LookupRecord] {
        &self.rows
    }

    fn food_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.rows.iter().map(|r| r.food.to_lowercase()).collect();
        terms.sort();
        terms.dedup();
        terms
    }

    fn weather_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.rows.iter().map(|r| r.weather.to_lowercase()).collect();
        terms.sort();
        terms.dedup();
        terms
    }

    fn preference_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .rows
            .iter()
            .flat_map(|r| r.preferences.iter().map(|p| p.to_lowercase()))
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }

    fn usernames(records: &[LookupRecord]) -> String {
        records
            .iter()
            .map(|r| r.username.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn user_attribute_reply(&self, row: &LookupRecord, query: &str) -> LookupReply {
        // "weather" is checked first: it contains "eat", and "weather
        // preference" must not fall into the food or preference branches.
        let summary = if query.contains("weather") {
            format!("{}'s weather preference is {}.", row.username, row.weather)
        } else if query.contains("food") || query.contains("eat") {
            format!("{} likes to eat {}.", row.username, row.food)
        } else if query.contains("email") || query.contains("contact") {
            format!("{}'s email is {}.", row.username, row.contact)
        } else if query.contains("preference") || query.contains("hobb") {
            format!(
                "{}'s preferences are: {}.",
                row.username,
                row.preferences.join(", ")
            )
        } else if self
            .weather_terms()
            .iter()
            .any(|term| query.contains(term.as_str()))
        {
            // "What does Vinay like when it's rainy?"
            format!(
                "{} likes {} when it is {}.",
                row.username, row.food, row.weather
            )
        } else {
            format!(
                "Found user '{}', but couldn't identify which attribute you're asking for.",
                row.username
            )
        };

        LookupReply::new(summary, vec![row.clone()])
    }

    /// Synchronous search core. Pure function of the rows and the query.
    pub fn search(&self, query: &str) -> LookupReply {
        let query = query.to_lowercase();

        if let Some(row) = self
            .rows
            .iter()
            .find(|r| query.contains(&r.username.to_lowercase()))
        {
            return self.user_attribute_reply(row, &query);
        }

        let food_hit = self
            .food_terms()
            .into_iter()
            .find(|term| query.contains(term.as_str()));
        let weather_hit = self
            .weather_terms()
            .into_iter()
            .find(|term| query.contains(term.as_str()));

        match (food_hit, weather_hit) {
            // Conjunction of both criteria, strict AND.
            (Some(food), Some(weather)) => {
                let records: Vec<LookupRecord> = self
                    .rows
                    .iter()
                    .filter(|r| {
                        r.food.to_lowercase().contains(&food)
                            && r.weather.to_lowercase().contains(&weather)
                    })
                    .cloned()
                    .collect();

                if records.is_empty() {
                    return LookupReply::empty(
                        "No user found with that food and weather preference.",
                    );
                }

                let summary = format!(
                    "Users who like {} and prefer {} weather: {}.",
                    food,
                    weather,
                    Self::usernames(&records)
                );
                LookupReply::new(summary, records)
            }

            (Some(food), None) => {
                let records: Vec<LookupRecord> = self
                    .rows
                    .iter()
                    .filter(|r| r.food.to_lowercase().contains(&food))
                    .cloned()
                    .collect();

                if records.is_empty() {
                    return LookupReply::empty(NO_MATCH_SUMMARY);
                }
                let summary =
                    format!("Users who like {}: {}.", food, Self::usernames(&records));
                LookupReply::new(summary, records)
            }

            (None, Some(weather)) => {
                let records: Vec<LookupRecord> = self
                    .rows
                    .iter()
                    .filter(|r| r.weather.to_lowercase().contains(&weather))
                    .cloned()
                    .collect();

                if records.is_empty() {
                    return LookupReply::empty(NO_MATCH_SUMMARY);
                }
                let summary = format!(
                    "Users who prefer {} weather: {}.",
                    weather,
                    Self::usernames(&records)
                );
                LookupReply::new(summary, records)
            }

            (None, None) => self.column_or_preference_reply(&query),
        }
    }

    fn column_or_preference_reply(&self, query: &str) -> LookupReply {
        if query.contains("weather") {
            let listing = self
                .rows
                .iter()
                .map(|r| format!("{}: {}", r.username, r.weather))
                .collect::<Vec<_>>()
                .join("\n");
            return LookupReply::new(listing, self.rows.clone());
        }

        if query.contains("email") || query.contains("contact") {
            let listing = self
                .rows
                .iter()
                .map(|r| format!("{}: {}", r.username, r.contact))
                .collect::<Vec<_>>()
                .join("\n");
            return LookupReply::new(listing, self.rows.clone());
        }

        if let Some(term) = self
            .preference_terms()
            .into_iter()
            .find(|term| query.contains(term.as_str()))
        {
            let records: Vec<LookupRecord> = self
                .rows
                .iter()
                .filter(|r| {
                    r.preferences
                        .iter()
                        .any(|p| p.to_lowercase().contains(&term))
                })
                .cloned()
                .collect();

            if records.is_empty() {
                return LookupReply::empty(NO_MATCH_SUMMARY);
            }
            let summary = format!(
                "Users interested in {}: {}.",
                term,
                Self::usernames(&records)
            );
            return LookupReply::new(summary, records);
        }

        LookupReply::empty(NO_DATA_SUMMARY)
    }
}

#[async_trait]
impl LookupService for UserTable {
    async fn lookup(&self, query: &str) -> Result<LookupReply> {
        let reply = self.search(query);
        tracing::debug!(
            "[UserTable] query '{}' matched {} rows",
            query,
            reply.records.len()
        );
        Ok(reply)
    }
}
