//! Simple async API facade
//!
//! Thin convenience layer over the routing core: one-shot lookup routing,
//! persistent multi-turn sessions, and batch routing over independent
//! queries.

use crate::agents;
use crate::config::Settings;
use crate::lookup::{self, LookupService, UserTable};
use crate::routing::dispatcher::RunOutcome;
use crate::routing::message::ConversationState;
use anyhow::Result;
use std::sync::Arc;

/// Caller-facing view of one routed turn.
#[derive(Debug, Clone)]
pub struct RouteReport {
    pub query: String,
    pub reply: String,
    pub category: String,
    pub hops: usize,
    /// Contact identifier when the turn's lookup matched exactly one record.
    pub contact: Option<String>,
    /// Set when the handler failed and `reply` is the standard notice.
    pub failure: Option<String>,
}

impl RouteReport {
    fn from_outcome(
        query: impl Into<String>,
        outcome: RunOutcome,
        state: &ConversationState,
    ) -> Result<Self> {
        let query = query.into();
        match outcome {
            RunOutcome::Completed {
                category,
                reply,
                hops,
            } => Ok(Self {
                query,
                reply,
                category: category.name().to_string(),
                hops,
                contact: lookup::latest_reply(state).and_then(|r| r.contact),
                failure: None,
            }),
            RunOutcome::HandlerFailed {
                category,
                notice,
                detail,
                hops,
            } => Ok(Self {
                query,
                reply: notice,
                category: category.name().to_string(),
                hops,
                contact: None,
                failure: Some(detail),
            }),
            RunOutcome::Idle => anyhow::bail!("no user turn awaiting a reply"),
        }
    }
}

/// Route a single query through the lookup assistant over the built-in
/// sample table.
///
/// # Example
/// ```no_run
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let report = snackroute::route_query("Who likes pizza?").await?;
///     println!("[{}] {}", report.category, report.reply);
///     Ok(())
/// }
/// ```
pub async fn route_query(query: impl Into<String>) -> Result<RouteReport> {
    let settings = Settings::new()?;
    route_query_with_service(
        Arc::new(UserTable::sample()),
        query,
        settings.routing.max_hops,
    )
    .await
}

/// Route a single query against an injected lookup service.
pub async fn route_query_with_service(
    service: Arc<dyn LookupService>,
    query: impl Into<String>,
    max_hops: usize,
) -> Result<RouteReport> {
    let query = query.into();
    let dispatcher = agents::lookup_assistant(service, max_hops)?;

    let mut state = ConversationState::new();
    state.push_user(query.clone());

    let outcome = dispatcher.run(&mut state).await?;
    RouteReport::from_outcome(query, outcome, &state)
}

/// Batch routing over independent queries.
pub mod batch {
    use super::*;
    use futures::stream::{self, StreamExt};

    /// Each query gets its own conversation; results arrive in completion
    /// order.
    pub async fn route_queries(
        service: Arc<dyn LookupService>,
        queries: Vec<String>,
        concurrency: usize,
        max_hops: usize,
    ) -> Vec<Result<RouteReport>> {
        stream::iter(queries)
            .map(|query| {
                let service = Arc::clone(&service);
                async move { route_query_with_service(service, query, max_hops).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}

/// Persistent multi-turn conversations with the chat assistant.
pub mod session {
    use super::*;
    use crate::routing::dispatcher::Dispatcher;
    use crate::storage::filesystem::FileSystemStorage;
    use crate::storage::memory::InMemoryStorage;
    use crate::storage::ConversationStorage;
    use std::path::PathBuf;

    /// Storage backend for a session.
    pub enum StorageType {
        /// Lost when the process terminates.
        Memory,
        /// One JSON file per session under the given directory.
        FileSystem(PathBuf),
    }

    /// Create a session over the chat assistant. Existing history is
    /// resumed from storage.
    pub async fn create_session(
        session_id: impl Into<String>,
        storage_type: StorageType,
        use_llm_classifier: bool,
    ) -> Result<Session> {
        let settings = Settings::new()?;
        let api_key = Settings::api_key()?;
        let dispatcher = agents::chat_assistant(&settings, api_key, use_llm_classifier)?;
        create_session_with_dispatcher(session_id, storage_type, dispatcher).await
    }

    /// Create a session over a caller-wired dispatcher.
    pub async fn create_session_with_dispatcher(
        session_id: impl Into<String>,
        storage_type: StorageType,
        dispatcher: Dispatcher,
    ) -> Result<Session> {
        let session_id = session_id.into();
        let storage: Arc<dyn ConversationStorage> = match storage_type {
            StorageType::Memory => Arc::new(InMemoryStorage::new()),
            StorageType::FileSystem(path) => Arc::new(FileSystemStorage::new(path).await?),
        };

        let history = storage.load(&session_id).await?;
        let state = ConversationState::from_messages(history);

        Ok(Session {
            session_id,
            dispatcher,
            storage,
            state,
        })
    }

    pub struct Session {
        session_id: String,
        dispatcher: Dispatcher,
        storage: Arc<dyn ConversationStorage>,
        state: ConversationState,
    }

    impl Session {
        /// Route one user turn and persist the updated log. On a failed
        /// run the log is still persisted up to the last completed hop.
        pub async fn send_message(&mut self, message: &str) -> Result<RouteReport> {
            self.state.push_user(message);

            let run = self.dispatcher.run(&mut self.state).await;
            self.storage
                .save(&self.session_id, self.state.messages())
                .await?;

            RouteReport::from_outcome(message, run?, &self.state)
        }

        pub async fn clear_history(&mut self) -> Result<()> {
            self.storage.delete(&self.session_id).await?;
            self.state = ConversationState::new();
            Ok(())
        }

        pub fn session_id(&self) -> &str {
            &self.session_id
        }

        pub fn message_count(&self) -> usize {
            self.state.len()
        }
    }
}
