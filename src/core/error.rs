//! Routing error taxonomy
//!
//! Information Hiding:
//! - Collaborator transport errors are converted to `RouteError` at the
//!   dispatcher boundary; nothing below it leaks raw errors into chat text
//! - Recovery policy (fallback category, failure notices) lives in the
//!   dispatcher, not in the error types

use thiserror::Error;

/// Errors produced by the routing core.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Startup-time wiring mistake. Fatal: the dispatcher refuses to start.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A classifier backend failed or produced a label outside the
    /// configured category set. The dispatcher recovers by falling back to
    /// the default category, with the failure logged.
    #[error("classification failed: {0}")]
    Classification(String),

    /// The hop bound was exceeded. Fatal to the run; conversation state is
    /// preserved up to the last completed hop.
    #[error("routing loop: hop bound of {max_hops} exceeded")]
    RoutingLoop { max_hops: usize },

    /// A handler's external call failed. The dispatcher recovers at run
    /// level with a user-visible failure notice.
    #[error("handler for '{category}' failed: {source}")]
    Handler {
        category: String,
        #[source]
        source: anyhow::Error,
    },

    /// External tool resolution or execution failed. Fatal to the run; the
    /// error is surfaced to the caller, never embedded in a chat message.
    #[error("tool '{tool}' invocation failed: {reason}")]
    ToolInvocation { tool: String, reason: String },
}

impl RouteError {
    pub fn handler(category: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            category: category.into(),
            source,
        }
    }
}
