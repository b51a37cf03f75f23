//! Bounded classify→dispatch→tool loop.
//!
//! Information Hiding:
//! - The phase machine and hop accounting are internal; callers see a
//!   single `run` that either completes, reports a handler failure, or
//!   fails with a typed error
//! - Handlers never touch the log directly; every append happens here, at
//!   a synchronous commit point, so a dropped run cannot leave a partially
//!   appended hop

use crate::core::error::RouteError;
use crate::routing::category::{Category, CategorySet};
use crate::routing::classifier::Classifier;
use crate::routing::handler::HandlerResult;
use crate::routing::message::{ConversationState, Message};
use crate::routing::registry::HandlerRegistry;
use crate::tools::registry::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;

const FAILURE_NOTICE: &str = "Sorry, something went wrong while handling your request.";

/// Result of one dispatcher run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The handler produced a terminal reply, appended to the state.
    Completed {
        category: Category,
        reply: String,
        hops: usize,
    },
    /// A handler's external call failed. A standard failure notice was
    /// appended and the underlying error is reported here, never hidden.
    HandlerFailed {
        category: Category,
        notice: String,
        detail: String,
        hops: usize,
    },
    /// No user turn was awaiting a reply; the state is untouched.
    Idle,
}

impl RunOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { reply, .. } => Some(reply),
            RunOutcome::HandlerFailed { notice, .. } => Some(notice),
            RunOutcome::Idle => None,
        }
    }

    pub fn category(&self) -> Option<&Category> {
        match self {
            RunOutcome::Completed { category, .. }
            | RunOutcome::HandlerFailed { category, .. } => Some(category),
            RunOutcome::Idle => None,
        }
    }
}

enum RunPhase {
    Classifying,
    Dispatching { category: Category },
    AwaitingTool {
        category: Category,
        tool: String,
        args: Value,
    },
    Done(RunOutcome),
    Failed(RouteError),
}

pub struct Dispatcher {
    classifier: Arc<dyn Classifier>,
    categories: CategorySet,
    registry: HandlerRegistry,
    tools: ToolRegistry,
    max_hops: usize,
}

impl Dispatcher {
    /// Wires a dispatcher. Fails with a configuration error when the
    /// registry does not cover the category set.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        categories: CategorySet,
        registry: HandlerRegistry,
        tools: ToolRegistry,
        max_hops: usize,
    ) -> Result<Self, RouteError> {
        if max_hops == 0 {
            return Err(RouteError::Configuration(
                "max_hops must be at least 1".to_string(),
            ));
        }
        for category in categories.members() {
            registry.resolve(category)?;
        }

        Ok(Self {
            classifier,
            categories,
            registry,
            tools,
            max_hops,
        })
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub async fn run(&self, state: &mut ConversationState) -> Result<RunOutcome, RouteError> {
        self.run_with_max_hops(state, self.max_hops).await
    }

    /// One full run over the pending user turn. Each handler invocation is
    /// one hop; a handler that keeps requesting tools is cut off at
    /// `max_hops` with a routing-loop error, state preserved up to the last
    /// completed hop.
    pub async fn run_with_max_hops(
        &self,
        state: &mut ConversationState,
        max_hops: usize,
    ) -> Result<RunOutcome, RouteError> {
        let Some(user_turn) = state.pending_user_turn().cloned() else {
            tracing::debug!("[Dispatcher] no user turn awaiting a reply");
            return Ok(RunOutcome::Idle);
        };

        let mut hops = 0usize;
        let mut phase = RunPhase::Classifying;

        loop {
            phase = match phase {
                RunPhase::Classifying => {
                    let category = match self
                        .classifier
                        .classify(&user_turn, &self.categories)
                        .await
                    {
                        Ok(category) => category,
                        Err(RouteError::Classification(detail)) => {
                            let fallback = self.categories.default_category().clone();
                            tracing::warn!(
                                "[Dispatcher] classification failed, falling back to '{}': {}",
                                fallback,
                                detail
                            );
                            fallback
                        }
                        Err(other) => return Err(other),
                    };

                    state.set_current_category(category.clone());
                    tracing::info!("[Dispatcher] routed turn to '{}'", category);
                    RunPhase::Dispatching { category }
                }

                RunPhase::Dispatching { category } => {
                    if hops == max_hops {
                        RunPhase::Failed(RouteError::RoutingLoop { max_hops })
                    } else {
                        hops += 1;
                        let handler = self.registry.resolve(&category)?;
                        match handler.handle(state).await {
                            Ok(HandlerResult::Reply { text, category: reply_category }) => {
                                if !self.categories.contains(&reply_category) {
                                    RunPhase::Failed(RouteError::Configuration(format!(
                                        "handler replied with unknown category '{}'",
                                        reply_category
                                    )))
                                } else {
                                    state.push(Message::assistant(
                                        text.clone(),
                                        reply_category.clone(),
                                    ));
                                    RunPhase::Done(RunOutcome::Completed {
                                        category: reply_category,
                                        reply: text,
                                        hops,
                                    })
                                }
                            }
                            Ok(HandlerResult::ToolCall { tool, args }) => RunPhase::AwaitingTool {
                                category,
                                tool,
                                args,
                            },
                            Err(RouteError::Handler { category: failed, source }) => {
                                tracing::error!(
                                    "[Dispatcher] handler for '{}' failed: {:#}",
                                    failed,
                                    source
                                );
                                state.push(Message::assistant(FAILURE_NOTICE, category.clone()));
                                RunPhase::Done(RunOutcome::HandlerFailed {
                                    category,
                                    notice: FAILURE_NOTICE.to_string(),
                                    detail: source.to_string(),
                                    hops,
                                })
                            }
                            Err(other) => RunPhase::Failed(other),
                        }
                    }
                }

                RunPhase::AwaitingTool {
                    category,
                    tool,
                    args,
                } => match self.invoke_tool(&tool, args).await {
                    Ok(observation) => {
                        state.push(Message::observation(observation, category.clone()));
                        RunPhase::Dispatching { category }
                    }
                    Err(err) => RunPhase::Failed(err),
                },

                RunPhase::Done(outcome) => return Ok(outcome),
                RunPhase::Failed(err) => return Err(err),
            };
        }
    }

    async fn invoke_tool(&self, name: &str, args: Value) -> Result<String, RouteError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| RouteError::ToolInvocation {
                tool: name.to_string(),
                reason: "tool is not registered".to_string(),
            })?;

        tracing::info!("[Dispatcher] invoking tool '{}'", name);

        match tool.execute(args).await {
            Ok(result) if result.success => Ok(result.output),
            Ok(result) => Err(RouteError::ToolInvocation {
                tool: name.to_string(),
                reason: result
                    .error
                    .unwrap_or_else(|| "tool reported failure".to_string()),
            }),
            Err(e) => Err(RouteError::ToolInvocation {
                tool: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
