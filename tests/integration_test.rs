//! Integration tests for the routing core.
//!
//! Everything runs against an injected in-memory table: no network, no
//! API keys.

use async_trait::async_trait;
use snackroute::agents::{self, lookup::LookupHandler};
use snackroute::lookup::{self, LookupRecord, UserTable};
use snackroute::routing::registry::RegistryBuilder;
use snackroute::tools::lookup::LookupTool;
use snackroute::tools::registry::ToolRegistry;
use snackroute::tools::{Tool, ToolMetadata, ToolResult};
use snackroute::{
    api, Category, CategorySet, Classifier, ConversationState, Dispatcher, Handler,
    HandlerResult, Message, Role, RouteError, RuleClassifier, RunOutcome,
};
use std::sync::Arc;

fn row(username: &str, contact: &str, prefs: &str, weather: &str, food: &str) -> LookupRecord {
    LookupRecord {
        username: username.to_string(),
        contact: contact.to_string(),
        preferences: prefs.split(", ").map(str::to_string).collect(),
        weather: weather.to_string(),
        food: food.to_string(),
    }
}

struct EchoHandler {
    category: Category,
}

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, _state: &ConversationState) -> Result<HandlerResult, RouteError> {
        Ok(HandlerResult::reply("echo", self.category.clone()))
    }
}

struct AlwaysToolHandler;

#[async_trait]
impl Handler for AlwaysToolHandler {
    async fn handle(&self, _state: &ConversationState) -> Result<HandlerResult, RouteError> {
        Ok(HandlerResult::tool_call(
            "user_lookup",
            serde_json::json!({"query": "anything"}),
        ))
    }
}

struct FailingHandler {
    category: Category,
}

#[async_trait]
impl Handler for FailingHandler {
    async fn handle(&self, _state: &ConversationState) -> Result<HandlerResult, RouteError> {
        Err(RouteError::handler(
            self.category.name(),
            anyhow::anyhow!("backend exploded"),
        ))
    }
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "user_lookup".to_string(),
            description: "always fails".to_string(),
        }
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        anyhow::bail!("table is on fire")
    }
}

struct RejectingClassifier;

#[async_trait]
impl Classifier for RejectingClassifier {
    async fn classify(
        &self,
        _message: &Message,
        _categories: &CategorySet,
    ) -> Result<Category, RouteError> {
        Err(RouteError::Classification(
            "backend returned garbage".to_string(),
        ))
    }
}

fn single_category_dispatcher(
    handler: Arc<dyn Handler>,
    tools: ToolRegistry,
    max_hops: usize,
) -> Dispatcher {
    let categories = CategorySet::new(["only"], "only").unwrap();
    let classifier = RuleClassifier::builder().build(&categories).unwrap();
    let registry = RegistryBuilder::new()
        .register("only", handler)
        .build(&categories)
        .unwrap();
    Dispatcher::new(Arc::new(classifier), categories, registry, tools, max_hops).unwrap()
}

#[test]
fn construction_fails_when_a_category_lacks_a_handler() {
    let categories = CategorySet::new(["covered", "uncovered"], "covered").unwrap();
    let err = RegistryBuilder::new()
        .register(
            "covered",
            Arc::new(EchoHandler {
                category: Category::new("covered"),
            }),
        )
        .build(&categories)
        .unwrap_err();

    assert!(matches!(err, RouteError::Configuration(_)));
    assert!(err.to_string().contains("uncovered"));
}

#[tokio::test]
async fn classify_is_total_and_deterministic() {
    let categories = CategorySet::new(["food", "logical"], "logical").unwrap();
    let classifier = RuleClassifier::builder()
        .rule(["pizza", "hungry"], "food")
        .build(&categories)
        .unwrap();

    for content in ["pizza!", "HUNGRY", "unrelated noise", ""] {
        let message = Message::user(content);
        let first = classifier.classify(&message, &categories).await.unwrap();
        let second = classifier.classify(&message, &categories).await.unwrap();
        assert!(categories.contains(&first));
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn rerunning_a_terminal_state_is_a_noop() {
    let dispatcher = agents::lookup_assistant(Arc::new(UserTable::sample()), 10).unwrap();

    let mut state = ConversationState::new();
    state.push_user("Who likes pizza?");
    let first = dispatcher.run(&mut state).await.unwrap();
    assert!(matches!(first, RunOutcome::Completed { .. }));

    let len_after_first = state.len();
    let second = dispatcher.run(&mut state).await.unwrap();
    assert!(matches!(second, RunOutcome::Idle));
    assert_eq!(state.len(), len_after_first);
}

#[tokio::test]
async fn hop_bound_fails_with_routing_loop_error() {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(LookupTool::new(Arc::new(UserTable::sample()))));
    let dispatcher = single_category_dispatcher(Arc::new(AlwaysToolHandler), tools, 3);

    let mut state = ConversationState::new();
    state.push_user("loop forever");

    let err = dispatcher.run(&mut state).await.unwrap_err();
    assert!(matches!(err, RouteError::RoutingLoop { max_hops: 3 }));

    // State preserved up to the last completed hop: the user turn plus one
    // observation per completed tool call, no assistant reply.
    let roles: Vec<Role> = state.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles[0], Role::User);
    assert_eq!(state.messages().len(), 4);
    assert!(state
        .messages()
        .iter()
        .all(|m| m.role != Role::Assistant));
}

#[tokio::test]
async fn successful_runs_never_rewrite_history() {
    let dispatcher = agents::lookup_assistant(Arc::new(UserTable::sample()), 10).unwrap();

    let mut state = ConversationState::new();
    state.push_user("Who likes pizza?");
    dispatcher.run(&mut state).await.unwrap();

    let prefix: Vec<(Role, String)> = state
        .messages()
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect();

    state.push_user("What is Arjun's weather preference?");
    dispatcher.run(&mut state).await.unwrap();

    assert!(state.len() > prefix.len());
    for (message, (role, content)) in state.messages().iter().zip(prefix.iter()) {
        assert_eq!(message.role, *role);
        assert_eq!(&message.content, content);
    }
}

#[tokio::test]
async fn scenario_pizza_lookup_names_the_matching_user() {
    let table = UserTable::new(vec![row(
        "Arjun",
        "arjun@email.com",
        "Running, Chess",
        "Snowy",
        "Pizza",
    )]);

    let report = api::route_query_with_service(Arc::new(table), "Who likes pizza?", 10)
        .await
        .unwrap();

    assert!(report.reply.contains("Arjun"));
    assert_eq!(report.contact.as_deref(), Some("arjun@email.com"));
    assert_eq!(report.category, "food-query");
}

#[tokio::test]
async fn scenario_weather_preference_summary() {
    let dispatcher = agents::lookup_assistant(Arc::new(UserTable::sample()), 10).unwrap();

    let mut state = ConversationState::new();
    state.push_user("What is Arjun's weather preference?");

    let outcome = dispatcher.run(&mut state).await.unwrap();
    match outcome {
        RunOutcome::Completed {
            category,
            reply,
            hops,
        } => {
            assert_eq!(reply, "Arjun's weather preference is Snowy.");
            assert_eq!(category.name(), "weather-query");
            assert_eq!(hops, 2);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn scenario_unmatched_query_uses_the_default_category() {
    let dispatcher = agents::lookup_assistant(Arc::new(UserTable::sample()), 10).unwrap();

    let mut state = ConversationState::new();
    state.push_user("zzz qqq");

    let outcome = dispatcher.run(&mut state).await.unwrap();
    match outcome {
        RunOutcome::Completed { category, reply, .. } => {
            assert_eq!(category.name(), "general-query");
            assert_eq!(reply, "I couldn't find relevant data for your query.");
        }
        other => panic!("expected completion, got {:?}", other),
    }

    let lookup_reply = lookup::latest_reply(&state).unwrap();
    assert!(lookup_reply.records.is_empty());
    assert!(lookup_reply.contact.is_none());
}

#[tokio::test]
async fn scenario_combined_criteria_use_strict_and_semantics() {
    let table = UserTable::new(vec![
        row("Asha", "asha@email.com", "Reading", "Sunny", "Pizza"),
        row("Bilal", "bilal@email.com", "Gaming", "Rainy", "Pizza"),
        row("Chitra", "chitra@email.com", "Chess", "Sunny", "Pasta"),
    ]);

    let report = api::route_query_with_service(
        Arc::new(table),
        "Who likes pizza when it is sunny?",
        10,
    )
    .await
    .unwrap();

    assert_eq!(report.category, "combo-query");
    assert!(report.reply.contains("Asha"));
    assert!(!report.reply.contains("Bilal"));
    assert!(!report.reply.contains("Chitra"));
    assert_eq!(report.contact.as_deref(), Some("asha@email.com"));
}

#[tokio::test]
async fn tool_failure_is_fatal_and_leaves_no_partial_hop() {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(FailingTool));
    let dispatcher = single_category_dispatcher(
        Arc::new(LookupHandler::new(Category::new("only"))),
        tools,
        10,
    );

    let mut state = ConversationState::new();
    state.push_user("Who likes pizza?");

    let err = dispatcher.run(&mut state).await.unwrap_err();
    match err {
        RouteError::ToolInvocation { tool, reason } => {
            assert_eq!(tool, "user_lookup");
            assert!(reason.contains("on fire"));
        }
        other => panic!("expected tool invocation error, got {:?}", other),
    }

    // The failed hop appended nothing.
    assert_eq!(state.len(), 1);
    assert_eq!(state.messages()[0].role, Role::User);
}

#[tokio::test]
async fn unknown_tool_is_a_tool_invocation_error() {
    struct UnknownToolHandler;

    #[async_trait]
    impl Handler for UnknownToolHandler {
        async fn handle(
            &self,
            _state: &ConversationState,
        ) -> Result<HandlerResult, RouteError> {
            Ok(HandlerResult::tool_call("nope", serde_json::json!({})))
        }
    }

    let dispatcher =
        single_category_dispatcher(Arc::new(UnknownToolHandler), ToolRegistry::new(), 10);

    let mut state = ConversationState::new();
    state.push_user("anything");

    let err = dispatcher.run(&mut state).await.unwrap_err();
    assert!(matches!(err, RouteError::ToolInvocation { .. }));
}

#[tokio::test]
async fn classification_failure_falls_back_to_the_default_category() {
    let categories = CategorySet::new(["special", "fallback"], "fallback").unwrap();
    let registry = RegistryBuilder::new()
        .register(
            "special",
            Arc::new(EchoHandler {
                category: Category::new("special"),
            }),
        )
        .register(
            "fallback",
            Arc::new(EchoHandler {
                category: Category::new("fallback"),
            }),
        )
        .build(&categories)
        .unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(RejectingClassifier),
        categories,
        registry,
        ToolRegistry::new(),
        10,
    )
    .unwrap();

    let mut state = ConversationState::new();
    state.push_user("whatever");

    let outcome = dispatcher.run(&mut state).await.unwrap();
    match outcome {
        RunOutcome::Completed { category, .. } => assert_eq!(category.name(), "fallback"),
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn handler_failure_appends_a_notice_and_reports_the_detail() {
    let dispatcher = single_category_dispatcher(
        Arc::new(FailingHandler {
            category: Category::new("only"),
        }),
        ToolRegistry::new(),
        10,
    );

    let mut state = ConversationState::new();
    state.push_user("trigger the failure");

    let outcome = dispatcher.run(&mut state).await.unwrap();
    match outcome {
        RunOutcome::HandlerFailed { notice, detail, .. } => {
            assert!(detail.contains("backend exploded"));
            let last = state.messages().last().unwrap();
            assert_eq!(last.role, Role::Assistant);
            assert_eq!(last.content, notice);
        }
        other => panic!("expected a handler failure, got {:?}", other),
    }
}
