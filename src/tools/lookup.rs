//! Lookup tool: bridges the dispatch loop to the injected lookup service.

use super::{Tool, ToolMetadata, ToolResult};
use crate::lookup::LookupService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const LOOKUP_TOOL_NAME: &str = "user_lookup";

pub struct LookupTool {
    service: Arc<dyn LookupService>,
}

impl LookupTool {
    pub fn new(service: Arc<dyn LookupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for LookupTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: LOOKUP_TOOL_NAME.to_string(),
            description: "Search the user-preference table with a natural language query."
                .to_string(),
        }
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .context("'query' argument is required and must be a string")?;

        let reply = self.service.lookup(query).await?;
        let payload =
            serde_json::to_string(&reply).context("failed to encode lookup reply")?;
        Ok(ToolResult::success(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupReply, UserTable};
    use serde_json::json;

    #[tokio::test]
    async fn executes_a_query_and_returns_structured_output() {
        let tool = LookupTool::new(Arc::new(UserTable::sample()));
        let result = tool
            .execute(json!({"query": "What is Arjun's weather preference?"}))
            .await
            .unwrap();

        assert!(result.success);
        let reply: LookupReply = serde_json::from_str(&result.output).unwrap();
        assert_eq!(reply.summary, "Arjun's weather preference is Snowy.");
    }

    #[tokio::test]
    async fn rejects_missing_query_argument() {
        let tool = LookupTool::new(Arc::new(UserTable::sample()));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("query"));
    }
}
