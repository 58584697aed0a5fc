//! Tool: web_search — query an external search provider via the injected backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::ToolBackend;

use super::{Tool, ToolResult};

const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_MAX_RESULTS: usize = 20;

pub struct WebSearchTool {
    backend: Arc<dyn ToolBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for recent or external information. Returns a short \
         list of results (title, url, snippet)."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default 5, capped at 20)."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("missing required parameter: query"),
        };

        let max_results = input
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .min(MAX_MAX_RESULTS);

        match self.backend.web_search(query, max_results).await {
            Ok(results) => ToolResult::success(results),
            Err(e) => ToolResult::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FakeToolBackend;
    use std::collections::HashMap;

    #[tokio::test]
    async fn defaults_max_results_to_five() {
        let tool = WebSearchTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool.execute(serde_json::json!({"query": "rust async"})).await;
        assert!(!result.is_error);
        assert!(result.content.starts_with("5 results"));
    }

    #[tokio::test]
    async fn caps_max_results_at_twenty() {
        let tool = WebSearchTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool
            .execute(serde_json::json!({"query": "rust async", "max_results": 500}))
            .await;
        assert!(result.content.starts_with("20 results"));
    }

    #[tokio::test]
    async fn missing_query_is_an_error() {
        let tool = WebSearchTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_error);
    }
}
