//! Tool: filesystem_read — read the contents of a file via the injected backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::ToolBackend;

use super::{Tool, ToolResult};

pub struct FilesystemReadTool {
    backend: Arc<dyn ToolBackend>,
}

impl FilesystemReadTool {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for FilesystemReadTool {
    fn name(&self) -> &str {
        "filesystem_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Optionally limit to a line range with \
         `offset` (1-based first line) and `limit` (number of lines to return)."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file."
                },
                "offset": {
                    "type": "integer",
                    "description": "1-based line number to start reading from (optional)."
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (optional)."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let path = match input.get("path").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return ToolResult::error("missing required parameter: path"),
        };

        let offset = input
            .get("offset")
            .and_then(|v| v.as_u64())
            .map(|v| v.saturating_sub(1) as usize);
        let limit = input.get("limit").and_then(|v| v.as_u64()).map(|v| v as usize);

        match self.backend.read_file(path, offset, limit).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FakeToolBackend;
    use std::collections::HashMap;

    fn backend_with(files: &[(&str, &str)]) -> Arc<dyn ToolBackend> {
        Arc::new(FakeToolBackend {
            files: files.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>(),
        })
    }

    #[tokio::test]
    async fn reads_whole_file() {
        let tool = FilesystemReadTool::new(backend_with(&[("a.txt", "line1\nline2")]));
        let result = tool.execute(serde_json::json!({"path": "a.txt"})).await;
        assert!(!result.is_error);
        assert_eq!(result.content, "line1\nline2");
    }

    #[tokio::test]
    async fn missing_path_is_an_error() {
        let tool = FilesystemReadTool::new(backend_with(&[]));
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn respects_offset_and_limit() {
        let tool = FilesystemReadTool::new(backend_with(&[("a.txt", "l1\nl2\nl3\nl4")]));
        let result = tool
            .execute(serde_json::json!({"path": "a.txt", "offset": 2, "limit": 2}))
            .await;
        assert_eq!(result.content, "l2\nl3");
    }
}
