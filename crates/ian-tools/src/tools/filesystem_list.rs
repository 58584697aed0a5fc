//! Tool: filesystem_list — list directory contents via the injected backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::ToolBackend;

use super::{Tool, ToolResult};

pub struct FilesystemListTool {
    backend: Arc<dyn ToolBackend>,
}

impl FilesystemListTool {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for FilesystemListTool {
    fn name(&self) -> &str {
        "filesystem_list"
    }

    fn description(&self) -> &str {
        "List the contents of a directory. Each entry shows its type (file/dir) \
         and size in bytes."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the directory."
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

        match self.backend.list_files(path).await {
            Ok(listing) => ToolResult::success(listing),
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
    async fn lists_entries_under_path() {
        let files: HashMap<String, String> =
            [("dir/a.txt".to_string(), "x".to_string()), ("dir/b.txt".to_string(), "y".to_string())]
                .into_iter()
                .collect();
        let tool = FilesystemListTool::new(Arc::new(FakeToolBackend { files }));
        let result = tool.execute(serde_json::json!({"path": "dir/"})).await;
        assert!(!result.is_error);
        assert!(result.content.contains("a.txt"));
        assert!(result.content.contains("b.txt"));
    }

    #[tokio::test]
    async fn missing_path_is_an_error() {
        let tool = FilesystemListTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_error);
    }
}
