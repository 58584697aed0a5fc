//! Tool: filesystem_write — write content to a file via the injected backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::ToolBackend;

use super::{Tool, ToolResult};

pub struct FilesystemWriteTool {
    backend: Arc<dyn ToolBackend>,
}

impl FilesystemWriteTool {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for FilesystemWriteTool {
    fn name(&self) -> &str {
        "filesystem_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates parent directories if they do not exist. \
         Overwrites the file if it already exists."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to write to."
                },
                "content": {
                    "type": "string",
                    "description": "Text content to write into the file."
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let path = match input.get("path").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return ToolResult::error("missing required parameter: path"),
        };
        let content = match input.get("content").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => return ToolResult::error("missing required parameter: content"),
        };

        match self.backend.write_file(path, content).await {
            Ok(msg) => ToolResult::success(msg),
            Err(e) => ToolResult::error(e),
        }
    }
}
