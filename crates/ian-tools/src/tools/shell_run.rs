//! Tool: shell_run — one-shot shell command via the injected backend.
//!
//! Requires human approval before every call; the tool-use loop is
//! responsible for gating execution on an `ApprovalGate` decision.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::ToolBackend;

use super::{Tool, ToolResult};

pub struct ShellRunTool {
    backend: Arc<dyn ToolBackend>,
}

impl ShellRunTool {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ShellRunTool {
    fn name(&self) -> &str {
        "shell_run"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its combined stdout/stderr. \
         Every call requires explicit owner approval before it runs."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute via sh -c."
                }
            },
            "required": ["command"]
        })
    }

    fn requires_approval(&self) -> bool {
        true
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let command = match input.get("command").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => return ToolResult::error("missing required parameter: command"),
        };

        match self.backend.run_shell(command).await {
            Ok(output) => ToolResult::success(output),
            Err(e) => ToolResult::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FakeToolBackend;
    use std::collections::HashMap;

    #[test]
    fn always_requires_approval() {
        let tool = ShellRunTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        assert!(tool.requires_approval());
    }

    #[tokio::test]
    async fn runs_and_returns_backend_output() {
        let tool = ShellRunTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool.execute(serde_json::json!({"command": "ls"})).await;
        assert!(!result.is_error);
        assert!(result.content.contains("ls"));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let tool = ShellRunTool::new(Arc::new(FakeToolBackend { files: HashMap::new() }));
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_error);
    }
}
