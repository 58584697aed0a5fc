//! Tool system for the model's tool-use loop.
//!
//! Defines the `Tool` trait all built-in facades implement, plus the
//! registry and loop that drive repeated model/tool round trips.

pub mod filesystem_list;
pub mod filesystem_read;
pub mod filesystem_write;
pub mod shell_run;
pub mod tool_loop;
pub mod web_search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm::ToolDefinition;

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text content returned to the LLM.
    pub content: String,
    /// Whether the tool execution failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique, stable name for this tool (e.g. "filesystem_read").
    fn name(&self) -> &str;
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;
    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;
    /// Whether a human must approve each call before it runs.
    fn requires_approval(&self) -> bool {
        false
    }
    /// Execute the tool with the given input.
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// Static catalog of the built-in tools (name, description) for `/tools`
/// listing — does not require instantiation.
pub fn tool_catalog() -> Vec<(&'static str, &'static str)> {
    vec![
        ("filesystem_read", "Read the contents of a file"),
        ("filesystem_write", "Write content to a file"),
        ("filesystem_list", "List files in a directory"),
        ("shell_run", "Execute a shell command (requires approval)"),
        ("web_search", "Search the web for recent information"),
    ]
}

/// Convert a slice of tools to API-level tool definitions.
pub fn to_definitions(tools: &[Box<dyn Tool>]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}
