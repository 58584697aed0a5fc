//! Tool catalog, execution facades, and the model/tool-use loop.
//!
//! `backend` is the injected collaborator that actually touches the
//! filesystem/shell/network; `tools` holds the thin `Tool` facades that
//! carry name/schema/`requires_approval` and delegate to it; `registry`
//! enforces name uniqueness and serves intent-filtered subsets; `llm`
//! defines the model request/response shapes; `tools::tool_loop` drives the
//! bounded model↔tool round trip with human approval in the middle.

pub mod backend;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod registry;
pub mod tools;

pub use backend::ToolBackend;
pub use error::LlmError;
pub use llm::{ChatRequest, ChatResponse, LlmClient, Message, Role, ToolCall, ToolDefinition, Usage};
pub use prompt::{build_planner_context, general_static_tier, SessionInfo, SystemPrompt};
pub use registry::ToolRegistry;
pub use tools::tool_loop::{run_with_tools, ToolLoopOutcome};
pub use tools::{Tool, ToolResult};
