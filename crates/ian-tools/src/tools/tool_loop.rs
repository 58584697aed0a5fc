//! The bounded model/tool-use loop: `model.chat → tool_use? → execute →
//! tool_result → model.chat → …`, gated on human approval for destructive
//! tools and on the intent-restricted allow-list for every tool call.
//!
//! Every tool call is audited as `tool_call` before it's resolved (allow-list
//! check, approval gate, then `execute`) and as `tool_result` right after, so
//! the audit log always orders `tool_call` before `tool_result` before the
//! turn's eventual `agent_reply`.
//!
//! Stops when: `stop_reason` is no longer `tool_use`, or `MAX_TOOL_ROUNDS` is
//! reached.

use ian_approval::ApprovalGate;
use ian_audit::{AuditEvent, AuditLogger};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::llm::{ChatRequest, LlmClient, Message, Role, ToolDefinition, Usage};
use crate::prompt::SystemPrompt;
use crate::registry::ToolRegistry;
use crate::LlmError;

use super::{Tool, ToolResult};

/// Bound on the number of model↔tool round trips within a single dispatcher
/// turn.
pub const MAX_TOOL_ROUNDS: usize = 8;

const REJECTED_TEXT: &str = "Tool rejected by user.";

/// Result of running the loop to completion (or exhausting its round
/// budget). `usage` is `None` exactly when the loop hit `MAX_TOOL_ROUNDS`
/// without producing a final non-tool_use response — no budget event is
/// recorded for that case.
#[derive(Debug, Clone)]
pub struct ToolLoopOutcome {
    pub text: String,
    pub model: String,
    pub usage: Option<Usage>,
    pub hit_max_rounds: bool,
}

/// Drive the full tool-use loop for one user turn.
///
/// `allowed` is the intent-restricted tool-name allow-list; both the tool
/// definitions offered to the model and every `tool_use` block returned by
/// it are filtered against this same list, so a hallucinated call to a tool
/// outside the allow-list is blocked rather than executed.
#[allow(clippy::too_many_arguments)]
pub async fn run_with_tools(
    llm: &dyn LlmClient,
    approval_gate: &ApprovalGate,
    registry: &ToolRegistry,
    audit: &AuditLogger,
    channel: &str,
    allowed: &[&str],
    model: &str,
    system_prompt: SystemPrompt,
    initial_messages: &[Message],
    max_tokens: u32,
) -> Result<ToolLoopOutcome, LlmError> {
    let tools = registry.subset(allowed);
    let tool_defs = to_definitions(&tools);

    let mut raw_messages: Vec<Value> = initial_messages
        .iter()
        .map(|m| json!({ "role": role_str(&m.role), "content": m.content }))
        .collect();

    for round in 0..MAX_TOOL_ROUNDS {
        let req = ChatRequest {
            model: model.to_string(),
            system: system_prompt.to_plain_text(),
            system_prompt: Some(system_prompt.clone()),
            messages: Vec::new(),
            max_tokens,
            tools: tool_defs.clone(),
            raw_messages: Some(raw_messages.clone()),
        };

        debug!(round, "tool loop round");
        let response = llm.chat(&req).await?;

        if response.stop_reason != "tool_use" || response.tool_calls.is_empty() {
            info!(round, "tool loop finished — no further tool calls");
            return Ok(ToolLoopOutcome {
                text: response.content,
                model: response.model,
                usage: Some(response.usage),
                hit_max_rounds: false,
            });
        }

        let mut assistant_content: Vec<Value> = Vec::new();
        if !response.content.is_empty() {
            assistant_content.push(json!({ "type": "text", "text": response.content }));
        }
        for call in &response.tool_calls {
            assistant_content.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.input,
            }));
        }
        raw_messages.push(json!({ "role": "assistant", "content": assistant_content }));

        let mut tool_results: Vec<Value> = Vec::new();
        for call in &response.tool_calls {
            audit.record(
                AuditEvent::ToolCall,
                json!({ "channel": channel, "tool": call.name, "input": call.input }),
            );
            let result = resolve_tool_call(registry, approval_gate, allowed, &call.name, &call.input).await;
            audit.record(
                AuditEvent::ToolResult,
                json!({ "channel": channel, "tool": call.name, "is_error": result.is_error, "output": result.content }),
            );
            tool_results.push(json!({
                "type": "tool_result",
                "tool_use_id": call.id,
                "content": result.content,
                "is_error": result.is_error,
            }));
        }
        raw_messages.push(json!({ "role": "user", "content": tool_results }));
    }

    warn!(max_rounds = MAX_TOOL_ROUNDS, "tool loop exhausted its round budget");
    Ok(ToolLoopOutcome {
        text: "(max tool rounds reached)".to_string(),
        model: model.to_string(),
        usage: None,
        hit_max_rounds: true,
    })
}

/// Block calls outside the allow-list, gate approval-requiring tools behind
/// the `ApprovalGate`, and otherwise execute. A missing/unknown tool name is
/// surfaced to the model as an error string rather than failing the loop.
async fn resolve_tool_call(
    registry: &ToolRegistry,
    approval_gate: &ApprovalGate,
    allowed: &[&str],
    name: &str,
    input: &Value,
) -> ToolResult {
    if !allowed.contains(&name) {
        return ToolResult::error(format!("tool '{name}' is not permitted for this request"));
    }

    let Some(tool) = registry.get(name) else {
        return ToolResult::error(format!("unknown tool: {name}"));
    };

    if tool.requires_approval() {
        let approved = approval_gate.request(name, &input.to_string()).await;
        if !approved {
            return ToolResult::error(REJECTED_TEXT);
        }
    }

    tool.execute(input.clone()).await
}

fn to_definitions(tools: &[&dyn Tool]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}

fn role_str(role: &Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}
