use serde::{Deserialize, Serialize};

/// Closed set of events the audit log records. Mirrors the spirit of a
/// hook-event vocabulary: every consequential thing the dispatcher does has
/// exactly one event kind, never a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    UserMessage,
    AgentReply,
    ToolCall,
    ToolResult,
    ModelSelected,
    PolicyDecision,
    CacheMetrics,
    CostEvent,
    Heartbeat,
    Error,
    Startup,
    Shutdown,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEvent::UserMessage => "user_message",
            AuditEvent::AgentReply => "agent_reply",
            AuditEvent::ToolCall => "tool_call",
            AuditEvent::ToolResult => "tool_result",
            AuditEvent::ModelSelected => "model_selected",
            AuditEvent::PolicyDecision => "policy_decision",
            AuditEvent::CacheMetrics => "cache_metrics",
            AuditEvent::CostEvent => "cost_event",
            AuditEvent::Heartbeat => "heartbeat",
            AuditEvent::Error => "error",
            AuditEvent::Startup => "startup",
            AuditEvent::Shutdown => "shutdown",
        }
    }
}

/// One line written to the day's audit file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub ts: String,
    pub event: String,
    #[serde(flatten)]
    pub fields: serde_json::Value,
}
