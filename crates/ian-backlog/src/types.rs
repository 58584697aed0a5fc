use serde::{Deserialize, Serialize};

/// Where a captured ticket should ultimately be worked: the Planner FSM,
/// a human operator, an external coding agent, or simple backlog triage
/// with no immediate owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffTarget {
    Planner,
    Human,
    ClaudeCode,
    BacklogTriage,
}

impl std::fmt::Display for HandoffTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planner => write!(f, "planner"),
            Self::Human => write!(f, "human"),
            Self::ClaudeCode => write!(f, "claude_code"),
            Self::BacklogTriage => write!(f, "backlog_triage"),
        }
    }
}

impl std::str::FromStr for HandoffTarget {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planner" => Ok(Self::Planner),
            "human" => Ok(Self::Human),
            "claude_code" => Ok(Self::ClaudeCode),
            "backlog_triage" => Ok(Self::BacklogTriage),
            other => Err(format!("unknown handoff target: {other}")),
        }
    }
}

/// A durable record of an out-of-scope, captured, or handed-off request.
/// `ticket_id` is derived deterministically from the row's insertion
/// ordinal (`IAN-NNNNNN`, zero-padded) rather than assigned randomly, so the
/// sequence is stable and human-referenceable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogTicket {
    pub ticket_id: String,
    pub ordinal: i64,
    pub title: String,
    pub requester: String,
    pub channel: String,
    pub summary: String,
    pub requested_outcome: String,
    pub impact: String,
    pub handoff_target: HandoffTarget,
    pub status: String,
    pub intent: String,
    pub handoff_payload: Option<String>,
    pub linked_plan_files: Vec<String>,
    pub created_at: String,
}
