use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a session row (UUIDv7 — time-sortable for log correlation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Channel identifier as used by the chat platform (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Whether a channel is the single control channel (owner, admin commands
/// allowed) or a client channel (external users, admin commands suppressed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Control,
    Client,
}

impl ChannelKind {
    pub fn is_control(&self) -> bool {
        matches!(self, ChannelKind::Control)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Control => write!(f, "control"),
            ChannelKind::Client => write!(f, "client"),
        }
    }
}

/// Per-connection/per-request identifier (random UUID, never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single message observed on a chat platform, normalized across whatever
/// transport the `ChatPlatform` implementation actually speaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub ts: String,
    pub user: String,
    pub text: String,
    pub channel: ChannelId,
    pub thread_ts: Option<String>,
    pub subtype: Option<MessageSubtype>,
}

/// Subtypes that must be dropped by the poller rather than dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    BotMessage,
    MessageChanged,
    MessageDeleted,
    ChannelJoin,
}

/// Dispatch role selecting a system prompt + state machine + tool allow-list.
/// Shared between `ian-sessions` (persisted in session metadata) and
/// `ian-persona` (which decides it) so neither crate depends on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Brainstormer,
    Planner,
    General,
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::Brainstormer => write!(f, "brainstormer"),
            Persona::Planner => write!(f, "planner"),
            Persona::General => write!(f, "general"),
        }
    }
}

/// Brainstormer FSM states. `TicketCreated` is the sole terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainstormState {
    Ideation,
    Refinement,
    Synthesis,
    Approved,
    TicketCreated,
}

impl BrainstormState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BrainstormState::TicketCreated)
    }
}

/// Planner FSM states. `PlanCreated` is the sole terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerState {
    Planning,
    PlanCreated,
}

impl PlannerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlannerState::PlanCreated)
    }
}

/// Structured, per-session blob. Only fields relevant to the active persona
/// are populated; everything else stays `None`. Serialized into the
/// `sessions.metadata` JSON column — parsing failures degrade to
/// `SessionMetadata::default()` ("no active persona") rather than panicking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub persona: Option<Persona>,
    pub brainstorm_state: Option<BrainstormState>,
    pub planner_state: Option<PlannerState>,
    pub raw_idea: Option<String>,
    pub refined_idea: Option<String>,
    pub synthesis_text: Option<String>,
    pub task_title_hint: Option<String>,
    pub ticket_id: Option<String>,
}

impl SessionMetadata {
    /// Parse a JSON blob, degrading to the empty/no-persona default on any
    /// malformed input instead of propagating an error up into dispatch.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
