use ian_core::types::SessionMetadata;
use serde::{Deserialize, Serialize};

/// One bounded sequence of turns in a single channel, up to a
/// summarize/reset event. At most one session per channel has `ended_at ==
/// None` at any instant — callers enforce this by always routing new
/// messages through `SessionManager::get_or_create_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub channel_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub turn_count: u32,
    pub summary: Option<String>,
    pub metadata: SessionMetadata,
}

/// Who sent a turn. Incrementing `Session::turn_count` happens on
/// `Assistant` inserts only (see `SessionManager::append_turn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("unknown turn role: {other}")),
        }
    }
}

/// One user or assistant message persisted with token counters. Ordering is
/// `created_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub session_id: String,
    pub role: TurnRole,
    pub content: String,
    pub model: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cache_written: u32,
    pub cache_read: u32,
    pub created_at: String,
}

/// A plain role/content pair ready to hand to an `LlmClient` — the shape the
/// conversation window returns after trimming to the token budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowMessage {
    pub role: TurnRole,
    pub content: String,
}
