use thiserror::Error;

/// Top-level error type shared by every crate that does not need a narrower
/// domain-specific enum. Each variant carries a stable `code()` used in the
/// admin `!status`/`!health` surfaces and in audit records.
#[derive(Debug, Error)]
pub enum IanError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },

    #[error("model provider error: {0}")]
    Model(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("budget exceeded: used {used} of {limit}")]
    BudgetExceeded { used: f64, limit: f64 },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl IanError {
    /// Stable short code surfaced in admin commands and audit records.
    pub fn code(&self) -> &'static str {
        match self {
            IanError::Config(_) => "CONFIG_ERROR",
            IanError::Storage(_) => "STORAGE_ERROR",
            IanError::Channel { .. } => "CHANNEL_ERROR",
            IanError::Model(_) => "MODEL_ERROR",
            IanError::Tool(_) => "TOOL_ERROR",
            IanError::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            IanError::PermissionDenied { .. } => "PERMISSION_DENIED",
            IanError::Serialization(_) => "SERIALIZATION_ERROR",
            IanError::Io(_) => "IO_ERROR",
            IanError::Timeout { .. } => "TIMEOUT",
            IanError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, IanError>;
