use thiserror::Error;

/// Errors surfaced by a `ChatPlatform` implementation or the poller/worker
/// pool built on top of it.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("platform request failed: {0}")]
    Platform(String),

    /// The platform asked us to back off; `retry_after_secs` comes straight
    /// from its response when available.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
