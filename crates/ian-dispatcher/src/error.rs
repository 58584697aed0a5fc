use thiserror::Error;

/// Errors a dispatch pass can hit. Every variant is recovered inside
/// `Dispatcher::handle` with an error reply into the originating channel —
/// `ian_channels::MessageHandler::handle` has no `Result` in its signature,
/// so nothing here is allowed to propagate past the worker.
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("session error: {0}")]
    Session(#[from] ian_sessions::SessionError),

    #[error("backlog error: {0}")]
    Backlog(#[from] ian_backlog::BacklogError),

    #[error("budget error: {0}")]
    Budget(#[from] ian_budget::BudgetError),

    #[error("model call failed: {0}")]
    Llm(#[from] ian_tools::LlmError),

    #[error("persona error: {0}")]
    Persona(#[from] ian_persona::PersonaError),

    #[error("channel error: {0}")]
    Channel(#[from] ian_channels::ChannelError),
}

pub type Result<T> = std::result::Result<T, DispatcherError>;
