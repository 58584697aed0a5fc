use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("model call failed: {0}")]
    Llm(#[from] ian_tools::LlmError),

    #[error("backlog error: {0}")]
    Backlog(#[from] ian_backlog::BacklogError),
}

pub type Result<T> = std::result::Result<T, PersonaError>;
