use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("failed to post approval request: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, ApprovalError>;
