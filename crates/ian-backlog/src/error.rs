use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("ticket not found: {ticket_id}")]
    NotFound { ticket_id: String },
}

pub type Result<T> = std::result::Result<T, BacklogError>;
