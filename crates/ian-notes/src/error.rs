use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("note not found: {key}")]
    NotFound { key: String },
}

pub type Result<T> = std::result::Result<T, NoteError>;
