use serde::{Deserialize, Serialize};

/// A single persisted note, keyed for upsert and tagged for loose
/// categorisation. Full-text searchable over `key`/`content` via the
/// `notes_fts` porter-tokenized index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub key: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
