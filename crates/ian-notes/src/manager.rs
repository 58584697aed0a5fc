use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::{NoteError, Result};
use crate::types::Note;

/// CRUD plus full-text search over the shared `notes`/`notes_fts` tables.
/// `upsert` is modeled as delete-then-insert rather than in-place update —
/// the FTS5 external-content index needs its rowid-keyed entry replaced
/// wholesale on every write, and a note's only identity is its `key`, so
/// there is no cheaper path than "find the old row, remove it, insert anew".
pub struct NoteManager {
    db: Mutex<Connection>,
}

impl NoteManager {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Replace any existing note under `key` with new content/tags.
    pub fn upsert(&self, key: &str, content: &str, tags: &[String]) -> Result<Note> {
        let now = chrono::Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());

        let db = self.db.lock().unwrap();

        let existing_id: Option<i64> = db
            .query_row(
                "SELECT id FROM notes WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .ok();

        if let Some(id) = existing_id {
            sync_fts_delete(&db, id, key)?;
            db.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        }

        db.execute(
            "INSERT INTO notes (key, content, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![key, content, tags_json, now],
        )?;
        let id = db.last_insert_rowid();
        sync_fts_insert(&db, id, key, content)?;

        Ok(Note {
            id,
            key: key.to_string(),
            content: content.to_string(),
            tags: tags.to_vec(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn get(&self, key: &str) -> Result<Note> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, key, content, tags, created_at, updated_at FROM notes WHERE key = ?1",
            [key],
            row_to_note,
        )
        .map_err(|_| NoteError::NotFound {
            key: key.to_string(),
        })
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let id: Option<i64> = db
            .query_row("SELECT id FROM notes WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .ok();
        let Some(id) = id else {
            return Err(NoteError::NotFound {
                key: key.to_string(),
            });
        };
        sync_fts_delete(&db, id, key)?;
        db.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Note>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, key, content, tags, created_at, updated_at FROM notes ORDER BY key ASC",
        )?;
        let rows = stmt.query_map([], row_to_note)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Full-text search across `key` and `content`.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Note>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT n.id, n.key, n.content, n.tags, n.created_at, n.updated_at
             FROM notes n
             JOIN notes_fts f ON n.id = f.rowid
             WHERE notes_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![query, limit as i64], row_to_note)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn sync_fts_delete(db: &Connection, id: i64, key: &str) -> Result<()> {
    let content: String = db
        .query_row("SELECT content FROM notes WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .unwrap_or_default();
    db.execute(
        "INSERT INTO notes_fts(notes_fts, rowid, key, content) VALUES('delete', ?1, ?2, ?3)",
        rusqlite::params![id, key, content],
    )?;
    Ok(())
}

fn sync_fts_insert(db: &Connection, id: i64, key: &str, content: &str) -> Result<()> {
    db.execute(
        "INSERT INTO notes_fts(rowid, key, content) VALUES(?1, ?2, ?3)",
        rusqlite::params![id, key, content],
    )?;
    Ok(())
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    let tags_json: String = row.get(3)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    Ok(Note {
        id: row.get(0)?,
        key: row.get(1)?,
        content: row.get(2)?,
        tags,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ian_storage::open_and_migrate;

    fn fresh_db() -> Connection {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        std::mem::forget(dir);
        open_and_migrate(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn upsert_then_get_roundtrips() {
        let mgr = NoteManager::new(fresh_db());
        mgr.upsert("soul", "be kind", &["persona".to_string()])
            .unwrap();
        let note = mgr.get("soul").unwrap();
        assert_eq!(note.content, "be kind");
        assert_eq!(note.tags, vec!["persona".to_string()]);
    }

    #[test]
    fn upsert_replaces_existing_content() {
        let mgr = NoteManager::new(fresh_db());
        mgr.upsert("soul", "v1", &[]).unwrap();
        mgr.upsert("soul", "v2", &[]).unwrap();
        let note = mgr.get("soul").unwrap();
        assert_eq!(note.content, "v2");
        assert_eq!(mgr.list().unwrap().len(), 1);
    }

    #[test]
    fn search_finds_by_content() {
        let mgr = NoteManager::new(fresh_db());
        mgr.upsert("soul", "be kind to strangers", &[]).unwrap();
        mgr.upsert("other", "unrelated text", &[]).unwrap();
        let found = mgr.search("strangers", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "soul");
    }

    #[test]
    fn delete_removes_the_note() {
        let mgr = NoteManager::new(fresh_db());
        mgr.upsert("soul", "be kind", &[]).unwrap();
        mgr.delete("soul").unwrap();
        assert!(mgr.get("soul").is_err());
    }
}
