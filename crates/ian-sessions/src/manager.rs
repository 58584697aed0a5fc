use std::sync::Mutex;

use chrono::Utc;
use ian_core::types::SessionMetadata;
use rusqlite::{Connection, OptionalExtension};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::types::{Session, Turn, TurnRole, WindowMessage};

/// Per-session token budget below which `get_messages` keeps trimming older
/// turns. A single most-recent turn is always kept even if it alone exceeds
/// the budget.
const DEFAULT_TOKEN_BUDGET: u32 = 12_000;

/// Deterministic, provider-agnostic token estimator: ~4 characters per
/// token. Any fixed function satisfies the windowing contract provided it's
/// applied consistently; this stands in for a real tokenizer.
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}

/// CRUD and windowing over the shared `sessions`/`turns` tables (see
/// `ian-storage`'s migrations). One connection, guarded by a `Mutex`, shared
/// across every worker — WAL mode makes concurrent access from multiple
/// channel workers safe.
pub struct SessionManager {
    db: Mutex<Connection>,
    token_budget: u32,
}

impl SessionManager {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
            token_budget: DEFAULT_TOKEN_BUDGET,
        }
    }

    pub fn with_token_budget(conn: Connection, token_budget: u32) -> Self {
        Self {
            db: Mutex::new(conn),
            token_budget,
        }
    }

    /// Return the active session for `channel_id` (`ended_at IS NULL`),
    /// creating one lazily if none exists. Enforces "at most one active
    /// session per channel" by selecting before inserting under the same
    /// lock.
    #[instrument(skip(self), fields(channel_id))]
    pub fn get_or_create_active(&self, channel_id: &str) -> Result<Session> {
        let db = self.db.lock().unwrap();

        if let Some(session) = Self::query_active(&db, channel_id)? {
            return Ok(session);
        }

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO sessions (id, channel_id, started_at, ended_at, turn_count, summary, metadata)
             VALUES (?1, ?2, ?3, NULL, 0, NULL, '{}')",
            rusqlite::params![id, channel_id, now],
        )?;

        Self::query_active(&db, channel_id)?.ok_or(SessionError::NotFound { id })
    }

    fn query_active(db: &Connection, channel_id: &str) -> Result<Option<Session>> {
        db.query_row(
            "SELECT id, channel_id, started_at, ended_at, turn_count, summary, metadata
             FROM sessions WHERE channel_id = ?1 AND ended_at IS NULL",
            [channel_id],
            row_to_session,
        )
        .optional()
        .map_err(SessionError::Database)
    }

    pub fn get(&self, session_id: &str) -> Result<Session> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, channel_id, started_at, ended_at, turn_count, summary, metadata
             FROM sessions WHERE id = ?1",
            [session_id],
            row_to_session,
        )
        .map_err(|_| SessionError::NotFound {
            id: session_id.to_string(),
        })
    }

    /// End a session (explicit reset or summarization rotation).
    pub fn end_session(&self, session_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE sessions SET ended_at = ?1 WHERE id = ?2",
            rusqlite::params![now, session_id],
        )?;
        Ok(())
    }

    /// Persist a summary onto a session without ending it (callers end it
    /// separately as part of the rotation sequence).
    pub fn set_summary(&self, session_id: &str, summary: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE sessions SET summary = ?1 WHERE id = ?2",
            rusqlite::params![summary, session_id],
        )?;
        Ok(())
    }

    /// Read/write the session's metadata blob atomically under the same
    /// lock used for every other session mutation.
    pub fn get_metadata(&self, session_id: &str) -> Result<SessionMetadata> {
        Ok(self.get(session_id)?.metadata)
    }

    pub fn set_metadata(&self, session_id: &str, metadata: &SessionMetadata) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE sessions SET metadata = ?1 WHERE id = ?2",
            rusqlite::params![metadata.to_json(), session_id],
        )?;
        Ok(())
    }

    /// Append one turn. `turn_count` increments on assistant inserts only,
    /// per the data-model invariant.
    #[instrument(skip(self, content), fields(session_id, role = role.as_str()))]
    pub fn append_turn(
        &self,
        session_id: &str,
        role: TurnRole,
        content: &str,
        model: Option<&str>,
        input_tokens: u32,
        output_tokens: u32,
        cache_written: u32,
        cache_read: u32,
    ) -> Result<Turn> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO turns
             (id, session_id, role, content, model, input_tokens, output_tokens,
              cache_written, cache_read, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            rusqlite::params![
                id,
                session_id,
                role.as_str(),
                content,
                model,
                input_tokens,
                output_tokens,
                cache_written,
                cache_read,
                now
            ],
        )?;

        if role == TurnRole::Assistant {
            db.execute(
                "UPDATE sessions SET turn_count = turn_count + 1 WHERE id = ?1",
                [session_id],
            )?;
        }

        Ok(Turn {
            id,
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            model: model.map(str::to_string),
            input_tokens,
            output_tokens,
            cache_written,
            cache_read,
            created_at: now,
        })
    }

    /// All turns for a session, oldest first — used to render the full
    /// transcript for summarization.
    pub fn all_turns(&self, session_id: &str) -> Result<Vec<Turn>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, session_id, role, content, model, input_tokens, output_tokens,
                    cache_written, cache_read, created_at
             FROM turns WHERE session_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([session_id], row_to_turn)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// The token-counted rolling window: fetch newest-first, accumulate
    /// token counts walking backwards, stop when the next turn would exceed
    /// the session's token budget (always keeping at least the most recent
    /// turn), then reverse to chronological order.
    pub fn get_messages(&self, session_id: &str) -> Result<Vec<WindowMessage>> {
        let newest_first = {
            let db = self.db.lock().unwrap();
            let mut stmt = db.prepare(
                "SELECT id, session_id, role, content, model, input_tokens, output_tokens,
                        cache_written, cache_read, created_at
                 FROM turns WHERE session_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map([session_id], row_to_turn)?;
            rows.filter_map(|r| r.ok()).collect::<Vec<Turn>>()
        };

        let mut kept: Vec<Turn> = Vec::new();
        let mut budget_used: u32 = 0;

        for (idx, turn) in newest_first.into_iter().enumerate() {
            let tokens = estimate_tokens(&turn.content);
            if idx > 0 && budget_used + tokens > self.token_budget {
                break;
            }
            budget_used += tokens;
            kept.push(turn);
        }

        kept.reverse();
        Ok(kept
            .into_iter()
            .map(|t| WindowMessage {
                role: t.role,
                content: t.content,
            })
            .collect())
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let metadata_json: String = row.get(6)?;
    Ok(Session {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        started_at: row.get(2)?,
        ended_at: row.get(3)?,
        turn_count: row.get::<_, i64>(4)? as u32,
        summary: row.get(5)?,
        metadata: SessionMetadata::from_json(&metadata_json),
    })
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let role_str: String = row.get(2)?;
    Ok(Turn {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: role_str.parse().unwrap_or(TurnRole::User),
        content: row.get(3)?,
        model: row.get(4)?,
        input_tokens: row.get::<_, i64>(5)? as u32,
        output_tokens: row.get::<_, i64>(6)? as u32,
        cache_written: row.get::<_, i64>(7)? as u32,
        cache_read: row.get::<_, i64>(8)? as u32,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ian_storage::open_and_migrate;

    fn fresh_db() -> Connection {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        // Leak the tempdir so the file isn't removed before the connection closes.
        std::mem::forget(dir);
        open_and_migrate(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn get_or_create_is_idempotent_per_channel() {
        let mgr = SessionManager::new(fresh_db());
        let s1 = mgr.get_or_create_active("C1").unwrap();
        let s2 = mgr.get_or_create_active("C1").unwrap();
        assert_eq!(s1.id, s2.id);
    }

    #[test]
    fn turn_count_increments_on_assistant_only() {
        let mgr = SessionManager::new(fresh_db());
        let s = mgr.get_or_create_active("C1").unwrap();
        mgr.append_turn(&s.id, TurnRole::User, "hi", None, 1, 0, 0, 0)
            .unwrap();
        mgr.append_turn(&s.id, TurnRole::Assistant, "hello", Some("m"), 1, 1, 0, 0)
            .unwrap();
        let reloaded = mgr.get(&s.id).unwrap();
        assert_eq!(reloaded.turn_count, 1);
    }

    #[test]
    fn get_messages_keeps_at_least_the_newest_turn() {
        let mgr = SessionManager::with_token_budget(fresh_db(), 1);
        let s = mgr.get_or_create_active("C1").unwrap();
        mgr.append_turn(&s.id, TurnRole::User, "a long message here", None, 5, 0, 0, 0)
            .unwrap();
        let msgs = mgr.get_messages(&s.id).unwrap();
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn get_messages_returns_chronological_order() {
        let mgr = SessionManager::new(fresh_db());
        let s = mgr.get_or_create_active("C1").unwrap();
        mgr.append_turn(&s.id, TurnRole::User, "first", None, 1, 0, 0, 0)
            .unwrap();
        mgr.append_turn(&s.id, TurnRole::Assistant, "second", Some("m"), 1, 1, 0, 0)
            .unwrap();
        let msgs = mgr.get_messages(&s.id).unwrap();
        assert_eq!(msgs[0].content, "first");
        assert_eq!(msgs[1].content, "second");
    }

    #[test]
    fn metadata_roundtrips_through_json_column() {
        let mgr = SessionManager::new(fresh_db());
        let s = mgr.get_or_create_active("C1").unwrap();
        let mut meta = SessionMetadata::default();
        meta.persona = Some(ian_core::types::Persona::Brainstormer);
        mgr.set_metadata(&s.id, &meta).unwrap();
        let reloaded = mgr.get_metadata(&s.id).unwrap();
        assert_eq!(reloaded.persona, Some(ian_core::types::Persona::Brainstormer));
    }
}
