use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StorageError};

/// One forward-only schema change. Migrations never rewrite history; a later
/// migration can add columns or tables but an applied migration's SQL is
/// never edited once shipped.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// The full, ordered migration set for the shared database. Every component
/// (sessions, turns, budget ledger, backlog tickets, notes) shares one file
/// and one `schema_version` table rather than each crate running its own
/// `CREATE TABLE IF NOT EXISTS` independently.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "sessions_and_turns",
        sql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id              TEXT PRIMARY KEY,
                channel_id      TEXT NOT NULL,
                started_at      TEXT NOT NULL,
                ended_at        TEXT,
                turn_count      INTEGER NOT NULL DEFAULT 0,
                summary         TEXT,
                metadata        TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_channel_active
                ON sessions(channel_id, ended_at);

            CREATE TABLE IF NOT EXISTS turns (
                id              TEXT PRIMARY KEY,
                session_id      TEXT NOT NULL REFERENCES sessions(id),
                role            TEXT NOT NULL,
                content         TEXT NOT NULL,
                model           TEXT,
                input_tokens    INTEGER NOT NULL DEFAULT 0,
                output_tokens   INTEGER NOT NULL DEFAULT 0,
                cache_written   INTEGER NOT NULL DEFAULT 0,
                cache_read      INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_turns_session_created
                ON turns(session_id, created_at);
        "#,
    },
    Migration {
        version: 2,
        name: "budget_events",
        sql: r#"
            CREATE TABLE IF NOT EXISTS budget_events (
                id              TEXT PRIMARY KEY,
                model           TEXT NOT NULL,
                input_tokens    INTEGER NOT NULL,
                output_tokens   INTEGER NOT NULL,
                cache_written   INTEGER NOT NULL DEFAULT 0,
                cache_read      INTEGER NOT NULL DEFAULT 0,
                cost_usd        REAL NOT NULL,
                created_at      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_budget_events_created
                ON budget_events(created_at);
        "#,
    },
    Migration {
        version: 3,
        name: "backlog_tickets",
        sql: r#"
            CREATE TABLE IF NOT EXISTS backlog_tickets (
                ticket_id           TEXT PRIMARY KEY,
                ordinal             INTEGER NOT NULL,
                title               TEXT NOT NULL,
                requester           TEXT NOT NULL,
                channel             TEXT NOT NULL,
                summary             TEXT NOT NULL,
                requested_outcome   TEXT NOT NULL,
                impact              TEXT NOT NULL,
                handoff_target      TEXT NOT NULL,
                status              TEXT NOT NULL,
                intent              TEXT NOT NULL,
                handoff_payload     TEXT,
                linked_plan_files   TEXT NOT NULL DEFAULT '[]',
                created_at          TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ticket_ordinal_counter (
                id      INTEGER PRIMARY KEY CHECK (id = 1),
                next    INTEGER NOT NULL
            );
            INSERT OR IGNORE INTO ticket_ordinal_counter (id, next) VALUES (1, 1);
        "#,
    },
    Migration {
        version: 4,
        name: "notes_fts",
        sql: r#"
            CREATE TABLE IF NOT EXISTS notes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                key         TEXT NOT NULL UNIQUE,
                content     TEXT NOT NULL,
                tags        TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
                key, content,
                content='notes',
                content_rowid='id',
                tokenize='porter'
            );
        "#,
    },
    Migration {
        version: 5,
        name: "scheduler_jobs",
        sql: r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                schedule    TEXT NOT NULL,
                action      TEXT NOT NULL,
                status      TEXT NOT NULL,
                last_run    TEXT,
                next_run    TEXT,
                run_count   INTEGER NOT NULL DEFAULT 0,
                max_runs    INTEGER,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
        "#,
    },
];

/// Open the database file at `path`, enabling WAL journaling and foreign-key
/// enforcement, and apply every migration that has not yet been recorded in
/// `schema_version`. Returns an error rather than limping along with a stale
/// schema; the caller (`main`) treats this as fatal.
pub fn open_and_migrate(path: &str) -> Result<Connection> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Migration {
                version: 0,
                name: "mkdir",
                reason: e.to_string(),
            })?;
        }
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY, name TEXT NOT NULL, applied_at TEXT NOT NULL);",
    )?;

    let applied: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= applied {
            continue;
        }
        conn.execute_batch(migration.sql).map_err(|e| StorageError::Migration {
            version: migration.version,
            name: migration.name,
            reason: e.to_string(),
        })?;
        conn.execute(
            "INSERT INTO schema_version (version, name, applied_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![migration.version, migration.name],
        )?;
        info!(version = migration.version, name = migration.name, "migration applied");
    }

    Ok(conn)
}

/// Open an additional connection to an already-migrated database file.
///
/// Each higher-level component (sessions, budget, backlog, notes, scheduler)
/// opens its own connection to the same WAL-mode file rather than sharing one
/// `Connection` behind a single lock, matching the multi-connection pattern
/// the scheduler engine and its handle already use against one jobs table.
pub fn open_existing(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Re-applying the full set against an already-migrated connection is a
/// no-op: every statement is `IF NOT EXISTS` and the version gate above skips
/// migrations whose version is already recorded.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        let path_str = path.to_str().unwrap();

        open_and_migrate(path_str).unwrap();
        let conn = open_and_migrate(path_str).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn creates_expected_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        let conn = open_and_migrate(path.to_str().unwrap()).unwrap();

        for table in ["sessions", "turns", "budget_events", "backlog_tickets", "notes", "jobs"] {
            let exists: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "missing table {table}");
        }
    }
}
