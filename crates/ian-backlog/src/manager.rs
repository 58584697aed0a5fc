use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::{BacklogError, Result};
use crate::types::{BacklogTicket, HandoffTarget};

/// CRUD over the shared `backlog_tickets` table, with ticket ids minted from
/// the shared `ticket_ordinal_counter` row rather than a random id — the
/// sequence is meant to be stable and referenceable in chat.
pub struct BacklogManager {
    db: Mutex<Connection>,
}

pub struct NewTicket<'a> {
    pub title: &'a str,
    pub requester: &'a str,
    pub channel: &'a str,
    pub summary: &'a str,
    pub requested_outcome: &'a str,
    pub impact: &'a str,
    pub handoff_target: HandoffTarget,
    pub status: &'a str,
    pub intent: &'a str,
    pub handoff_payload: Option<&'a str>,
    pub linked_plan_files: &'a [String],
}

impl BacklogManager {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Claim the next ordinal and insert the ticket under a single
    /// transaction so two concurrent callers never mint the same id.
    pub fn create(&self, ticket: NewTicket<'_>) -> Result<BacklogTicket> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let ordinal: i64 = tx.query_row(
            "SELECT next FROM ticket_ordinal_counter WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE ticket_ordinal_counter SET next = next + 1 WHERE id = 1",
            [],
        )?;

        let ticket_id = format!("IAN-{ordinal:06}");
        let handoff_target_str = ticket.handoff_target.to_string();
        let linked_plan_files_json =
            serde_json::to_string(ticket.linked_plan_files).unwrap_or_else(|_| "[]".to_string());

        tx.execute(
            "INSERT INTO backlog_tickets
             (ticket_id, ordinal, title, requester, channel, summary, requested_outcome,
              impact, handoff_target, status, intent, handoff_payload, linked_plan_files,
              created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
            rusqlite::params![
                ticket_id,
                ordinal,
                ticket.title,
                ticket.requester,
                ticket.channel,
                ticket.summary,
                ticket.requested_outcome,
                ticket.impact,
                handoff_target_str,
                ticket.status,
                ticket.intent,
                ticket.handoff_payload,
                linked_plan_files_json,
                now,
            ],
        )?;

        tx.commit()?;

        Ok(BacklogTicket {
            ticket_id,
            ordinal,
            title: ticket.title.to_string(),
            requester: ticket.requester.to_string(),
            channel: ticket.channel.to_string(),
            summary: ticket.summary.to_string(),
            requested_outcome: ticket.requested_outcome.to_string(),
            impact: ticket.impact.to_string(),
            handoff_target: ticket.handoff_target,
            status: ticket.status.to_string(),
            intent: ticket.intent.to_string(),
            handoff_payload: ticket.handoff_payload.map(str::to_string),
            linked_plan_files: ticket.linked_plan_files.to_vec(),
            created_at: now,
        })
    }

    pub fn get(&self, ticket_id: &str) -> Result<BacklogTicket> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT ticket_id, ordinal, title, requester, channel, summary, requested_outcome,
                    impact, handoff_target, status, intent, handoff_payload, linked_plan_files,
                    created_at
             FROM backlog_tickets WHERE ticket_id = ?1",
            [ticket_id],
            row_to_ticket,
        )
        .map_err(|_| BacklogError::NotFound {
            ticket_id: ticket_id.to_string(),
        })
    }

    pub fn set_status(&self, ticket_id: &str, status: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows = db.execute(
            "UPDATE backlog_tickets SET status = ?1 WHERE ticket_id = ?2",
            rusqlite::params![status, ticket_id],
        )?;
        if rows == 0 {
            return Err(BacklogError::NotFound {
                ticket_id: ticket_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn list_by_status(&self, status: &str) -> Result<Vec<BacklogTicket>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT ticket_id, ordinal, title, requester, channel, summary, requested_outcome,
                    impact, handoff_target, status, intent, handoff_payload, linked_plan_files,
                    created_at
             FROM backlog_tickets WHERE status = ?1 ORDER BY ordinal ASC",
        )?;
        let rows = stmt.query_map([status], row_to_ticket)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<BacklogTicket>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT ticket_id, ordinal, title, requester, channel, summary, requested_outcome,
                    impact, handoff_target, status, intent, handoff_payload, linked_plan_files,
                    created_at
             FROM backlog_tickets ORDER BY ordinal DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], row_to_ticket)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn row_to_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<BacklogTicket> {
    let handoff_target_str: String = row.get(8)?;
    let linked_plan_files_json: String = row.get(12)?;
    Ok(BacklogTicket {
        ticket_id: row.get(0)?,
        ordinal: row.get(1)?,
        title: row.get(2)?,
        requester: row.get(3)?,
        channel: row.get(4)?,
        summary: row.get(5)?,
        requested_outcome: row.get(6)?,
        impact: row.get(7)?,
        handoff_target: handoff_target_str.parse().unwrap_or(HandoffTarget::BacklogTriage),
        status: row.get(9)?,
        intent: row.get(10)?,
        handoff_payload: row.get(11)?,
        linked_plan_files: serde_json::from_str(&linked_plan_files_json).unwrap_or_default(),
        created_at: row.get(13)?,
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

    fn sample() -> NewTicket<'static> {
        NewTicket {
            title: "weekly retrospective app",
            requester: "owner",
            channel: "C1",
            summary: "build a retro tool",
            requested_outcome: "a working app",
            impact: "team runs faster retros",
            handoff_target: HandoffTarget::Planner,
            status: "ideas",
            intent: "idea_brainstorm",
            handoff_payload: None,
            linked_plan_files: &[],
        }
    }

    #[test]
    fn first_ticket_id_is_ian_000001() {
        let mgr = BacklogManager::new(fresh_db());
        let ticket = mgr.create(sample()).unwrap();
        assert_eq!(ticket.ticket_id, "IAN-000001");
    }

    #[test]
    fn ticket_ids_are_sequential() {
        let mgr = BacklogManager::new(fresh_db());
        let t1 = mgr.create(sample()).unwrap();
        let t2 = mgr.create(sample()).unwrap();
        assert_eq!(t1.ticket_id, "IAN-000001");
        assert_eq!(t2.ticket_id, "IAN-000002");
    }

    #[test]
    fn set_status_then_filter_by_status() {
        let mgr = BacklogManager::new(fresh_db());
        let t = mgr.create(sample()).unwrap();
        mgr.set_status(&t.ticket_id, "plans").unwrap();
        let plans = mgr.list_by_status("plans").unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].ticket_id, t.ticket_id);
    }
}
