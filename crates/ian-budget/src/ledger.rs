use std::sync::Mutex;

use chrono::{Datelike, Utc};
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::pricing::compute_cost;
use crate::types::{BudgetEvent, BudgetStatus};

/// Records token usage against the shared `budget_events` table (see
/// `ian-storage`'s migration 2) and answers daily/monthly cap questions
/// against it. Every call is a fresh SQL aggregation — `check` never calls
/// out to a model provider and never mutates a running counter.
pub struct BudgetLedger {
    db: Mutex<Connection>,
    pub daily_limit_usd: f64,
    pub monthly_limit_usd: f64,
    pub warn_pct: f64,
}

impl BudgetLedger {
    pub fn new(conn: Connection, daily_limit_usd: f64, monthly_limit_usd: f64, warn_pct: f64) -> Self {
        Self {
            db: Mutex::new(conn),
            daily_limit_usd,
            monthly_limit_usd,
            warn_pct,
        }
    }

    /// Insert a `BudgetEvent` for one model call and return its cost in USD.
    #[instrument(skip(self), fields(model, input_tokens, output_tokens))]
    pub fn record_usage(
        &self,
        model: &str,
        input_tokens: u32,
        output_tokens: u32,
        cache_written: u32,
        cache_read: u32,
    ) -> Result<f64> {
        let cost = compute_cost(model, input_tokens, output_tokens, cache_written, cache_read);
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO budget_events
             (id, model, input_tokens, output_tokens, cache_written, cache_read, cost_usd, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                id,
                model,
                input_tokens,
                output_tokens,
                cache_written,
                cache_read,
                cost,
                now
            ],
        )?;

        Ok(cost)
    }

    /// Compute daily/monthly spend, warn, and blocked flags. Pure SQL
    /// aggregation — safe to call on every message without rate concern.
    pub fn check(&self) -> Result<BudgetStatus> {
        let now = Utc::now();
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .to_rfc3339();
        let month_start = now
            .date_naive()
            .with_day(1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .to_rfc3339();

        let db = self.db.lock().unwrap();
        let daily_spent: f64 = db.query_row(
            "SELECT COALESCE(SUM(cost_usd), 0.0) FROM budget_events WHERE created_at >= ?1",
            [&day_start],
            |r| r.get(0),
        )?;
        let monthly_spent: f64 = db.query_row(
            "SELECT COALESCE(SUM(cost_usd), 0.0) FROM budget_events WHERE created_at >= ?1",
            [&month_start],
            |r| r.get(0),
        )?;

        Ok(BudgetStatus {
            daily_spent,
            monthly_spent,
            daily_limit: self.daily_limit_usd,
            monthly_limit: self.monthly_limit_usd,
            daily_warn: daily_spent >= self.daily_limit_usd * self.warn_pct,
            monthly_warn: monthly_spent >= self.monthly_limit_usd * self.warn_pct,
            daily_blocked: daily_spent >= self.daily_limit_usd,
            monthly_blocked: monthly_spent >= self.monthly_limit_usd,
        })
    }

    /// Recent events, newest first — backs the `!cost` admin command.
    pub fn recent(&self, limit: usize) -> Result<Vec<BudgetEvent>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, model, input_tokens, output_tokens, cache_written, cache_read, cost_usd, created_at
             FROM budget_events ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok(BudgetEvent {
                id: row.get(0)?,
                model: row.get(1)?,
                input_tokens: row.get(2)?,
                output_tokens: row.get(3)?,
                cache_written: row.get(4)?,
                cache_read: row.get(5)?,
                cost_usd: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
