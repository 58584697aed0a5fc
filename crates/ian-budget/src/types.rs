use serde::{Deserialize, Serialize};

/// One immortal record of model usage. Inserted by `record_usage`, never
/// updated or deleted — the ledger's running totals are always a pure
/// aggregation over this table, never a mutable counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetEvent {
    pub id: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cache_written: u32,
    pub cache_read: u32,
    pub cost_usd: f64,
    pub created_at: String,
}

/// Result of `BudgetLedger::check`. Computed fresh from persisted
/// `BudgetEvent` rows every call — never itself consumes model tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub daily_spent: f64,
    pub monthly_spent: f64,
    pub daily_limit: f64,
    pub monthly_limit: f64,
    pub daily_warn: bool,
    pub monthly_warn: bool,
    pub daily_blocked: bool,
    pub monthly_blocked: bool,
}

impl BudgetStatus {
    /// True if either window is over its hard limit — model calls must stop.
    pub fn is_blocked(&self) -> bool {
        self.daily_blocked || self.monthly_blocked
    }

    /// True if either window has crossed its warn threshold but isn't blocked.
    pub fn is_warned(&self) -> bool {
        !self.is_blocked() && (self.daily_warn || self.monthly_warn)
    }
}
