pub mod error;
pub mod ledger;
pub mod pricing;
pub mod types;

pub use error::{BudgetError, Result};
pub use ledger::BudgetLedger;
pub use pricing::{compute_cost, price_for, ModelPrice, DEFAULT_PRICE, PRICES};
pub use types::{BudgetEvent, BudgetStatus};
