pub mod error;
pub mod gate;

pub use error::ApprovalError;
pub use gate::{ApprovalGate, DEFAULT_TIMEOUT_SECS};
