pub mod error;
pub mod manager;
pub mod summarizer;
pub mod types;

pub use error::SessionError;
pub use manager::SessionManager;
pub use summarizer::{summarize_and_rotate, SummaryModel, TURN_COUNT_THRESHOLD};
pub use types::{Session, Turn, TurnRole, WindowMessage};
