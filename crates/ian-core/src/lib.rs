pub mod config;
pub mod error;
pub mod types;

pub use config::IanConfig;
pub use error::{IanError, Result};
