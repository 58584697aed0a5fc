//! Composition root: wires every other `ian-*` crate into one running
//! process. The chat platform, the model HTTP client, and the tool backend
//! (real filesystem/shell/search access) are external collaborators this
//! workspace deliberately does not implement — [`build`] takes them as
//! trait objects so an embedding binary supplies the concrete wire-ups.

pub mod build;
pub mod heartbeat;

pub use build::{build, Gateway};
