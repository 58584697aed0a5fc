//! The ten-step dispatch pipeline: every inbound chat message passes through
//! `Dispatcher::dispatch` exactly once, start to finish, with no step
//! allowed to panic or propagate an error out of the `MessageHandler`
//! boundary.

pub mod admin;
pub mod dispatcher;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod runtime_gate;

pub use dispatcher::Dispatcher;
pub use error::{DispatcherError, Result};
pub use runtime_gate::RuntimeGate;
