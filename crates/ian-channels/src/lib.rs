pub mod error;
pub mod platform;
pub mod poller;
pub mod runtime;
pub mod worker;

pub use error::ChannelError;
pub use platform::ChatPlatform;
pub use poller::Poller;
pub use runtime::ChannelRuntime;
pub use worker::{MessageHandler, Worker, WorkerItem, DEFAULT_QUEUE_CAPACITY};
