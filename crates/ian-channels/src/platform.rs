use async_trait::async_trait;
use ian_core::types::{ChannelId, InboundMessage};

use crate::error::Result;

/// The chat-platform collaborator: fetch new messages since a cursor, post a
/// reply, and identify the calling account. Concrete wire protocols (Slack,
/// Telegram, a custom bot API, …) are out of scope here — this crate only
/// drives whatever implementation is plugged in.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Messages strictly newer than `since_ts` (exclusive), oldest-first or
    /// newest-first — the poller re-sorts either way. `limit` bounds how
    /// many rows a single call may return.
    async fn fetch_since(
        &self,
        channel: &ChannelId,
        since_ts: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InboundMessage>>;

    /// Post a reply into `channel`, optionally threaded under `thread_ts`.
    async fn post(&self, channel: &ChannelId, text: &str, thread_ts: Option<&str>) -> Result<()>;

    /// The platform user id this process publishes as — used to exclude our
    /// own messages (and our sibling persona identity's) from dispatch.
    async fn whoami(&self) -> Result<String>;
}
