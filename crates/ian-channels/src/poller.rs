use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ian_core::types::{ChannelId, ChannelKind, InboundMessage, MessageSubtype};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::platform::ChatPlatform;
use crate::worker::WorkerItem;

/// Minimum delay applied when the platform reports a rate limit without a
/// usable retry-after value (seconds).
const BACKOFF_BASE_SECS: u64 = 5;
/// Ceiling on the backoff delay regardless of how many consecutive
/// rate-limit responses are seen (seconds).
const BACKOFF_MAX_SECS: u64 = 300;
/// Jitter fraction applied to the backoff delay (±10%), same shape as the
/// original channel-connect backoff this is generalized from.
const JITTER_FRACTION: f64 = 0.10;

const FETCH_LIMIT: usize = 20;

/// One poll-cursor-and-enqueue loop per monitored channel. Sleeps
/// `poll_interval`, fetches new messages, filters them, and pushes survivors
/// onto that channel's worker queue.
pub struct Poller {
    pub channel_id: ChannelId,
    pub kind: ChannelKind,
    pub platform: Arc<dyn ChatPlatform>,
    pub queue_tx: mpsc::Sender<WorkerItem>,
    pub poll_interval: Duration,
    pub owner_user_id: String,
    /// User ids this process itself publishes as (its own identity plus any
    /// sibling persona identity) — excluded from client-channel dispatch so
    /// the bot never replies to itself.
    pub agent_user_ids: HashSet<String>,
    pub shutdown: watch::Receiver<bool>,
}

impl Poller {
    /// Run until `shutdown` flips to `true`. Checked once per sleep, not
    /// mid-fetch — a poll tick always completes once started.
    pub async fn run(mut self) {
        let mut cursor: Option<String> = None;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        info!(channel = self.channel_id.as_str(), "poller shutting down");
                        return;
                    }
                }
            }
            if *self.shutdown.borrow() {
                return;
            }

            match self
                .platform
                .fetch_since(&self.channel_id, cursor.as_deref(), FETCH_LIMIT)
                .await
            {
                Ok(mut messages) => {
                    // fetch_since makes no ordering promise; always sort so
                    // the cursor and dispatch order are chronological.
                    messages.sort_by(|a, b| a.ts.cmp(&b.ts));

                    if let Some(newest) = messages.last() {
                        cursor = Some(newest.ts.clone());
                    }

                    for msg in messages {
                        if self.should_dispatch(&msg) {
                            if self.queue_tx.send(WorkerItem::Message(msg)).await.is_err() {
                                warn!(channel = self.channel_id.as_str(), "worker queue closed");
                                return;
                            }
                        } else {
                            debug!(channel = self.channel_id.as_str(), "dropped filtered message");
                        }
                    }
                }
                Err(ChannelError::RateLimited { retry_after_secs }) => {
                    let delay = self.backoff_delay(retry_after_secs);
                    warn!(channel = self.channel_id.as_str(), delay_secs = delay, "rate limited, backing off");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
                Err(e) => {
                    warn!(channel = self.channel_id.as_str(), error = %e, "poll failed, continuing");
                }
            }
        }
    }

    fn backoff_delay(&self, retry_after_secs: u64) -> u64 {
        if retry_after_secs > 0 {
            return retry_after_secs;
        }
        let base = BACKOFF_BASE_SECS.min(BACKOFF_MAX_SECS);
        base + jitter_secs(base)
    }

    fn should_dispatch(&self, msg: &InboundMessage) -> bool {
        if matches!(
            msg.subtype,
            Some(MessageSubtype::BotMessage)
                | Some(MessageSubtype::MessageChanged)
                | Some(MessageSubtype::MessageDeleted)
                | Some(MessageSubtype::ChannelJoin)
        ) {
            return false;
        }

        if self.agent_user_ids.contains(&msg.user) {
            return false;
        }

        match self.kind {
            ChannelKind::Control => msg.user == self.owner_user_id,
            ChannelKind::Client => true,
        }
    }
}

/// Deterministic pseudo-random jitter derived from the current time rather
/// than a `rand` dependency — same trick used for the earlier channel
/// reconnect backoff this poller generalizes.
fn jitter_secs(base_secs: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let max_jitter = ((base_secs as f64) * JITTER_FRACTION) as u64;
    if max_jitter == 0 {
        return 0;
    }
    (nanos as u64) % max_jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(user: &str, subtype: Option<MessageSubtype>) -> InboundMessage {
        InboundMessage {
            ts: "1.0".to_string(),
            user: user.to_string(),
            text: "hi".to_string(),
            channel: ChannelId::from("C1"),
            thread_ts: None,
            subtype,
        }
    }

    fn poller(kind: ChannelKind) -> Poller {
        let (tx, _rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        Poller {
            channel_id: ChannelId::from("C1"),
            kind,
            platform: Arc::new(NoopPlatform),
            queue_tx: tx,
            poll_interval: Duration::from_secs(1),
            owner_user_id: "U_OWNER".to_string(),
            agent_user_ids: HashSet::from(["U_BOT".to_string()]),
            shutdown: shutdown_rx,
        }
    }

    struct NoopPlatform;

    #[async_trait::async_trait]
    impl ChatPlatform for NoopPlatform {
        async fn fetch_since(
            &self,
            _channel: &ChannelId,
            _since_ts: Option<&str>,
            _limit: usize,
        ) -> crate::error::Result<Vec<InboundMessage>> {
            Ok(vec![])
        }
        async fn post(&self, _channel: &ChannelId, _text: &str, _thread_ts: Option<&str>) -> crate::error::Result<()> {
            Ok(())
        }
        async fn whoami(&self) -> crate::error::Result<String> {
            Ok("U_BOT".to_string())
        }
    }

    #[test]
    fn control_channel_drops_non_owner() {
        let p = poller(ChannelKind::Control);
        assert!(p.should_dispatch(&msg("U_OWNER", None)));
        assert!(!p.should_dispatch(&msg("U_STRANGER", None)));
    }

    #[test]
    fn client_channel_allows_any_non_agent_user() {
        let p = poller(ChannelKind::Client);
        assert!(p.should_dispatch(&msg("U_STRANGER", None)));
        assert!(!p.should_dispatch(&msg("U_BOT", None)));
    }

    #[test]
    fn dropped_subtypes_never_dispatch() {
        let p = poller(ChannelKind::Client);
        assert!(!p.should_dispatch(&msg("U_STRANGER", Some(MessageSubtype::BotMessage))));
        assert!(!p.should_dispatch(&msg("U_STRANGER", Some(MessageSubtype::MessageDeleted))));
    }
}
