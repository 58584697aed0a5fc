use std::sync::Arc;
use std::time::Duration;

use ian_channels::ChatPlatform;
use ian_core::types::ChannelId;
use tracing::{info, warn};
use uuid::Uuid;

/// Default timeout for an approval request (seconds), per the configuration
/// surface's `approval timeout` key.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const MAX_INPUT_CHARS: usize = 300;

/// Blocks a worker task on a human yes/no decision for a tool call. Posts a
/// request with a short id to the control channel, then polls for a
/// matching `approve <id>` / `reject <id>` reply from the owner until it
/// sees one or the timeout elapses.
pub struct ApprovalGate {
    platform: Arc<dyn ChatPlatform>,
    control_channel: ChannelId,
    owner_user_id: String,
    timeout: Duration,
}

impl ApprovalGate {
    pub fn new(platform: Arc<dyn ChatPlatform>, control_channel: ChannelId, owner_user_id: String) -> Self {
        Self {
            platform,
            control_channel,
            owner_user_id,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `true` only on an explicit `approve`; timeout and `reject`
    /// both resolve to `false`.
    pub async fn request(&self, tool_name: &str, inputs: &str) -> bool {
        let request_id = short_id();
        let truncated = truncate(inputs, MAX_INPUT_CHARS);

        let prompt = format!(
            "Approval needed [{request_id}]: `{tool_name}` wants to run with: {truncated}\n\
             Reply `approve {request_id}` or `reject {request_id}`."
        );
        if let Err(e) = self.platform.post(&self.control_channel, &prompt, None).await {
            warn!(request_id, error = %e, "failed to post approval request, treating as rejected");
            return false;
        }
        info!(request_id, tool_name, "approval request posted");

        let outcome = tokio::time::timeout(self.timeout, self.poll_for_decision(&request_id)).await;

        match outcome {
            Ok(decision) => decision,
            Err(_) => {
                warn!(request_id, "approval request timed out");
                let _ = self
                    .platform
                    .post(
                        &self.control_channel,
                        &format!("Approval request [{request_id}] timed out — treated as rejected."),
                        None,
                    )
                    .await;
                false
            }
        }
    }

    async fn poll_for_decision(&self, request_id: &str) -> bool {
        let mut cursor = Some(chrono::Utc::now().to_rfc3339());
        let approve_needle = format!("approve {}", request_id.to_lowercase());
        let reject_needle = format!("reject {}", request_id.to_lowercase());

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let messages = match self
                .platform
                .fetch_since(&self.control_channel, cursor.as_deref(), 20)
                .await
            {
                Ok(mut msgs) => {
                    msgs.sort_by(|a, b| a.ts.cmp(&b.ts));
                    if let Some(newest) = msgs.last() {
                        cursor = Some(newest.ts.clone());
                    }
                    msgs
                }
                Err(e) => {
                    warn!(request_id, error = %e, "poll for approval decision failed, retrying");
                    continue;
                }
            };

            for msg in messages {
                if msg.user != self.owner_user_id {
                    continue;
                }
                let lower = msg.text.to_lowercase();
                if lower.contains(&approve_needle) {
                    return true;
                }
                if lower.contains(&reject_needle) {
                    return false;
                }
            }
        }
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ian_channels::error::Result as ChannelResult;
    use ian_core::types::InboundMessage;
    use std::sync::Mutex;

    struct ScriptedPlatform {
        replies: Mutex<Vec<Vec<InboundMessage>>>,
    }

    #[async_trait]
    impl ChatPlatform for ScriptedPlatform {
        async fn fetch_since(
            &self,
            _channel: &ChannelId,
            _since_ts: Option<&str>,
            _limit: usize,
        ) -> ChannelResult<Vec<InboundMessage>> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(vec![])
            } else {
                Ok(replies.remove(0))
            }
        }
        async fn post(&self, _channel: &ChannelId, _text: &str, _thread_ts: Option<&str>) -> ChannelResult<()> {
            Ok(())
        }
        async fn whoami(&self) -> ChannelResult<String> {
            Ok("U_BOT".to_string())
        }
    }

    fn msg(user: &str, text: &str) -> InboundMessage {
        InboundMessage {
            ts: chrono::Utc::now().to_rfc3339(),
            user: user.to_string(),
            text: text.to_string(),
            channel: ChannelId::from("C_CONTROL"),
            thread_ts: None,
            subtype: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn approve_reply_resolves_true() {
        let platform = Arc::new(ScriptedPlatform {
            replies: Mutex::new(vec![vec![]]),
        });
        let gate = ApprovalGate::new(platform.clone(), ChannelId::from("C_CONTROL"), "U_OWNER".to_string());

        let task = tokio::spawn({
            let gate_platform = platform.clone();
            async move {
                // Seed the approval after the first empty poll tick.
                tokio::time::sleep(Duration::from_secs(4)).await;
                gate_platform
                    .replies
                    .lock()
                    .unwrap()
                    .push(vec![msg("U_OWNER", "approve REQID")]);
            }
        });

        // We can't know the generated id ahead of time from outside, so
        // instead exercise poll_for_decision directly with a known id.
        let decision = gate.poll_for_decision("reqid").await;
        task.await.unwrap();
        assert!(decision);
    }

    #[tokio::test(start_paused = true)]
    async fn reject_reply_resolves_false() {
        let platform = Arc::new(ScriptedPlatform {
            replies: Mutex::new(vec![vec![msg("U_OWNER", "reject reqid")]]),
        });
        let gate = ApprovalGate::new(platform, ChannelId::from("C_CONTROL"), "U_OWNER".to_string());
        let decision = gate.poll_for_decision("reqid").await;
        assert!(!decision);
    }

    #[tokio::test(start_paused = true)]
    async fn non_owner_replies_are_ignored() {
        let platform = Arc::new(ScriptedPlatform {
            replies: Mutex::new(vec![
                vec![msg("U_STRANGER", "approve reqid")],
                vec![msg("U_OWNER", "approve reqid")],
            ]),
        });
        let gate = ApprovalGate::new(platform, ChannelId::from("C_CONTROL"), "U_OWNER".to_string());
        let decision = gate.poll_for_decision("reqid").await;
        assert!(decision);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_with_no_reply_resolves_false() {
        let platform = Arc::new(ScriptedPlatform {
            replies: Mutex::new(vec![]),
        });
        let gate = ApprovalGate::new(platform, ChannelId::from("C_CONTROL"), "U_OWNER".to_string())
            .with_timeout(Duration::from_secs(5));
        let decision = gate.request("shell_run", "{\"command\":\"ls\"}").await;
        assert!(!decision);
    }

    #[test]
    fn request_ids_are_eight_hex_chars() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn long_inputs_are_truncated() {
        let long = "x".repeat(MAX_INPUT_CHARS + 50);
        let truncated = truncate(&long, MAX_INPUT_CHARS);
        assert_eq!(truncated.chars().count(), MAX_INPUT_CHARS + 1);
    }
}
