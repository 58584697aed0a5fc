use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::manager::SessionManager;
use crate::types::TurnRole;

/// Session rotation threshold: once `turn_count` reaches this, the next
/// dispatcher pass rotates the session through `summarize_and_rotate`
/// instead of appending further turns to it.
pub const TURN_COUNT_THRESHOLD: u32 = 40;

/// Placeholder seeded onto the new session when the model call in step 2
/// fails. Messages are never silently dropped — a rotation always happens,
/// even if the compression itself didn't.
const FALLBACK_SUMMARY: &str = "[Previous conversation summary unavailable — the prior session ended without a successful compression pass.]";

/// Minimal seam for the cheap-model call a rotation needs. Implemented by
/// whatever the dispatcher wires its `LlmClient` through; kept separate from
/// the full chat-request/tool-use surface so this crate never depends on
/// `ian-tools`.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    async fn summarize(&self, transcript: &str) -> std::result::Result<String, String>;
}

const COMPRESSION_PROMPT: &str = "Summarize the conversation below in a few dense sentences, \
preserving names, decisions, and open questions. Do not add commentary.";

fn render_transcript(turns: &[crate::types::Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.as_str().to_uppercase(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rotate `channel_id`'s active session once it has grown past
/// [`TURN_COUNT_THRESHOLD`]: summarize the old session, end it, and seed a
/// fresh one with the summary so the conversation continues without
/// replaying the full transcript.
pub async fn summarize_and_rotate(
    sessions: &SessionManager,
    model: &dyn SummaryModel,
    channel_id: &str,
    old_session_id: &str,
) -> Result<String> {
    let turns = sessions.all_turns(old_session_id)?;
    let transcript = render_transcript(&turns);
    let prompt = format!("{COMPRESSION_PROMPT}\n\n{transcript}");

    let summary = match model.summarize(&prompt).await {
        Ok(text) => text,
        Err(reason) => {
            warn!(session_id = old_session_id, %reason, "summarization call failed, seeding placeholder");
            FALLBACK_SUMMARY.to_string()
        }
    };

    sessions.set_summary(old_session_id, &summary)?;
    sessions.end_session(old_session_id)?;

    let new_session = sessions.get_or_create_active(channel_id)?;
    sessions.append_turn(
        &new_session.id,
        TurnRole::User,
        &format!("[Previous conversation summary] {summary}"),
        None,
        0,
        0,
        0,
        0,
    )?;
    sessions.append_turn(
        &new_session.id,
        TurnRole::Assistant,
        "Got it — picking up from that summary.",
        None,
        0,
        0,
        0,
        0,
    )?;

    Ok(new_session.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ian_storage::open_and_migrate;
    use rusqlite::Connection;

    struct FixedModel(&'static str);

    #[async_trait]
    impl SummaryModel for FixedModel {
        async fn summarize(&self, _transcript: &str) -> std::result::Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl SummaryModel for FailingModel {
        async fn summarize(&self, _transcript: &str) -> std::result::Result<String, String> {
            Err("model unavailable".to_string())
        }
    }

    fn fresh_db() -> Connection {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        std::mem::forget(dir);
        open_and_migrate(path.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn rotation_ends_old_session_and_seeds_new_one() {
        let sessions = SessionManager::new(fresh_db());
        let old = sessions.get_or_create_active("C1").unwrap();
        sessions
            .append_turn(&old.id, TurnRole::User, "hello", None, 1, 0, 0, 0)
            .unwrap();

        let model = FixedModel("the user said hello");
        let new_id = summarize_and_rotate(&sessions, &model, "C1", &old.id)
            .await
            .unwrap();

        assert_ne!(new_id, old.id);
        let reloaded_old = sessions.get(&old.id).unwrap();
        assert!(reloaded_old.ended_at.is_some());
        assert_eq!(reloaded_old.summary.as_deref(), Some("the user said hello"));

        let messages = sessions.get_messages(&new_id).unwrap();
        assert!(messages[0].content.contains("the user said hello"));
    }

    #[tokio::test]
    async fn model_failure_still_seeds_a_placeholder() {
        let sessions = SessionManager::new(fresh_db());
        let old = sessions.get_or_create_active("C1").unwrap();
        sessions
            .append_turn(&old.id, TurnRole::User, "hello", None, 1, 0, 0, 0)
            .unwrap();

        summarize_and_rotate(&sessions, &FailingModel, "C1", &old.id)
            .await
            .unwrap();

        let reloaded_old = sessions.get(&old.id).unwrap();
        assert_eq!(reloaded_old.summary.as_deref(), Some(FALLBACK_SUMMARY));
    }
}
