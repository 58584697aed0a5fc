//! The Brainstormer FSM: `Ideation -> Refinement -> Synthesis -> Approved ->
//! TicketCreated`. Runs on the default (cheap) model with an empty tool
//! allow-list — brainstorming never touches the filesystem or shell.
//!
//! `Approved` has no separate turn: the handler detects the sentinel on the
//! Synthesis-stage reply and performs ticket creation + task file write
//! inline, landing straight on `TicketCreated`.

use chrono::Utc;
use ian_backlog::{BacklogManager, BacklogTicket, HandoffTarget, NewTicket};
use ian_core::types::{BrainstormState, Persona, SessionMetadata};

use crate::error::Result;
use crate::prompt_snippets::{IDEATION_INSTRUCTION, REFINEMENT_INSTRUCTION, SYNTHESIS_INSTRUCTION};
use crate::task_file::{render_task_file, TaskFile};
use crate::ticket_fields::parse_ticket_fields;
use ian_tools::prompt::SystemPrompt;
use ian_tools::{ChatRequest, LlmClient, Message, Role};
use tracing::info;

pub const SENTINEL: &str = "[BRAINSTORM:APPROVED]";

const APPROVAL_PHRASES: &[&str] = &["yes", "approve", "approved", "looks good", "go ahead", "ship it", "lgtm"];

/// Result of running one Brainstormer turn.
pub struct BrainstormerTurn {
    pub reply: String,
    pub metadata: SessionMetadata,
    pub ticket: Option<BacklogTicket>,
    pub task_file: Option<TaskFile>,
    /// Set once the ticket is created — the dispatcher should synthesize a
    /// pseudo-message into the Planner FSM for this session rather than
    /// re-entering dispatch for the same inbound message.
    pub trigger_planner: bool,
}

/// Case-insensitive substring test against a fixed set of approval phrases.
pub fn is_approval_phrase(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    APPROVAL_PHRASES.iter().any(|p| lower == *p || lower.contains(p))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_turn(
    llm: &dyn LlmClient,
    backlog: &BacklogManager,
    model: &str,
    max_tokens: u32,
    requester: &str,
    channel: &str,
    user_text: &str,
    metadata: SessionMetadata,
) -> Result<BrainstormerTurn> {
    let state = metadata.brainstorm_state.unwrap_or(BrainstormState::Ideation);
    let awaiting_approval = state == BrainstormState::Synthesis && is_approval_phrase(user_text);

    let instruction = match state {
        BrainstormState::Ideation => IDEATION_INSTRUCTION,
        BrainstormState::Refinement => REFINEMENT_INSTRUCTION,
        BrainstormState::Synthesis => SYNTHESIS_INSTRUCTION,
        BrainstormState::Approved | BrainstormState::TicketCreated => SYNTHESIS_INSTRUCTION,
    };

    let system = SystemPrompt {
        static_tier: instruction.to_string(),
        user_tier: String::new(),
        volatile_tier: String::new(),
    };
    let req = ChatRequest {
        model: model.to_string(),
        system: system.to_plain_text(),
        system_prompt: Some(system),
        messages: vec![Message {
            role: Role::User,
            content: user_text.to_string(),
        }],
        max_tokens,
        tools: Vec::new(),
        raw_messages: None,
    };
    let response = llm.chat(&req).await?;
    let mut reply = response.content;

    let mut new_metadata = metadata;
    new_metadata.persona = Some(Persona::Brainstormer);

    let sentinel_present = reply.contains(SENTINEL);
    if awaiting_approval && sentinel_present {
        reply = reply.replace(SENTINEL, "").trim().to_string();

        let fields = parse_ticket_fields(new_metadata.synthesis_text.as_deref().unwrap_or(&reply));
        let ticket = backlog.create(NewTicket {
            title: &fields.title,
            requester,
            channel,
            summary: &fields.summary,
            requested_outcome: &fields.requested_outcome,
            impact: &fields.impact,
            handoff_target: HandoffTarget::Planner,
            status: "ideas",
            intent: "idea_brainstorm",
            handoff_payload: None,
            linked_plan_files: &[],
        })?;
        let file = render_task_file(&ticket.ticket_id, &fields, Utc::now());

        new_metadata.brainstorm_state = Some(BrainstormState::TicketCreated);
        new_metadata.ticket_id = Some(ticket.ticket_id.clone());

        info!(ticket_id = %ticket.ticket_id, "brainstorm approved, ticket created");

        return Ok(BrainstormerTurn {
            reply,
            metadata: new_metadata,
            ticket: Some(ticket),
            task_file: Some(file),
            trigger_planner: true,
        });
    }

    match state {
        BrainstormState::Ideation => {
            new_metadata.raw_idea = Some(user_text.to_string());
            new_metadata.brainstorm_state = Some(BrainstormState::Refinement);
        }
        BrainstormState::Refinement => {
            new_metadata.refined_idea = Some(reply.clone());
            new_metadata.brainstorm_state = Some(BrainstormState::Synthesis);
        }
        BrainstormState::Synthesis | BrainstormState::Approved | BrainstormState::TicketCreated => {
            new_metadata.synthesis_text = Some(reply.clone());
            new_metadata.brainstorm_state = Some(BrainstormState::Synthesis);
        }
    }

    Ok(BrainstormerTurn {
        reply,
        metadata: new_metadata,
        ticket: None,
        task_file: None,
        trigger_planner: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ian_storage::open_and_migrate;
    use ian_tools::{ChatResponse, LlmError, Usage};
    use std::sync::Mutex;

    struct ScriptedLlm(Mutex<Vec<&'static str>>);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _req: &ChatRequest) -> std::result::Result<ChatResponse, LlmError> {
            let text = self.0.lock().unwrap().remove(0);
            Ok(ChatResponse {
                content: text.to_string(),
                model: "test-model".to_string(),
                usage: Usage::default(),
                stop_reason: "end_turn".to_string(),
                tool_calls: Vec::new(),
            })
        }
    }

    fn fresh_backlog() -> BacklogManager {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ian.db");
        std::mem::forget(dir);
        BacklogManager::new(open_and_migrate(path.to_str().unwrap()).unwrap())
    }

    #[test]
    fn approval_phrase_matches_known_set() {
        assert!(is_approval_phrase("Yes"));
        assert!(is_approval_phrase("LGTM, ship it"));
        assert!(!is_approval_phrase("maybe later"));
    }

    #[tokio::test]
    async fn ideation_advances_to_refinement() {
        let llm = ScriptedLlm(Mutex::new(vec!["What's the scope? Who's the user?"]));
        let backlog = fresh_backlog();
        let turn = run_turn(
            &llm,
            &backlog,
            "haiku",
            1024,
            "owner",
            "C1",
            "idea: a weekly retro app",
            SessionMetadata::default(),
        )
        .await
        .unwrap();

        assert_eq!(turn.metadata.brainstorm_state, Some(BrainstormState::Refinement));
        assert!(turn.ticket.is_none());
    }

    #[tokio::test]
    async fn sentinel_without_approval_does_not_create_ticket() {
        let llm = ScriptedLlm(Mutex::new(vec!["**Title:** X\n[BRAINSTORM:APPROVED]"]));
        let backlog = fresh_backlog();
        let mut metadata = SessionMetadata::default();
        metadata.persona = Some(Persona::Brainstormer);
        metadata.brainstorm_state = Some(BrainstormState::Synthesis);

        let turn = run_turn(&llm, &backlog, "haiku", 1024, "owner", "C1", "tell me more", metadata)
            .await
            .unwrap();

        assert!(turn.ticket.is_none());
        assert_eq!(turn.metadata.brainstorm_state, Some(BrainstormState::Synthesis));
    }

    #[tokio::test]
    async fn approval_plus_sentinel_creates_ticket_and_triggers_planner() {
        let llm = ScriptedLlm(Mutex::new(vec!["Confirmed. [BRAINSTORM:APPROVED]"]));
        let backlog = fresh_backlog();
        let mut metadata = SessionMetadata::default();
        metadata.persona = Some(Persona::Brainstormer);
        metadata.brainstorm_state = Some(BrainstormState::Synthesis);
        metadata.synthesis_text = Some(
            "**Title:** Weekly Retro App\n**The Solution:** builds it\n\
             **What Success Looks Like:** used weekly\n**Who Benefits:** the team"
                .to_string(),
        );

        let turn = run_turn(&llm, &backlog, "haiku", 1024, "owner", "C1", "yes", metadata)
            .await
            .unwrap();

        assert!(turn.trigger_planner);
        assert_eq!(turn.metadata.brainstorm_state, Some(BrainstormState::TicketCreated));
        let ticket = turn.ticket.unwrap();
        assert_eq!(ticket.title, "Weekly Retro App");
        assert!(!turn.reply.contains(SENTINEL));
    }
}
