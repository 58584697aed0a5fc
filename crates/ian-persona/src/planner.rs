//! The Planner FSM: `Planning -> PlanCreated`. Runs on the heavy model with
//! tool allow-list `{filesystem_read, filesystem_list}`. The dynamic context
//! payload (BRAND vision + project context + docs) is built once by the
//! caller on the first Planner turn of a session and threaded in here —
//! this module stays I/O-free apart from the model call itself.

use ian_backlog::{BacklogManager, BacklogTicket, HandoffTarget, NewTicket};
use ian_core::types::{Persona, PlannerState, SessionMetadata};

use crate::error::Result;
use crate::prompt_snippets::PLANNER_INSTRUCTION;
use ian_tools::prompt::SystemPrompt;
use ian_tools::{ChatRequest, LlmClient, Message, Role};
use tracing::info;

pub const SENTINEL: &str = "[PLAN:READY]";
/// Multiplier applied to raw API cost to produce the user-facing estimate.
const USER_FACING_MARKUP: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct CostEstimate {
    pub api_cost_usd: f64,
    pub user_facing_cost_usd: f64,
}

/// `api_cost = input_tokens * in_price/1e6 + output_tokens * out_price/1e6`;
/// user-facing cost is `api_cost * 20`.
pub fn estimate_cost(input_tokens: u32, output_tokens: u32, in_price_per_million: f64, out_price_per_million: f64) -> CostEstimate {
    let api_cost_usd =
        input_tokens as f64 * in_price_per_million / 1_000_000.0 + output_tokens as f64 * out_price_per_million / 1_000_000.0;
    CostEstimate {
        api_cost_usd,
        user_facing_cost_usd: api_cost_usd * USER_FACING_MARKUP,
    }
}

pub struct PlannerTurn {
    pub reply: String,
    pub metadata: SessionMetadata,
    pub ticket: Option<BacklogTicket>,
    pub cost: Option<CostEstimate>,
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
    context_payload: Option<&str>,
    in_price_per_million: f64,
    out_price_per_million: f64,
    metadata: SessionMetadata,
) -> Result<PlannerTurn> {
    let system = SystemPrompt {
        static_tier: PLANNER_INSTRUCTION.to_string(),
        user_tier: context_payload.unwrap_or("").to_string(),
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

    let cost = estimate_cost(
        response.usage.input_tokens,
        response.usage.output_tokens,
        in_price_per_million,
        out_price_per_million,
    );

    let mut new_metadata = metadata;
    new_metadata.persona = Some(Persona::Planner);

    let sentinel_present = reply.contains(SENTINEL);
    if sentinel_present {
        reply = reply.replace(SENTINEL, "").trim().to_string();

        let title = new_metadata
            .task_title_hint
            .clone()
            .unwrap_or_else(|| "Implementation plan".to_string());
        let ticket = backlog.create(NewTicket {
            title: &title,
            requester,
            channel,
            summary: &reply,
            requested_outcome: "plan reviewed and actioned by a human",
            impact: "unblocks implementation work",
            handoff_target: HandoffTarget::Human,
            status: "plans",
            intent: "plan_ready",
            handoff_payload: None,
            linked_plan_files: &[],
        })?;

        new_metadata.planner_state = Some(PlannerState::PlanCreated);

        info!(ticket_id = %ticket.ticket_id, cost_usd = cost.user_facing_cost_usd, "plan ready, ticket created");

        return Ok(PlannerTurn {
            reply,
            metadata: new_metadata,
            ticket: Some(ticket),
            cost: Some(cost),
        });
    }

    new_metadata.planner_state = Some(PlannerState::Planning);

    Ok(PlannerTurn {
        reply,
        metadata: new_metadata,
        ticket: None,
        cost: Some(cost),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ian_storage::open_and_migrate;
    use ian_tools::{ChatResponse, LlmError, Usage};
    use std::sync::Mutex;

    struct ScriptedLlm(Mutex<Vec<(&'static str, Usage)>>);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _req: &ChatRequest) -> std::result::Result<ChatResponse, LlmError> {
            let (text, usage) = self.0.lock().unwrap().remove(0);
            Ok(ChatResponse {
                content: text.to_string(),
                model: "test-model".to_string(),
                usage,
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
    fn cost_formula_applies_markup() {
        let cost = estimate_cost(1_000_000, 500_000, 3.0, 15.0);
        assert!((cost.api_cost_usd - 10.5).abs() < 1e-9);
        assert!((cost.user_facing_cost_usd - 210.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn plan_without_sentinel_stays_in_planning() {
        let usage = Usage {
            input_tokens: 1000,
            output_tokens: 500,
            ..Default::default()
        };
        let llm = ScriptedLlm(Mutex::new(vec![("still drafting the plan", usage)]));
        let backlog = fresh_backlog();
        let turn = run_turn(
            &llm,
            &backlog,
            "sonnet",
            4096,
            "owner",
            "C1",
            "plan this out",
            Some("# context"),
            3.0,
            15.0,
            SessionMetadata::default(),
        )
        .await
        .unwrap();

        assert_eq!(turn.metadata.planner_state, Some(PlannerState::Planning));
        assert!(turn.ticket.is_none());
    }

    #[tokio::test]
    async fn sentinel_creates_ticket_for_human_handoff() {
        let usage = Usage {
            input_tokens: 2000,
            output_tokens: 800,
            ..Default::default()
        };
        let llm = ScriptedLlm(Mutex::new(vec![("## Technical Approach\n...\n[PLAN:READY]", usage)]));
        let backlog = fresh_backlog();
        let mut metadata = SessionMetadata::default();
        metadata.task_title_hint = Some("Weekly Retro App".to_string());

        let turn = run_turn(
            &llm,
            &backlog,
            "sonnet",
            4096,
            "owner",
            "C1",
            "continue",
            None,
            3.0,
            15.0,
            metadata,
        )
        .await
        .unwrap();

        assert_eq!(turn.metadata.planner_state, Some(PlannerState::PlanCreated));
        let ticket = turn.ticket.unwrap();
        assert_eq!(ticket.handoff_target, HandoffTarget::Human);
        assert_eq!(ticket.status, "plans");
        assert!(!turn.reply.contains(SENTINEL));
    }
}
