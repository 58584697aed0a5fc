//! `Dispatcher` wires every other crate together into the one per-message
//! pipeline: normalize -> admin check -> session/rotation -> budget gate ->
//! persona delegate -> intent/policy -> model+tool loop -> bookkeeping.
//!
//! `handle` never returns a `Result` (`MessageHandler::handle` can't), so
//! every fallible step is resolved to a best-effort chat reply plus an audit
//! `Error` event rather than propagated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use ian_approval::ApprovalGate;
use ian_audit::{AuditEvent, AuditLogger};
use ian_backlog::{BacklogManager, HandoffTarget, NewTicket};
use ian_budget::BudgetLedger;
use ian_channels::{ChatPlatform, MessageHandler};
use ian_core::config::IanConfig;
use ian_core::types::{ChannelKind, InboundMessage, MessageSubtype, Persona, SessionMetadata};
use ian_notes::NoteManager;
use ian_persona::{brainstormer, classify_intent, intent::Intent, persona_router::select_persona, planner, select_model, Classification};
use ian_sessions::{summarize_and_rotate, SessionManager, SummaryModel, TurnRole, WindowMessage};
use ian_tools::prompt::{build_planner_context, general_static_tier, SystemPrompt};
use ian_tools::tools::tool_loop::run_with_tools;
use ian_tools::{ChatRequest, LlmClient, Message, Role, ToolRegistry};

use crate::admin::{self, AdminCommand};
use crate::normalize::normalize;
use crate::policy::{find_top_handoff_files, next_step_for, render_policy_block};
use crate::runtime_gate::RuntimeGate;

/// Confidence floor below which `classify_intent` results are treated as
/// `needs_clarification` regardless of which intent actually scored highest.
const MIN_INTENT_CONFIDENCE: f64 = 0.5;
/// How many top handoff files to attach to a dev-handoff reply.
const HANDOFF_FILE_COUNT: usize = 3;

/// Every collaborator a dispatch pass can touch, held behind `Arc` so
/// `Dispatcher` itself stays a cheap `Clone` — `ChannelRuntime::spawn`'s
/// `handler_factory` clones one per channel worker.
struct Inner {
    config: IanConfig,
    platform: Arc<dyn ChatPlatform>,
    llm: Arc<dyn LlmClient>,
    sessions: SessionManager,
    budget: BudgetLedger,
    audit: AuditLogger,
    backlog: BacklogManager,
    notes: NoteManager,
    approval: ApprovalGate,
    tools: ToolRegistry,
    runtime: RuntimeGate,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

/// Adapts an `LlmClient` to the narrow `SummaryModel` seam `ian-sessions`
/// expects, so session rotation never needs to know about tool defs,
/// system-prompt tiers, or any of the rest of the chat request shape.
struct LlmSummaryModel {
    llm: Arc<dyn LlmClient>,
    model: String,
}

#[async_trait]
impl SummaryModel for LlmSummaryModel {
    async fn summarize(&self, transcript: &str) -> Result<String, String> {
        let req = ChatRequest {
            model: self.model.clone(),
            system: "Summarize conversations concisely and factually.".to_string(),
            system_prompt: None,
            messages: vec![Message {
                role: Role::User,
                content: transcript.to_string(),
            }],
            max_tokens: 512,
            tools: Vec::new(),
            raw_messages: None,
        };
        self.llm.chat(&req).await.map(|r| r.content).map_err(|e| e.to_string())
    }
}

#[allow(clippy::too_many_arguments)]
impl Dispatcher {
    pub fn new(
        config: IanConfig,
        platform: Arc<dyn ChatPlatform>,
        llm: Arc<dyn LlmClient>,
        sessions: SessionManager,
        budget: BudgetLedger,
        audit: AuditLogger,
        backlog: BacklogManager,
        notes: NoteManager,
        approval: ApprovalGate,
        tools: ToolRegistry,
        runtime: RuntimeGate,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                platform,
                llm,
                sessions,
                budget,
                audit,
                backlog,
                notes,
                approval,
                tools,
                runtime,
            }),
        }
    }

    /// The runtime on/off switch checked at pipeline step 3. Exposed so an
    /// embedding binary (or a future admin command) can flip it without
    /// reaching into `Inner`.
    pub fn runtime_gate(&self) -> RuntimeGate {
        self.inner.runtime.clone()
    }

    fn channel_kind(&self, channel: &str) -> ChannelKind {
        if channel == self.inner.config.platform.control_channel_id {
            ChannelKind::Control
        } else {
            ChannelKind::Client
        }
    }

    fn tasks_dir(&self) -> PathBuf {
        Path::new(&self.inner.config.storage.markdown_path).join("tasks/pending")
    }

    fn doc_dirs(&self) -> Vec<PathBuf> {
        self.inner
            .config
            .storage
            .startup_context_files
            .iter()
            .map(PathBuf::from)
            .collect()
    }

    async fn reply(&self, channel: &str, thread_ts: Option<&str>, text: &str) {
        if let Err(e) = self.inner.platform.post(&channel.into(), text, thread_ts).await {
            error!(channel, error = %e, "failed to post reply");
        }
    }

    fn audit_error(&self, channel: &str, context: &str, err: impl std::fmt::Display) {
        error!(channel, context, error = %err, "dispatch step failed");
        self.inner.audit.record(
            AuditEvent::Error,
            json!({ "channel": channel, "context": context, "error": err.to_string() }),
        );
    }

    /// Periodic liveness signal driven by the scheduler's `heartbeat` job,
    /// run on its own schedule rather than in response to an inbound
    /// message. Records a `heartbeat` audit event and, if `invoke_model` is
    /// set, posts a one-line status line to the control channel so the
    /// owner sees the process is alive without spending a full model call
    /// by default.
    pub async fn heartbeat(&self, invoke_model: bool) {
        self.inner.audit.record(AuditEvent::Heartbeat, json!({}));
        if !invoke_model {
            return;
        }
        let status = match self.inner.budget.check() {
            Ok(s) => format!("daily ${:.2}/${:.2}", s.daily_spent, s.daily_limit),
            Err(e) => format!("budget check failed: {e}"),
        };
        self.reply(
            &self.inner.config.platform.control_channel_id.clone(),
            None,
            &format!(":heartbeat: still running — {status}"),
        )
        .await;
    }

    /// Entry point used by tests and by `MessageHandler::handle`.
    pub async fn dispatch(&self, msg: InboundMessage) {
        if matches!(
            msg.subtype,
            Some(MessageSubtype::BotMessage) | Some(MessageSubtype::MessageChanged) | Some(MessageSubtype::MessageDeleted)
        ) {
            return;
        }

        let channel = msg.channel.as_str().to_string();
        let kind = self.channel_kind(&channel);
        let text = normalize(&msg.text, &self.inner.config.platform.owner_user_id);
        if text.is_empty() {
            return;
        }

        self.inner.audit.record(
            AuditEvent::UserMessage,
            json!({ "channel": channel, "user": msg.user, "text": text }),
        );

        if kind.is_control() {
            if let Some(cmd) = admin::parse(&text) {
                let reply = self.run_admin_command(cmd, &channel).await;
                self.reply(&channel, msg.thread_ts.as_deref(), &reply).await;
                return;
            }
        }

        if !self.inner.runtime.is_enabled() {
            self.reply(&channel, msg.thread_ts.as_deref(), "off").await;
            return;
        }

        let session = match self.inner.sessions.get_or_create_active(&channel) {
            Ok(s) => s,
            Err(e) => {
                self.audit_error(&channel, "session", e);
                self.reply(&channel, msg.thread_ts.as_deref(), "Something went wrong loading this conversation.")
                    .await;
                return;
            }
        };

        let mut session_id = session.id.clone();
        let mut metadata = session.metadata.clone();

        if session.turn_count >= self.inner.config.storage.summarize_threshold {
            let summarizer = LlmSummaryModel {
                llm: self.inner.llm.clone(),
                model: self.inner.config.model.default_model.clone(),
            };
            match summarize_and_rotate(&self.inner.sessions, &summarizer, &channel, &session_id).await {
                Ok(new_id) => {
                    info!(old = %session_id, new = %new_id, "session rotated past the turn threshold");
                    session_id = new_id;
                    metadata = self
                        .inner
                        .sessions
                        .get_metadata(&session_id)
                        .unwrap_or_default();
                }
                Err(e) => self.audit_error(&channel, "rotate", e),
            }
        }

        let status = match self.inner.budget.check() {
            Ok(s) => s,
            Err(e) => {
                self.audit_error(&channel, "budget_check", e);
                return;
            }
        };
        if status.is_blocked() {
            self.reply(
                &channel,
                msg.thread_ts.as_deref(),
                "I've hit the budget cap for this window and can't make further model calls right now.",
            )
            .await;
            return;
        }
        let budget_warning = status.is_warned().then(|| {
            format!(
                "\n\n_warning: approaching budget limit (daily ${:.2}/${:.2}, monthly ${:.2}/${:.2})_",
                status.daily_spent, status.daily_limit, status.monthly_spent, status.monthly_limit
            )
        });

        let persona = select_persona(&text, &metadata);
        if persona != Persona::General {
            self.run_persona_turn(persona, &channel, &msg, &text, &session_id, metadata, budget_warning.as_deref())
                .await;
            return;
        }

        let classification = classify_intent(&text, MIN_INTENT_CONFIDENCE);
        self.inner.audit.record(
            AuditEvent::PolicyDecision,
            json!({ "channel": channel, "intent": classification.intent.as_str(), "confidence": classification.confidence }),
        );

        match classification.intent {
            Intent::RequestCapture => {
                self.capture_and_reply(&channel, &msg, &text, &classification, &session_id, budget_warning.as_deref())
                    .await;
            }
            Intent::DevHandoff => {
                self.handoff_and_reply(&channel, &msg, &text, &classification, &session_id, budget_warning.as_deref())
                    .await;
            }
            Intent::OutOfScope | Intent::NeedsClarification => {
                let mut block = render_policy_block(&classification, None, next_step_for(classification.intent));
                if let Some(w) = &budget_warning {
                    block.push_str(w);
                }
                self.reply(&channel, msg.thread_ts.as_deref(), &block).await;
            }
            Intent::StatusLookup | Intent::FaqAnswer | Intent::Runbook | Intent::Triage => {
                self.run_general_turn(&channel, &msg, &text, &classification, &session_id, budget_warning.as_deref())
                    .await;
            }
        }
    }

    async fn capture_and_reply(
        &self,
        channel: &str,
        msg: &InboundMessage,
        text: &str,
        classification: &Classification,
        _session_id: &str,
        budget_warning: Option<&str>,
    ) {
        let ticket = self.inner.backlog.create(NewTicket {
            title: &first_line(text),
            requester: &msg.user,
            channel,
            summary: text,
            requested_outcome: "triaged by a human",
            impact: "unassessed",
            handoff_target: HandoffTarget::BacklogTriage,
            status: "ideas",
            intent: classification.intent.as_str(),
            handoff_payload: None,
            linked_plan_files: &[],
        });

        let ticket_id = match ticket {
            Ok(t) => Some(t.ticket_id),
            Err(e) => {
                self.audit_error(channel, "capture_ticket", e);
                None
            }
        };

        let mut block = render_policy_block(classification, ticket_id.as_deref(), next_step_for(classification.intent));
        if let Some(w) = budget_warning {
            block.push_str(w);
        }
        self.reply(channel, msg.thread_ts.as_deref(), &block).await;
    }

    async fn handoff_and_reply(
        &self,
        channel: &str,
        msg: &InboundMessage,
        text: &str,
        classification: &Classification,
        _session_id: &str,
        budget_warning: Option<&str>,
    ) {
        let handoff_files = find_top_handoff_files(&self.tasks_dir(), text, HANDOFF_FILE_COUNT);
        let payload = if handoff_files.is_empty() {
            None
        } else {
            Some(handoff_files.join(","))
        };

        let ticket = self.inner.backlog.create(NewTicket {
            title: &first_line(text),
            requester: &msg.user,
            channel,
            summary: text,
            requested_outcome: "implemented and shipped",
            impact: "unassessed",
            handoff_target: HandoffTarget::ClaudeCode,
            status: "handoff",
            intent: classification.intent.as_str(),
            handoff_payload: payload.as_deref(),
            linked_plan_files: &handoff_files,
        });

        let ticket_id = match ticket {
            Ok(t) => Some(t.ticket_id),
            Err(e) => {
                self.audit_error(channel, "handoff_ticket", e);
                None
            }
        };

        let mut block = render_policy_block(classification, ticket_id.as_deref(), next_step_for(classification.intent));
        if !handoff_files.is_empty() {
            block.push_str(&format!("\n- related docs: {}", handoff_files.join(", ")));
        }
        if let Some(w) = budget_warning {
            block.push_str(w);
        }
        self.reply(channel, msg.thread_ts.as_deref(), &block).await;
    }

    async fn run_persona_turn(
        &self,
        persona: Persona,
        channel: &str,
        msg: &InboundMessage,
        text: &str,
        session_id: &str,
        metadata: SessionMetadata,
        budget_warning: Option<&str>,
    ) {
        let (reply, new_metadata) = match persona {
            Persona::Brainstormer => {
                let turn = brainstormer::run_turn(
                    &*self.inner.llm,
                    &self.inner.backlog,
                    &self.inner.config.model.default_model,
                    self.inner.config.model.max_tokens,
                    &msg.user,
                    channel,
                    text,
                    metadata,
                )
                .await;
                match turn {
                    Ok(t) => {
                        if let Some(ticket) = &t.ticket {
                            info!(ticket_id = %ticket.ticket_id, "brainstormer produced a ticket");
                        }
                        if let Some(file) = &t.task_file {
                            self.write_task_file(channel, file);
                        }
                        (t.reply, t.metadata)
                    }
                    Err(e) => {
                        self.audit_error(channel, "brainstormer", e);
                        ("Something went wrong running the brainstorm. Let's try again.".to_string(), metadata_default())
                    }
                }
            }
            Persona::Planner => {
                let (model, _) = select_model(text, &self.inner.config.model.default_model, &self.inner.config.model.heavy_model);
                let price = ian_budget::price_for(&model);
                let context_needed = metadata.planner_state.is_none();
                let doc_dirs = self.doc_dirs();
                let doc_dir_refs: Vec<&Path> = doc_dirs.iter().map(|p| p.as_path()).collect();
                let context_payload = if context_needed {
                    Some(build_planner_context(None, None, &doc_dir_refs))
                } else {
                    None
                };
                let turn = planner::run_turn(
                    &*self.inner.llm,
                    &self.inner.backlog,
                    &model,
                    self.inner.config.model.max_tokens,
                    &msg.user,
                    channel,
                    text,
                    context_payload.as_deref(),
                    price.input,
                    price.output,
                    metadata,
                )
                .await;
                match turn {
                    Ok(t) => {
                        if let Some(cost) = t.cost {
                            self.inner.audit.record(
                                AuditEvent::CostEvent,
                                json!({ "channel": channel, "api_cost_usd": cost.api_cost_usd, "user_facing_cost_usd": cost.user_facing_cost_usd }),
                            );
                        }
                        if let Some(ticket) = &t.ticket {
                            info!(ticket_id = %ticket.ticket_id, "planner produced a plan ticket");
                        }
                        (t.reply, t.metadata)
                    }
                    Err(e) => {
                        self.audit_error(channel, "planner", e);
                        ("Something went wrong drafting the plan. Let's try again.".to_string(), metadata_default())
                    }
                }
            }
            Persona::General => unreachable!("General never reaches run_persona_turn"),
        };

        if let Err(e) = self.inner.sessions.set_metadata(session_id, &new_metadata) {
            self.audit_error(channel, "set_metadata", e);
        }
        self.record_turn_pair(session_id, text, &reply, None, Default::default());
        self.inner.audit.record(AuditEvent::AgentReply, json!({ "channel": channel, "persona": persona.to_string() }));
        let mut outgoing = reply;
        if let Some(w) = budget_warning {
            outgoing.push_str(w);
        }
        self.reply(channel, msg.thread_ts.as_deref(), &outgoing).await;
    }

    fn write_task_file(&self, channel: &str, file: &ian_persona::task_file::TaskFile) {
        let dir = self.tasks_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            self.audit_error(channel, "task_file_mkdir", e);
            return;
        }
        if let Err(e) = std::fs::write(dir.join(&file.filename), &file.content) {
            self.audit_error(channel, "task_file_write", e);
        }
    }

    async fn run_general_turn(
        &self,
        channel: &str,
        msg: &InboundMessage,
        text: &str,
        classification: &Classification,
        session_id: &str,
        budget_warning: Option<&str>,
    ) {
        let (model, reason) = select_model(text, &self.inner.config.model.default_model, &self.inner.config.model.heavy_model);
        self.inner
            .audit
            .record(AuditEvent::ModelSelected, json!({ "channel": channel, "model": model, "reason": reason }));

        let system = SystemPrompt {
            static_tier: general_static_tier(),
            user_tier: render_policy_block(classification, None, next_step_for(classification.intent)),
            volatile_tier: format!("Current channel: {channel}"),
        };

        if let Err(e) = self
            .inner
            .sessions
            .append_turn(session_id, TurnRole::User, text, None, 0, 0, 0, 0)
        {
            self.audit_error(channel, "append_user_turn", e);
            return;
        }

        let window = match self.inner.sessions.get_messages(session_id) {
            Ok(w) => w,
            Err(e) => {
                self.audit_error(channel, "get_messages", e);
                return;
            }
        };
        let messages = to_llm_messages(&window);
        let allowed = classification.intent.allowed_tools();

        let outcome = run_with_tools(
            &*self.inner.llm,
            &self.inner.approval,
            &self.inner.tools,
            &self.inner.audit,
            channel,
            allowed,
            &model,
            system,
            &messages,
            self.inner.config.model.max_tokens,
        )
        .await;

        let outcome = match outcome {
            Ok(o) => o,
            Err(e) => {
                self.audit_error(channel, "tool_loop", e);
                self.reply(channel, msg.thread_ts.as_deref(), "I ran into an error producing a reply. Please try again.")
                    .await;
                return;
            }
        };

        if let Some(usage) = &outcome.usage {
            match self.inner.budget.record_usage(
                &outcome.model,
                usage.input_tokens,
                usage.output_tokens,
                usage.cache_creation_input_tokens,
                usage.cache_read_input_tokens,
            ) {
                Ok(cost) => {
                    self.inner
                        .audit
                        .record(AuditEvent::CostEvent, json!({ "channel": channel, "model": outcome.model, "cost_usd": cost }));
                }
                Err(e) => self.audit_error(channel, "record_usage", e),
            }
        }

        let usage = outcome.usage.clone().unwrap_or_default();
        if let Err(e) = self.inner.sessions.append_turn(
            session_id,
            TurnRole::Assistant,
            &outcome.text,
            Some(&outcome.model),
            usage.input_tokens,
            usage.output_tokens,
            usage.cache_creation_input_tokens,
            usage.cache_read_input_tokens,
        ) {
            self.audit_error(channel, "append_assistant_turn", e);
        }

        if outcome.hit_max_rounds {
            warn!(channel, "tool loop hit its round cap without a final answer");
        }

        self.inner
            .audit
            .record(AuditEvent::AgentReply, json!({ "channel": channel, "model": outcome.model }));
        let mut outgoing = outcome.text;
        if let Some(w) = budget_warning {
            outgoing.push_str(w);
        }
        self.reply(channel, msg.thread_ts.as_deref(), &outgoing).await;
    }

    fn record_turn_pair(&self, session_id: &str, user_text: &str, reply: &str, model: Option<&str>, usage: ian_tools::Usage) {
        if let Err(e) = self
            .inner
            .sessions
            .append_turn(session_id, TurnRole::User, user_text, None, 0, 0, 0, 0)
        {
            warn!(error = %e, "failed to append user turn");
        }
        if let Err(e) = self.inner.sessions.append_turn(
            session_id,
            TurnRole::Assistant,
            reply,
            model,
            usage.input_tokens,
            usage.output_tokens,
            usage.cache_creation_input_tokens,
            usage.cache_read_input_tokens,
        ) {
            warn!(error = %e, "failed to append assistant turn");
        }
    }

    async fn run_admin_command(&self, cmd: AdminCommand, channel: &str) -> String {
        match cmd {
            AdminCommand::Status => match self.inner.budget.check() {
                Ok(s) => format!(
                    "**Status**\n- daily spend: ${:.2} / ${:.2}\n- monthly spend: ${:.2} / ${:.2}\n- blocked: {}",
                    s.daily_spent, s.daily_limit, s.monthly_spent, s.monthly_limit, s.is_blocked()
                ),
                Err(e) => format!("couldn't read budget status: {e}"),
            },
            AdminCommand::Help => ADMIN_HELP.to_string(),
            AdminCommand::Cost => match self.inner.budget.recent(10) {
                Ok(events) => {
                    if events.is_empty() {
                        "No recorded model calls yet.".to_string()
                    } else {
                        let mut out = String::from("**Recent model calls**\n");
                        for e in events {
                            out.push_str(&format!("- {} — {} (${:.4})\n", e.created_at, e.model, e.cost_usd));
                        }
                        out
                    }
                }
                Err(e) => format!("couldn't read recent usage: {e}"),
            },
            AdminCommand::Budget => match self.inner.budget.check() {
                Ok(s) => format!(
                    "**Budget**\ndaily: ${:.2}/${:.2} ({}warned)\nmonthly: ${:.2}/${:.2} ({}warned)",
                    s.daily_spent,
                    s.daily_limit,
                    if s.daily_warn { "" } else { "not " },
                    s.monthly_spent,
                    s.monthly_limit,
                    if s.monthly_warn { "" } else { "not " }
                ),
                Err(e) => format!("couldn't read budget: {e}"),
            },
            AdminCommand::Memory(query) => {
                if query.is_empty() {
                    return "Usage: `!memory <search terms>`".to_string();
                }
                match self.inner.notes.search(&query, 5) {
                    Ok(notes) if notes.is_empty() => format!("No notes matched \"{query}\"."),
                    Ok(notes) => {
                        let mut out = String::from("**Matching notes**\n");
                        for n in notes {
                            out.push_str(&format!("- `{}`: {}\n", n.key, first_line(&n.content)));
                        }
                        out
                    }
                    Err(e) => format!("note search failed: {e}"),
                }
            }
            AdminCommand::Tools => {
                let names: Vec<&str> = self.inner.tools.all().iter().map(|t| t.name()).collect();
                format!("**Registered tools**\n{}", names.join(", "))
            }
            AdminCommand::History(n) => match self.inner.sessions.get_or_create_active(channel) {
                Ok(session) => match self.inner.sessions.all_turns(&session.id) {
                    Ok(turns) => {
                        let mut out = String::from("**Recent turns**\n");
                        for t in turns.iter().rev().take(n).collect::<Vec<_>>().into_iter().rev() {
                            out.push_str(&format!("- {}: {}\n", t.role.as_str(), first_line(&t.content)));
                        }
                        out
                    }
                    Err(e) => format!("couldn't read history: {e}"),
                },
                Err(e) => format!("couldn't load session: {e}"),
            },
            AdminCommand::Health => "ok".to_string(),
            AdminCommand::Reload => "Config changes require a process restart; live reload isn't supported.".to_string(),
            AdminCommand::Reset => match self.inner.sessions.get_or_create_active(channel) {
                Ok(session) => match self.inner.sessions.end_session(&session.id) {
                    Ok(()) => "Session reset. The next message starts a fresh conversation.".to_string(),
                    Err(e) => format!("couldn't reset session: {e}"),
                },
                Err(e) => format!("couldn't load session: {e}"),
            },
        }
    }
}

#[async_trait]
impl MessageHandler for Dispatcher {
    async fn handle(&self, msg: InboundMessage) {
        self.dispatch(msg).await;
    }
}

fn to_llm_messages(window: &[WindowMessage]) -> Vec<Message> {
    window
        .iter()
        .map(|w| Message {
            role: match w.role {
                TurnRole::User => Role::User,
                TurnRole::Assistant => Role::Assistant,
            },
            content: w.content.clone(),
        })
        .collect()
}

fn first_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or(text).trim();
    let capped: String = line.chars().take(120).collect();
    if capped.is_empty() {
        "(untitled)".to_string()
    } else {
        capped
    }
}

fn metadata_default() -> SessionMetadata {
    SessionMetadata::default()
}

const ADMIN_HELP: &str = "\
**Admin commands**
- `!status` — budget + session overview
- `!cost` — recent model call costs
- `!budget` — daily/monthly spend against limits
- `!memory <query>` — search saved notes
- `!tools` — list registered tools
- `!history [n]` — last n turns in this channel
- `!health` — liveness check
- `!reload` — reload configuration (requires restart)
- `!reset` — end the active session in this channel";
