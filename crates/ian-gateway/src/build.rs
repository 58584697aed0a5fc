use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};

use ian_approval::ApprovalGate;
use ian_audit::AuditLogger;
use ian_backlog::BacklogManager;
use ian_budget::BudgetLedger;
use ian_channels::{ChannelRuntime, ChatPlatform};
use ian_core::types::{ChannelId, ChannelKind};
use ian_core::IanConfig;
use ian_dispatcher::{Dispatcher, RuntimeGate};
use ian_notes::NoteManager;
use ian_scheduler::{Job, Schedule, SchedulerEngine};
use ian_sessions::SessionManager;
use ian_tools::tools::filesystem_list::FilesystemListTool;
use ian_tools::tools::filesystem_read::FilesystemReadTool;
use ian_tools::tools::filesystem_write::FilesystemWriteTool;
use ian_tools::tools::shell_run::ShellRunTool;
use ian_tools::tools::web_search::WebSearchTool;
use ian_tools::{LlmClient, ToolBackend, ToolRegistry};

use crate::heartbeat;

/// Every collaborator this workspace treats as external and does not
/// implement: the chat platform wire protocol, the model HTTP client, and
/// the tool backend (real filesystem/shell/search access). An embedding
/// binary supplies concrete implementations; this crate only wires them
/// into the dispatch pipeline.
pub struct Collaborators {
    pub platform: Arc<dyn ChatPlatform>,
    pub llm: Arc<dyn LlmClient>,
    pub tool_backend: Arc<dyn ToolBackend>,
}

/// Everything `main` needs to run the process to completion.
pub struct Gateway {
    pub dispatcher: Dispatcher,
    channels: ChannelRuntime,
    scheduler_shutdown: watch::Sender<bool>,
    scheduler_task: tokio::task::JoinHandle<()>,
    heartbeat_task: tokio::task::JoinHandle<()>,
}

/// Open storage, build every manager, and assemble the `Dispatcher` plus
/// the channel poller/worker pool and the job scheduler. Storage migration
/// failure is fatal here — `open_and_migrate` returns an error rather than
/// limping along with a stale schema.
pub async fn build(config: IanConfig, collaborators: Collaborators) -> anyhow::Result<Gateway> {
    let Collaborators {
        platform,
        llm,
        tool_backend,
    } = collaborators;

    let sessions_conn =
        ian_storage::open_and_migrate(&config.storage.db_path).context("opening/migrating database")?;
    let budget_conn = ian_storage::open_existing(&config.storage.db_path).context("opening budget connection")?;
    let backlog_conn = ian_storage::open_existing(&config.storage.db_path).context("opening backlog connection")?;
    let notes_conn = ian_storage::open_existing(&config.storage.db_path).context("opening notes connection")?;
    let scheduler_conn = ian_storage::open_existing(&config.storage.db_path).context("opening scheduler connection")?;

    let sessions = SessionManager::with_token_budget(sessions_conn, config.storage.session_token_budget);
    let budget = BudgetLedger::new(
        budget_conn,
        config.budget.daily_limit_usd,
        config.budget.monthly_limit_usd,
        config.budget.warn_pct,
    );
    let audit = AuditLogger::new(config.storage.markdown_path.clone() + "/audit");
    let backlog = BacklogManager::new(backlog_conn);
    let notes = NoteManager::new(notes_conn);

    let approval = ApprovalGate::new(
        platform.clone(),
        ChannelId::from(config.platform.control_channel_id.clone()),
        config.platform.owner_user_id.clone(),
    )
    .with_timeout(Duration::from_secs(config.approval.timeout_secs));

    let tools = ToolRegistry::new(vec![
        Box::new(FilesystemReadTool::new(tool_backend.clone())),
        Box::new(FilesystemWriteTool::new(tool_backend.clone())),
        Box::new(FilesystemListTool::new(tool_backend.clone())),
        Box::new(ShellRunTool::new(tool_backend.clone())),
        Box::new(WebSearchTool::new(tool_backend.clone())),
    ]);

    let runtime_gate = RuntimeGate::new(config.runtime.enabled);

    let dispatcher = Dispatcher::new(
        config.clone(),
        platform.clone(),
        llm,
        sessions,
        budget,
        audit,
        backlog,
        notes,
        approval,
        tools,
        runtime_gate,
    );

    let mut channels = vec![(
        ChannelId::from(config.platform.control_channel_id.clone()),
        ChannelKind::Control,
    )];
    channels.extend(
        config
            .platform
            .client_channel_ids
            .iter()
            .map(|id| (ChannelId::from(id.clone()), ChannelKind::Client)),
    );

    // Resolved at startup so the poller never redelivers our own replies
    // back to ourselves. `ChatPlatform` models one bearer-token identity per
    // instance; a second ("heavy") publishing identity is a second
    // `ChatPlatform` the embedding binary would construct and whose id it
    // can fold into this set before calling `build`.
    let mut agent_user_ids: HashSet<String> = HashSet::new();
    match platform.whoami().await {
        Ok(id) => {
            agent_user_ids.insert(id);
        }
        Err(e) => tracing::warn!(error = %e, "could not resolve own identity at startup"),
    }

    let channel_runtime = ChannelRuntime::spawn(
        channels,
        platform.clone(),
        config.platform.owner_user_id.clone(),
        agent_user_ids,
        Duration::from_secs(config.platform.poll_interval_secs),
        {
            let dispatcher = dispatcher.clone();
            move || dispatcher.clone()
        },
    );

    let (scheduler_shutdown_tx, scheduler_shutdown_rx) = watch::channel(false);
    let (fired_tx, fired_rx) = mpsc::channel::<Job>(32);
    let engine = SchedulerEngine::new(scheduler_conn, Some(fired_tx)).context("starting scheduler engine")?;
    engine
        .add_job(
            "heartbeat",
            Schedule::Interval {
                every_secs: config.scheduler.heartbeat_interval_secs,
            },
            "heartbeat",
        )
        .context("scheduling heartbeat job")?;
    // Cron-based daily-briefing/weekly-digest jobs are deferred: the
    // scheduler's `Schedule::Cron` variant does not compute a `next_run`
    // yet (see `ian_scheduler::schedule::compute_next_run`).

    let scheduler_task = tokio::spawn(engine.run(scheduler_shutdown_rx));
    let heartbeat_task = tokio::spawn(heartbeat::run(
        fired_rx,
        dispatcher.clone(),
        config.scheduler.heartbeat_invokes_model,
    ));

    Ok(Gateway {
        dispatcher,
        channels: channel_runtime,
        scheduler_shutdown: scheduler_shutdown_tx,
        scheduler_task,
        heartbeat_task,
    })
}

impl Gateway {
    /// Run until ctrl-c, then shut every subsystem down in order: pollers
    /// first (bounded timeout), then the scheduler, then join the heartbeat
    /// consumer.
    pub async fn run_until_shutdown(self) {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");

        self.channels.shutdown(Duration::from_secs(10)).await;
        let _ = self.scheduler_shutdown.send(true);
        let _ = self.scheduler_task.await;
        self.heartbeat_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ian_core::types::InboundMessage;
    use ian_tools::{ChatRequest, ChatResponse, LlmError, Usage};

    struct NullPlatform;

    #[async_trait]
    impl ChatPlatform for NullPlatform {
        async fn fetch_since(
            &self,
            _channel: &ChannelId,
            _since_ts: Option<&str>,
            _limit: usize,
        ) -> ian_channels::error::Result<Vec<InboundMessage>> {
            Ok(Vec::new())
        }

        async fn post(&self, _channel: &ChannelId, _text: &str, _thread_ts: Option<&str>) -> ian_channels::error::Result<()> {
            Ok(())
        }

        async fn whoami(&self) -> ian_channels::error::Result<String> {
            Ok("U_AGENT".to_string())
        }
    }

    struct NullLlm;

    #[async_trait]
    impl LlmClient for NullLlm {
        fn name(&self) -> &str {
            "null"
        }

        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse, LlmError> {
            Ok(ChatResponse {
                content: "ok".to_string(),
                model: "null".to_string(),
                usage: Usage::default(),
                stop_reason: "end_turn".to_string(),
                tool_calls: Vec::new(),
            })
        }
    }

    struct NullToolBackend;

    #[async_trait]
    impl ToolBackend for NullToolBackend {
        async fn read_file(&self, _path: &str, _offset: Option<usize>, _limit: Option<usize>) -> Result<String, String> {
            Err("not wired".to_string())
        }
        async fn write_file(&self, _path: &str, _content: &str) -> Result<String, String> {
            Err("not wired".to_string())
        }
        async fn list_files(&self, _path: &str) -> Result<String, String> {
            Err("not wired".to_string())
        }
        async fn run_shell(&self, _command: &str) -> Result<String, String> {
            Err("not wired".to_string())
        }
        async fn web_search(&self, _query: &str, _max_results: usize) -> Result<String, String> {
            Err("not wired".to_string())
        }
    }

    fn test_config(db_path: &str, markdown_path: &str) -> IanConfig {
        let toml = format!(
            r#"
            [platform]
            owner_user_id = "U_OWNER"
            control_channel_id = "C_CONTROL"
            default_identity_token = "t1"
            heavy_identity_token = "t2"
            client_channel_ids = ["C_CLIENT"]

            [model]

            [storage]
            db_path = "{db_path}"
            markdown_path = "{markdown_path}"
            "#
        );
        let path = format!("{markdown_path}.toml");
        std::fs::write(&path, toml).unwrap();
        IanConfig::load(Some(&path)).unwrap()
    }

    #[tokio::test]
    async fn build_wires_every_subsystem_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ian.db");
        let markdown_path = dir.path().join("notes");
        let config = test_config(db_path.to_str().unwrap(), markdown_path.to_str().unwrap());

        let collaborators = Collaborators {
            platform: Arc::new(NullPlatform),
            llm: Arc::new(NullLlm),
            tool_backend: Arc::new(NullToolBackend),
        };

        let gateway = build(config, collaborators).await.expect("build should succeed");
        gateway.scheduler_shutdown.send(true).ok();
        gateway.scheduler_task.abort();
        gateway.heartbeat_task.abort();
    }
}
