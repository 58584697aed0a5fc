use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{IanError, Result};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_SESSION_TOKEN_BUDGET: u32 = 12_000;
pub const DEFAULT_SUMMARIZE_THRESHOLD: u32 = 60;
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 120;

/// Top-level configuration: `ian.toml` plus `IAN_`-prefixed environment
/// overrides. Loaded once at process start; failure to load or validate is
/// fatal, unlike the graceful degrade some chat-bot frameworks use for a
/// missing config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IanConfig {
    pub platform: PlatformConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub approval: ApprovalConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// User ID that is allowed to issue admin commands and approve/reject tools.
    pub owner_user_id: String,
    /// The single control channel; admin commands are only honored here.
    pub control_channel_id: String,
    /// Bearer token used when the agent replies under the default-model identity.
    pub default_identity_token: String,
    /// Bearer token used when the agent replies under the heavy-model identity.
    pub heavy_identity_token: String,
    /// Additional channels the agent monitors on behalf of external users.
    #[serde(default)]
    pub client_channel_ids: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub default_model: String,
    #[serde(default = "default_heavy_model_name")]
    pub heavy_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "bool_true")]
    pub prompt_cache_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_markdown_path")]
    pub markdown_path: String,
    #[serde(default = "default_session_token_budget")]
    pub session_token_budget: u32,
    #[serde(default = "default_summarize_threshold")]
    pub summarize_threshold: u32,
    #[serde(default)]
    pub startup_context_files: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            markdown_path: default_markdown_path(),
            session_token_budget: default_session_token_budget(),
            summarize_threshold: default_summarize_threshold(),
            startup_context_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_daily_limit")]
    pub daily_limit_usd: f64,
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit_usd: f64,
    #[serde(default = "default_warn_pct")]
    pub warn_pct: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit_usd: default_daily_limit(),
            monthly_limit_usd: default_monthly_limit(),
            warn_pct: default_warn_pct(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub filesystem: FilesystemToolConfig,
    #[serde(default)]
    pub shell: ShellToolConfig,
    #[serde(default)]
    pub search: SearchToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemToolConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default)]
    pub safe_roots: Vec<String>,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
}

impl Default for FilesystemToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            safe_roots: Vec::new(),
            deny_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellToolConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "bool_true")]
    pub requires_approval: bool,
    #[serde(default = "default_shell_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub blocked_commands: Vec<String>,
}

impl Default for ShellToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requires_approval: true,
            timeout_secs: default_shell_timeout_secs(),
            blocked_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchToolConfig {
    #[serde(default)]
    pub enabled: bool,
    pub api_key: Option<String>,
    #[serde(default = "default_search_max_results")]
    pub max_results: u32,
}

impl Default for SearchToolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            max_results: default_search_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default)]
    pub heartbeat_invokes_model: bool,
    #[serde(default = "default_daily_briefing_cron")]
    pub daily_briefing_cron: String,
    #[serde(default = "default_weekly_digest_cron")]
    pub weekly_digest_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            heartbeat_invokes_model: false,
            daily_briefing_cron: default_daily_briefing_cron(),
            weekly_digest_cron: default_weekly_digest_cron(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    #[serde(default = "default_approval_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_approval_timeout(),
        }
    }
}

/// Whether the dispatcher answers messages at all on process start. Checked
/// as pipeline step 3, ahead of session/budget work, and independently
/// flippable at runtime through `ian_dispatcher::RuntimeGate` without
/// reloading config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn bool_true() -> bool {
    true
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_model_name() -> String {
    "claude-haiku-4-5".to_string()
}
fn default_heavy_model_name() -> String {
    "claude-sonnet-4-6".to_string()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_session_token_budget() -> u32 {
    DEFAULT_SESSION_TOKEN_BUDGET
}
fn default_summarize_threshold() -> u32 {
    DEFAULT_SUMMARIZE_THRESHOLD
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.ian/ian.db")
}
fn default_markdown_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.ian/notes")
}
fn default_daily_limit() -> f64 {
    5.0
}
fn default_monthly_limit() -> f64 {
    100.0
}
fn default_warn_pct() -> f64 {
    0.8
}
fn default_shell_timeout_secs() -> u64 {
    30
}
fn default_search_max_results() -> u32 {
    5
}
fn default_heartbeat_interval() -> u64 {
    3600
}
fn default_daily_briefing_cron() -> String {
    "0 7 * * *".to_string()
}
fn default_weekly_digest_cron() -> String {
    "0 7 * * 1".to_string()
}
fn default_approval_timeout() -> u64 {
    DEFAULT_APPROVAL_TIMEOUT_SECS
}

impl IanConfig {
    /// Load config from a TOML file with `IAN_`-prefixed env var overrides.
    ///
    /// Unlike a graceful-degrade default, a missing or invalid config here is
    /// always an error: the process must refuse to start rather than run with
    /// an owner id of `""`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: IanConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("IAN_").split("_"))
            .extract()
            .map_err(|e| IanError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.platform.owner_user_id.trim().is_empty() {
            return Err(IanError::Config("platform.owner_user_id is required".into()));
        }
        if self.platform.control_channel_id.trim().is_empty() {
            return Err(IanError::Config(
                "platform.control_channel_id is required".into(),
            ));
        }
        if self.budget.warn_pct <= 0.0 || self.budget.warn_pct > 1.0 {
            return Err(IanError::Config("budget.warn_pct must be in (0, 1]".into()));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.ian/ian.toml")
}
