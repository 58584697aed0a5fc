use clap::Parser;
use ian_core::IanConfig;
use ian_gateway::build::Collaborators;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ian-gateway", about = "IAN message dispatch and orchestration engine")]
struct Cli {
    /// Path to the TOML config file. Defaults to $HOME/.ian/ian.toml.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "ian=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Config validation is fatal, not a graceful-degrade default: an IAN
    // process that can't resolve its owner id or control channel must not
    // start at all.
    let config = match IanConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration invalid, refusing to start");
            std::process::exit(1);
        }
    };

    info!(
        control_channel = %config.platform.control_channel_id,
        client_channels = config.platform.client_channel_ids.len(),
        "configuration loaded"
    );

    // The chat platform wire protocol, the model HTTP client, and the tool
    // backend (real filesystem/shell/search access) are out of scope for
    // this workspace — it implements the dispatch/orchestration engine that
    // sits between them, not the collaborators themselves. This binary
    // cannot proceed past config + schema validation without them; an
    // embedding application links this crate as a library and calls
    // `ian_gateway::build` with concrete implementations instead of
    // running this `main` directly.
    let collaborators = match load_collaborators() {
        Some(c) => c,
        None => {
            info!(
                "no chat platform / model client / tool backend wired in — \
                 config is valid; see ian_gateway::build for the composition \
                 entry point an embedding binary should call"
            );
            return Ok(());
        }
    };

    let gateway = ian_gateway::build(config, collaborators).await?;
    gateway.run_until_shutdown().await;
    Ok(())
}

/// Placeholder for the embedding application's collaborator wire-up. Always
/// `None` in this workspace — the concrete `ChatPlatform`/`LlmClient`/
/// `ToolBackend` implementations live outside its scope.
fn load_collaborators() -> Option<Collaborators> {
    None
}
