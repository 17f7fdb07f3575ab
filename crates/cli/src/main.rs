mod config;
mod error;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use mcp::{McpServer, ToolRegistry};
use platform::PlatformClient;
use tools::{ProjectShell, ToolContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides, Settings, StoredConfig};
use error::Result;

const INSTRUCTIONS: &str = "Tools for managing a Blaxel workspace: workspaces, integration \
connections, service accounts, sandboxes and members, plus local project scaffolding and \
deployment through the bl command-line tool.";

#[derive(Parser)]
#[command(name = "blaxel-mcp")]
#[command(about = "MCP server for the Blaxel platform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./blaxel-mcp.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only register tools that do not modify anything
    #[arg(long, global = true, env = "BL_READ_ONLY", value_parser = FalseyValueParser::new())]
    read_only: bool,

    /// Blaxel workspace
    #[arg(long, global = true, env = "BL_WORKSPACE")]
    workspace: Option<String>,

    /// Blaxel API base URL
    #[arg(long, global = true, env = "BL_API_URL")]
    api_url: Option<String>,

    /// Blaxel API key
    #[arg(long, global = true, env = "BL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Executable used by the local project tools
    #[arg(long, global = true, env = "BL_COMMAND")]
    bl_command: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,
    /// Print the tools that would be registered
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let registry = build_registry(&settings)?;

    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(registry, &settings).await,
        Some(Commands::Tools) => cmd_tools(&registry),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let config = Config::discover(cli.config.as_deref())?;

    let stored = match StoredConfig::default_path() {
        Some(path) => StoredConfig::load(&path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring Blaxel CLI credentials");
            StoredConfig::default()
        }),
        None => StoredConfig::default(),
    };

    let overrides = Overrides {
        read_only: cli.read_only,
        workspace: cli.workspace.clone(),
        api_url: cli.api_url.clone(),
        api_key: cli.api_key.clone(),
        command: cli.bl_command.clone(),
    };
    Ok(Settings::resolve(overrides, config, &stored))
}

fn build_registry(settings: &Settings) -> Result<ToolRegistry> {
    let context = Arc::new(tool_context(settings));
    let shell = Arc::new(
        ProjectShell::new()
            .with_command(&settings.command)
            .with_workspace(settings.workspace.clone()),
    );

    let mut registry = ToolRegistry::new();
    tools::register_all(&mut registry, &settings.policy, &context, &shell)?;
    info!(
        registered = registry.len(),
        suppressed = registry.suppressed().len(),
        read_only = settings.policy.read_only,
        "tools registered"
    );
    Ok(registry)
}

/// A missing or invalid client is not fatal: the tools still register and
/// report why they cannot run.
fn tool_context(settings: &Settings) -> ToolContext<PlatformClient> {
    let client = settings.credentials().and_then(|credentials| {
        PlatformClient::builder(credentials)
            .api_url(&settings.api_url)
            .build()
    });

    match client {
        Ok(client) => {
            info!(workspace = client.workspace(), api_url = client.api_url(), "Blaxel client ready");
            ToolContext::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Blaxel client unavailable; remote tools will fail");
            ToolContext::unavailable(e.to_string())
        }
    }
}

async fn cmd_serve(registry: ToolRegistry, settings: &Settings) -> Result<()> {
    let mut instructions = INSTRUCTIONS.to_string();
    if settings.policy.read_only {
        instructions.push_str(" Read-only mode: tools that modify resources are not available.");
    }

    McpServer::new(registry)
        .with_instructions(instructions)
        .serve_stdio()
        .await?;
    Ok(())
}

fn cmd_tools(registry: &ToolRegistry) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for descriptor in registry.descriptors() {
        writeln!(stdout, "{:<28}  {}", descriptor.name, descriptor.capability)?;
    }
    if !registry.suppressed().is_empty() {
        writeln!(stdout, "\n{} tools suppressed (read-only)", registry.suppressed().len())?;
    }
    Ok(())
}
