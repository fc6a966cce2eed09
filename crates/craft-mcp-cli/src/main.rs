//! craft-mcp server
//!
//! Starts the Minecraft server described by the configuration file and
//! serves its console tools over MCP on stdio.
//!
//! ```text
//! craft-mcp [--config <path>] [--debug] [--print-config]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use craft_mcp_server::McpServer;
use minecraft_bridge::{MinecraftBridge, MinecraftConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "craft-mcp")]
#[command(about = "Minecraft server console tools over MCP stdio")]
#[command(version)]
struct Options {
    /// JSON config file with a `minecraft` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long)]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Read the `minecraft` section of a JSON config file over the defaults
fn load_config(path: Option<&Path>) -> Result<MinecraftConfig> {
    let mut config = MinecraftConfig::default();
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let file: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        if let Some(section) = file.get("minecraft") {
            config = config.merge_json(section)?;
        }
    }
    config.check()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse();

    // stdout carries the protocol, so logs go to stderr
    let default_level = if options.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(options.config.as_deref())?;
    if options.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("craft-mcp v{} starting", env!("CARGO_PKG_VERSION"));

    let bridge = Arc::new(MinecraftBridge::new(config));
    if let Err(e) = bridge.start().await {
        // Tools still answer, reporting the server as not running
        warn!("Minecraft server did not start: {}", e);
    }

    let mut server = McpServer::new("craft-mcp", env!("CARGO_PKG_VERSION"));
    server.register(bridge)?;

    let interrupted = tokio::select! {
        result = server.run_stdio() => {
            if let Err(e) = result {
                warn!("stdio transport stopped: {}", e);
            }
            false
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            true
        }
    };

    server.shutdown().await;
    info!("craft-mcp stopped");

    if interrupted {
        // The blocking stdin read would otherwise hold the runtime open
        std::process::exit(0);
    }
    Ok(())
}
