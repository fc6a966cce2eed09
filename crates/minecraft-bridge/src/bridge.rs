//! Minecraft bridge implementing the ToolService trait
//!
//! Game tools are rendered to console commands and written to the
//! supervised server's stdin.

use crate::commands::{build_command, tool_defs};
use crate::config::MinecraftConfig;
use crate::supervisor::{CommandResult, ProcessSupervisor, SupervisorConfig};
use async_trait::async_trait;
use craft_mcp_core::{CraftError, PromptDef, PromptOutput, Result, ToolDef, ToolOutput};
use craft_mcp_server::ToolService;
use tracing::{debug, error, info};

/// Name of the assistant prompt
pub const PROMPT_NAME: &str = "minecraft_prompt";

const DEFAULT_PROMPT: &str = "\
You are a Minecraft building assistant with expert knowledge of the game's \
commands and construction techniques. Help the player plan structures, write \
correct command syntax and fix commands that fail.

When suggesting commands:
- Give the complete command with concrete coordinates, e.g. /setblock 100 64 100 minecraft:stone
- Explain what each argument does
- Break large builds into ordered steps and prefer /fill and /clone for repeated shapes
- Point out the block handling modes (replace, destroy, keep, hollow, outline) where they matter
- Warn when a command touches a large area and may lag the server
- Mention the game version when syntax differs between versions

Use the minecraft_* tools to run commands on the connected server.
";

impl From<CommandResult> for ToolOutput {
    fn from(result: CommandResult) -> Self {
        if result.is_error {
            ToolOutput::error(result.text)
        } else {
            ToolOutput::text(result.text)
        }
    }
}

/// Bridge to a local Minecraft server driven through its console
pub struct MinecraftBridge {
    config: MinecraftConfig,
    supervisor: ProcessSupervisor,
}

impl MinecraftBridge {
    /// Create a bridge; the server is not started yet
    pub fn new(config: MinecraftConfig) -> Self {
        let supervisor = ProcessSupervisor::new(SupervisorConfig::from(&config));
        Self::with_supervisor(config, supervisor)
    }

    /// Create a bridge around an existing supervisor
    pub fn with_supervisor(config: MinecraftConfig, supervisor: ProcessSupervisor) -> Self {
        Self { config, supervisor }
    }

    /// Launch the server process
    pub async fn start(&self) -> Result<()> {
        info!(
            root = %self.config.server_root_path.display(),
            version = %self.config.game_version,
            "Starting Minecraft bridge"
        );
        self.supervisor.start().await
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn config(&self) -> &MinecraftConfig {
        &self.config
    }

    /// Run a raw console command
    pub async fn execute(&self, command: &str) -> CommandResult {
        self.supervisor.write_command(command).await.into_result()
    }

    async fn load_prompt(&self) -> PromptOutput {
        let Some(path) = &self.config.prompt_path else {
            return PromptOutput::user_text("Minecraft Command API", DEFAULT_PROMPT);
        };

        match tokio::fs::read_to_string(path).await {
            Ok(text) => PromptOutput::user_text("Minecraft Command API", text),
            Err(e) => {
                error!(path = %path.display(), "Failed to read prompt file, using default: {}", e);
                PromptOutput::user_text(
                    "Minecraft Command API - Error loading detailed prompt.",
                    DEFAULT_PROMPT,
                )
            }
        }
    }
}

#[async_trait]
impl ToolService for MinecraftBridge {
    fn name(&self) -> &str {
        "minecraft"
    }

    fn tools(&self) -> Vec<ToolDef> {
        tool_defs()
    }

    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolOutput> {
        let command = match build_command(name, arguments) {
            Ok(command) => command,
            Err(e @ CraftError::UnknownTool(_)) => return Err(e),
            Err(e) => {
                debug!(tool = name, "Rejected tool arguments: {}", e);
                return Ok(ToolOutput::error(e.to_string()));
            }
        };

        Ok(self.execute(&command).await.into())
    }

    fn prompts(&self) -> Vec<PromptDef> {
        vec![PromptDef {
            name: PROMPT_NAME.to_string(),
            description: "Minecraft building assistant instructions".to_string(),
        }]
    }

    async fn get_prompt(&self, name: &str) -> Result<PromptOutput> {
        if name != PROMPT_NAME {
            return Err(CraftError::UnknownPrompt(name.to_string()));
        }
        Ok(self.load_prompt().await)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Minecraft bridge");
        self.supervisor.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_mcp_core::Content;
    use serde_json::json;

    fn bridge() -> MinecraftBridge {
        MinecraftBridge::new(MinecraftConfig::default())
    }

    #[test]
    fn test_tools_and_prompts() {
        let bridge = bridge();
        let tools = bridge.tools();
        assert_eq!(tools.len(), 13);
        assert!(tools.iter().all(|t| t.name.starts_with("minecraft_")));
        assert_eq!(bridge.prompts()[0].name, PROMPT_NAME);
        assert_eq!(ToolService::config(&bridge)["shutdown_command"], "stop");
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_the_server() {
        let bridge = bridge();
        let out = bridge
            .call_tool("minecraft_setblock", json!({ "x": "0", "y": "0", "z": "0", "block": "stone" }))
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.first_text().unwrap().contains("invalid block ID format"));
    }

    #[tokio::test]
    async fn test_valid_command_without_server() {
        let bridge = bridge();
        let out = bridge
            .call_tool("minecraft_weather", json!({ "type": "clear" }))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.first_text(), Some("Minecraft server is not running"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let bridge = bridge();
        assert!(matches!(
            bridge.call_tool("minecraft_nope", json!({})).await,
            Err(CraftError::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_prompt_from_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minecraft.md");
        std::fs::write(&path, "Build castles.").unwrap();

        let bridge = MinecraftBridge::new(MinecraftConfig {
            prompt_path: Some(path),
            ..Default::default()
        });
        let prompt = bridge.get_prompt(PROMPT_NAME).await.unwrap();
        assert_eq!(
            prompt.messages[0].content,
            Content::Text { text: "Build castles.".to_string() }
        );

        let bridge = MinecraftBridge::new(MinecraftConfig {
            prompt_path: Some(dir.path().join("missing.md")),
            ..Default::default()
        });
        let prompt = bridge.get_prompt(PROMPT_NAME).await.unwrap();
        assert!(prompt.description.contains("Error loading"));
        assert_eq!(prompt.messages[0].role, "user");

        assert!(bridge.get_prompt("other").await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let bridge = bridge();
        bridge.shutdown().await.unwrap();
        bridge.shutdown().await.unwrap();
    }
}
