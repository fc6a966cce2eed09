//! Tool service trait

use async_trait::async_trait;
use craft_mcp_core::{CraftError, PromptDef, PromptOutput, Result, ToolDef, ToolOutput};

/// Trait for implementing a capability provider
///
/// Implement this trait to expose a set of tools (and optionally prompts)
/// through the MCP server. Each tool name must be unique across all services
/// registered with one server.
#[async_trait]
pub trait ToolService: Send + Sync + 'static {
    /// Service name, used for logging and the `config://` resource
    fn name(&self) -> &str;

    /// Tools this service handles
    fn tools(&self) -> Vec<ToolDef>;

    /// Execute a tool call.
    ///
    /// Failures the caller should read (bad arguments, a failed game command)
    /// are returned as `Ok` with an error [`ToolOutput`].
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolOutput>;

    /// Prompts this service provides
    fn prompts(&self) -> Vec<PromptDef> {
        Vec::new()
    }

    /// Render a prompt
    async fn get_prompt(&self, name: &str) -> Result<PromptOutput> {
        Err(CraftError::UnknownPrompt(name.to_string()))
    }

    /// Effective configuration, exposed read-only
    fn config(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    /// Called once when the server shuts down
    async fn shutdown(&self) -> Result<()>;
}
