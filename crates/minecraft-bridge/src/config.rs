//! Launch configuration for the Minecraft server process

use craft_mcp_core::{CraftError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// camelCase spellings accepted for the launch settings
const CAMEL_CASE_KEYS: &[(&str, &str)] = &[
    ("serverRootPath", "server_root_path"),
    ("serverJarFile", "server_jar_file"),
    ("javaPath", "java_path"),
    ("jvmMemoryArgs", "jvm_memory_args"),
    ("serverLogFile", "server_log_file"),
    ("startupTimeout", "startup_timeout"),
    ("shutdownCommand", "shutdown_command"),
];

/// Configuration for the Minecraft bridge.
///
/// Every field has a default, so a partial JSON object is merged over the
/// defaults when deserialized. Launch settings also accept camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinecraftConfig {
    /// Server root directory, used as the child's working directory
    #[serde(alias = "serverRootPath")]
    pub server_root_path: PathBuf,
    /// Server jar, relative to the root directory
    #[serde(alias = "serverJarFile")]
    pub server_jar_file: String,
    /// Java executable
    #[serde(alias = "javaPath")]
    pub java_path: String,
    /// JVM memory arguments, whitespace separated
    #[serde(alias = "jvmMemoryArgs")]
    pub jvm_memory_args: String,
    /// Server log file. Informational only, resolved under the root by `check`
    #[serde(alias = "serverLogFile")]
    pub server_log_file: PathBuf,
    /// Seconds to allow for server startup (approximate)
    #[serde(alias = "startupTimeout")]
    pub startup_timeout: u64,
    /// Console command that stops the server gracefully
    #[serde(alias = "shutdownCommand")]
    pub shutdown_command: String,
    /// Game version, logged when the bridge starts
    pub game_version: String,
    /// Seconds to wait for a command's response
    pub command_timeout: u64,
    /// Optional prompt file for `minecraft_prompt`
    pub prompt_path: Option<PathBuf>,
    /// Run console commands one at a time, end to end
    pub serialize_commands: bool,
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            server_root_path: PathBuf::from("./minecraft_server/"),
            server_jar_file: "minecraft_server.1.20.2.jar".to_string(),
            java_path: "java".to_string(),
            jvm_memory_args: "-Xms1024M -Xmx1024M".to_string(),
            server_log_file: PathBuf::from("minecraft.log"),
            startup_timeout: 5,
            shutdown_command: "stop".to_string(),
            game_version: "1.20.2".to_string(),
            command_timeout: 3,
            prompt_path: None,
            serialize_commands: true,
        }
    }
}

impl MinecraftConfig {
    /// Merge a JSON object over this configuration
    pub fn merge_json(&self, overrides: &serde_json::Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                let key = CAMEL_CASE_KEYS
                    .iter()
                    .find(|(camel, _)| *camel == key.as_str())
                    .map_or(key.as_str(), |(_, snake)| *snake);
                base.insert(key.to_string(), value.clone());
            }
        } else if !overrides.is_null() {
            return Err(CraftError::Config(
                "minecraft config must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Validate required fields and resolve the log file under the root
    pub fn check(&mut self) -> Result<()> {
        if self.server_root_path.as_os_str().is_empty() {
            return Err(CraftError::Config(
                "server_root_path cannot be empty".to_string(),
            ));
        }
        if self.server_jar_file.is_empty() {
            return Err(CraftError::Config(
                "server_jar_file cannot be empty".to_string(),
            ));
        }
        if self.java_path.is_empty() {
            return Err(CraftError::Config("java_path cannot be empty".to_string()));
        }
        if self.shutdown_command.is_empty() {
            return Err(CraftError::Config(
                "shutdown_command cannot be empty".to_string(),
            ));
        }
        if self.command_timeout == 0 {
            return Err(CraftError::Config(
                "command_timeout must be at least 1 second".to_string(),
            ));
        }

        let file_name = self
            .server_log_file
            .file_name()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("minecraft.log"));
        self.server_log_file = self.server_root_path.join(file_name);
        Ok(())
    }

    /// Command timeout as a duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}
