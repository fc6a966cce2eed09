//! Minecraft bridge for craft-mcp
//!
//! Runs a local Minecraft server as a child process and drives it through
//! its console:
//!
//! - **Commands**: written to the server's stdin, one per line
//! - **Responses**: picked out of stdout by a marker classifier, since the
//!   console has no request/response framing
//!
//! The supervisor owns the process lifecycle, from launch through the
//! graceful `stop` sequence to a bounded forced teardown.

pub mod args;
mod bridge;
pub mod classifier;
pub mod commands;
mod config;
pub mod correlator;
pub mod pipe;
pub mod shutdown;
pub mod supervisor;

pub use bridge::{MinecraftBridge, PROMPT_NAME};
pub use classifier::{MarkerClassifier, ResponseClassifier, Verdict};
pub use config::MinecraftConfig;
pub use supervisor::{CommandOutcome, CommandResult, Phase, ProcessSupervisor, SupervisorConfig};
