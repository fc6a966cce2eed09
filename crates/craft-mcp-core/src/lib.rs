//! # craft-mcp-core
//!
//! Core types shared by the craft-mcp crates.
//!
//! This crate provides:
//! - The error taxonomy and JSON-RPC error codes
//! - Tool and prompt descriptors
//! - Tool call results

pub mod error;
pub mod tool;

pub use error::{CraftError, Result, error_codes};
pub use tool::{Content, PromptDef, PromptMessage, PromptOutput, ToolDef, ToolOutput};
