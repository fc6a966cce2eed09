//! # craft-mcp-server
//!
//! MCP server hosting craft-mcp tool services.
//!
//! This crate provides:
//! - `ToolService` trait for implementing capability providers
//! - MCP JSON-RPC protocol handling
//! - Tool/prompt name registry
//! - stdio transport

pub mod mcp;
pub mod registry;
pub mod service;
pub mod tools;
pub mod transport;

pub use registry::{RegistryError, ToolRegistry};
pub use service::ToolService;

use craft_mcp_core::Result;
use mcp::ServerInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// craft-mcp MCP server
pub struct McpServer {
    /// Services and the names they own
    registry: ToolRegistry,
    /// Reported in the initialize handshake
    info: ServerInfo,
    /// Set once services have been shut down
    shut_down: AtomicBool,
}

impl McpServer {
    /// Create a server with no services
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            registry: ToolRegistry::new(),
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            shut_down: AtomicBool::new(false),
        }
    }

    /// Register a service
    pub fn register(&mut self, service: Arc<dyn ToolService>) -> std::result::Result<(), RegistryError> {
        info!(service = service.name(), "Registering service");
        self.registry.register(service)
    }

    /// Run the server on stdio until the client disconnects
    pub async fn run_stdio(&self) -> Result<()> {
        transport::stdio::run(self).await
    }

    /// Shut down every registered service. Later calls do nothing.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        for service in self.registry.services() {
            info!(service = service.name(), "Shutting down service");
            if let Err(e) = service.shutdown().await {
                error!(service = service.name(), "Service shutdown failed: {}", e);
            }
        }
    }

    /// Service registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Server identity
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }
}
