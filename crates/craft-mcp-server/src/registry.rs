//! Mapping from tool and prompt names to the services that own them

use crate::service::ToolService;
use craft_mcp_core::{PromptDef, ToolDef};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of services and the names they answer to
#[derive(Default)]
pub struct ToolRegistry {
    services: Vec<Arc<dyn ToolService>>,
    tools: HashMap<String, usize>,
    prompts: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service and all of its tools and prompts.
    ///
    /// Nothing is registered if any name collides.
    pub fn register(&mut self, service: Arc<dyn ToolService>) -> Result<(), RegistryError> {
        let name = service.name().to_string();
        if self.services.iter().any(|s| s.name() == name) {
            return Err(RegistryError::DuplicateService(name));
        }

        let tools = service.tools();
        let prompts = service.prompts();
        if let Some(dup) = tools.iter().find(|t| self.tools.contains_key(&t.name)) {
            return Err(RegistryError::DuplicateTool(dup.name.clone()));
        }
        if let Some(dup) = prompts.iter().find(|p| self.prompts.contains_key(&p.name)) {
            return Err(RegistryError::DuplicatePrompt(dup.name.clone()));
        }

        let index = self.services.len();
        for tool in tools {
            self.tools.insert(tool.name, index);
        }
        for prompt in prompts {
            self.prompts.insert(prompt.name, index);
        }
        self.services.push(service);
        Ok(())
    }

    /// Service owning a tool
    pub fn tool_owner(&self, tool: &str) -> Option<&Arc<dyn ToolService>> {
        self.tools.get(tool).map(|&i| &self.services[i])
    }

    /// Service owning a prompt
    pub fn prompt_owner(&self, prompt: &str) -> Option<&Arc<dyn ToolService>> {
        self.prompts.get(prompt).map(|&i| &self.services[i])
    }

    /// Service by name
    pub fn service(&self, name: &str) -> Option<&Arc<dyn ToolService>> {
        self.services.iter().find(|s| s.name() == name)
    }

    /// All tools, in service registration order
    pub fn list_tools(&self) -> Vec<ToolDef> {
        self.services.iter().flat_map(|s| s.tools()).collect()
    }

    /// All prompts, in service registration order
    pub fn list_prompts(&self) -> Vec<PromptDef> {
        self.services.iter().flat_map(|s| s.prompts()).collect()
    }

    /// Registered services
    pub fn services(&self) -> &[Arc<dyn ToolService>] {
        &self.services
    }

    /// Number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Service already registered: {0}")]
    DuplicateService(String),
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
    #[error("Prompt already registered: {0}")]
    DuplicatePrompt(String),
}
