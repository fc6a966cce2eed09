//! tools/call and prompts/get dispatch

use craft_mcp_core::{CraftError, ToolOutput, error_codes};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::mcp::{RequestId, Response};
use crate::registry::ToolRegistry;

/// Parameters for tools/call
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Parameters for prompts/get
#[derive(Debug, Deserialize)]
pub struct PromptGetParams {
    pub name: String,
}

/// Handle a tools/call request
///
/// Unknown tools are protocol errors. Anything a service reports, including
/// its own errors, goes back to the caller as a tool result.
pub async fn handle_tool_call(
    params: ToolCallParams,
    id: RequestId,
    registry: &ToolRegistry,
) -> Response {
    let Some(service) = registry.tool_owner(&params.name) else {
        let err = CraftError::UnknownTool(params.name);
        return Response::error(id, err.code(), err.to_string());
    };

    debug!(tool = %params.name, service = service.name(), "Dispatching tool call");
    let output = match service.call_tool(&params.name, params.arguments).await {
        Ok(output) => output,
        Err(e) => {
            warn!(tool = %params.name, "Tool call failed: {}", e);
            ToolOutput::error(e.to_string())
        }
    };

    match serde_json::to_value(output) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle a prompts/get request
pub async fn handle_prompt_get(
    params: PromptGetParams,
    id: RequestId,
    registry: &ToolRegistry,
) -> Response {
    let Some(service) = registry.prompt_owner(&params.name) else {
        let err = CraftError::UnknownPrompt(params.name);
        return Response::error(id, err.code(), err.to_string());
    };

    let result = service
        .get_prompt(&params.name)
        .await
        .and_then(|prompt| serde_json::to_value(prompt).map_err(CraftError::from));

    match result {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, e.code(), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::EchoService;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(EchoService { name: "echo", tool: "echo" }))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let params = ToolCallParams {
            name: "nope".into(),
            arguments: serde_json::json!({}),
        };
        let resp = handle_tool_call(params, RequestId::Number(1), &registry()).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert!(err.message.contains("nope"));
    }

    #[tokio::test]
    async fn test_tool_error_is_result() {
        let params = ToolCallParams {
            name: "echo".into(),
            arguments: serde_json::json!({ "fail": true }),
        };
        let resp = handle_tool_call(params, RequestId::Number(2), &registry()).await;
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "asked to fail");
    }

    #[tokio::test]
    async fn test_prompt_get() {
        let params = PromptGetParams {
            name: "echo_prompt".into(),
        };
        let resp = handle_prompt_get(params, RequestId::Number(3), &registry()).await;
        let result = resp.result.unwrap();
        assert_eq!(result["messages"][0]["role"], "user");
    }
}
