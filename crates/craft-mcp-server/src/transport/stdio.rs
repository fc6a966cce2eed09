//! stdio transport for MCP JSON-RPC

use crate::McpServer;
use crate::mcp::{
    DEFAULT_PROTOCOL_VERSION, InitializeParams, InitializeResult, ListChanged, Request,
    RequestId, ResourcesCapability, Response, ServerCapabilities,
};
use crate::tools::{PromptGetParams, ToolCallParams, handle_prompt_get, handle_tool_call};
use craft_mcp_core::{CraftError, Result, error_codes};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// Run the MCP server on stdio
pub async fn run(server: &McpServer) -> Result<()> {
    info!("craft-mcp server starting on stdio");
    let reader = BufReader::new(tokio::io::stdin());
    serve(server, reader, tokio::io::stdout()).await
}

/// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`,
/// until end of input
pub async fn serve<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            info!("Client disconnected (EOF)");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let response = match serde_json::from_str::<Request>(trimmed) {
            Ok(request) => handle_request(request, server).await,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                Some(Response::error(
                    RequestId::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };
        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    let json = serde_json::to_string(response)?;
    debug!("Sending: {}", json);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

async fn handle_request(request: Request, server: &McpServer) -> Option<Response> {
    let Some(id) = request.id.clone() else {
        debug!("Notification: {}", request.method);
        return None;
    };

    if request.jsonrpc != "2.0" {
        let err = CraftError::Protocol(format!("unsupported jsonrpc version: {}", request.jsonrpc));
        return Some(Response::error(id, err.code(), err.to_string()));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(&request, id, server),
        "ping" => Response::success(id, serde_json::json!({})),
        "tools/list" => Response::success(
            id,
            serde_json::json!({ "tools": server.registry().list_tools() }),
        ),
        "tools/call" => match parse_params::<ToolCallParams>(&request, &id) {
            Ok(params) => handle_tool_call(params, id, server.registry()).await,
            Err(resp) => resp,
        },
        "prompts/list" => Response::success(
            id,
            serde_json::json!({ "prompts": server.registry().list_prompts() }),
        ),
        "prompts/get" => match parse_params::<PromptGetParams>(&request, &id) {
            Ok(params) => handle_prompt_get(params, id, server.registry()).await,
            Err(resp) => resp,
        },
        "resources/list" => handle_resources_list(id, server),
        "resources/read" => handle_resources_read(&request, id, server),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    };

    Some(response)
}

fn parse_params<T: DeserializeOwned>(
    request: &Request,
    id: &RequestId,
) -> std::result::Result<T, Response> {
    serde_json::from_value(request.params.clone()).map_err(|e| {
        Response::error(
            id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid {} params: {}", request.method, e),
        )
    })
}

fn handle_initialize(request: &Request, id: RequestId, server: &McpServer) -> Response {
    let params: InitializeParams = match parse_params(request, &id) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Some(client) = &params.client_info {
        info!("Client connected: {} {}", client.name, client.version);
    }

    let protocol_version = if params.protocol_version.is_empty() {
        DEFAULT_PROTOCOL_VERSION.to_string()
    } else {
        params.protocol_version
    };

    let result = InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities {
            tools: ListChanged {
                list_changed: false,
            },
            prompts: ListChanged {
                list_changed: false,
            },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
            logging: serde_json::json!({}),
        },
        server_info: server.info().clone(),
    };

    match serde_json::to_value(result) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn handle_resources_list(id: RequestId, server: &McpServer) -> Response {
    let resources: Vec<_> = server
        .registry()
        .services()
        .iter()
        .map(|s| {
            serde_json::json!({
                "uri": format!("config://{}", s.name()),
                "name": format!("{} configuration", s.name()),
                "description": "Effective service configuration",
                "mimeType": "application/json"
            })
        })
        .collect();

    Response::success(id, serde_json::json!({ "resources": resources }))
}

fn handle_resources_read(request: &Request, id: RequestId, server: &McpServer) -> Response {
    #[derive(serde::Deserialize)]
    struct ReadParams {
        uri: String,
    }

    let params: ReadParams = match parse_params(request, &id) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let service = params
        .uri
        .strip_prefix("config://")
        .and_then(|name| server.registry().service(name));
    let Some(service) = service else {
        return Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Unknown resource: {}", params.uri),
        );
    };

    let text = serde_json::to_string_pretty(&service.config()).unwrap_or_else(|_| "{}".into());
    Response::success(
        id,
        serde_json::json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": "application/json",
                "text": text
            }]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::EchoService;
    use std::sync::Arc;

    fn server() -> McpServer {
        let mut server = McpServer::new("craft-mcp", "test");
        server
            .register(Arc::new(EchoService { name: "echo", tool: "echo" }))
            .unwrap();
        server
    }

    async fn exchange(server: &McpServer, input: &str) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        serve(server, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let responses = exchange(&server, input).await;

        // The notification gets no reply
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "craft-mcp");
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"echo","arguments":{"x":1}}}"#,
            "\n",
        );
        let responses = exchange(&server, input).await;
        assert_eq!(responses[0]["id"], "a");
        assert_eq!(responses[0]["result"]["isError"], false);
        assert_eq!(responses[0]["result"]["content"][0]["text"], r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_params() {
        let server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"nope"}"#,
            "\n",
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{}}"#,
            "\n",
        );
        let responses = exchange(&server, input).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["error"]["code"], error_codes::METHOD_NOT_FOUND);
        assert_eq!(responses[1]["error"]["code"], error_codes::PARSE_ERROR);
        assert!(responses[1]["id"].is_null());
        assert_eq!(responses[2]["error"]["code"], error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let server = server();
        let input = concat!(r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#, "\n");
        let responses = exchange(&server, input).await;
        assert_eq!(responses[0]["id"], 4);
        assert_eq!(responses[0]["error"]["code"], error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_read_error_is_io() {
        let server = server();
        let reader = tokio_test::io::Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            .build();
        let err = serve(&server, BufReader::new(reader), Vec::new()).await.unwrap_err();
        assert!(matches!(err, CraftError::Io(_)));
    }

    #[tokio::test]
    async fn test_config_resource() {
        let server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"uri":"config://echo"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"config://missing"}}"#,
            "\n",
        );
        let responses = exchange(&server, input).await;
        assert_eq!(responses[0]["result"]["resources"][0]["uri"], "config://echo");
        assert_eq!(responses[1]["result"]["contents"][0]["text"], "{}");
        assert!(responses[2]["error"].is_object());
    }
}
