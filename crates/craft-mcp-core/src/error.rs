//! Error types for craft-mcp

use thiserror::Error;

/// Result type for craft-mcp operations
pub type Result<T> = std::result::Result<T, CraftError>;

/// craft-mcp error types
#[derive(Debug, Error)]
pub enum CraftError {
    /// Invalid launch or service configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipe creation or process start failed
    #[error("Launch error: {0}")]
    Launch(String),

    /// A start was requested while the process is already up
    #[error("Server process is already running")]
    AlreadyRunning,

    /// Tool arguments failed validation
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Tool name not registered with any service
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Prompt name not registered with any service
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CraftError {
    fn from(err: serde_json::Error) -> Self {
        CraftError::Serialization(err.to_string())
    }
}

impl CraftError {
    /// JSON-RPC error code used when this error crosses the protocol boundary
    pub fn code(&self) -> i32 {
        match self {
            CraftError::InvalidParams(_) | CraftError::Serialization(_) => {
                error_codes::INVALID_PARAMS
            }
            CraftError::UnknownTool(_) | CraftError::UnknownPrompt(_) => {
                error_codes::INVALID_PARAMS
            }
            CraftError::Protocol(_) => error_codes::INVALID_REQUEST,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
