//! MCP-facing error taxonomy: maps [`marcus_core::CoordinatorError`] (and a
//! handful of protocol-layer failures that never reach the coordinator) to
//! JSON-RPC 2.0 error objects.

use serde_json::{json, Value};
use thiserror::Error;

use marcus_core::CoordinatorError;

/// Errors the transport and dispatch layer can produce, on top of whatever
/// the coordinator itself returns.
#[derive(Error, Debug, Clone)]
pub enum McpError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl McpError {
    /// JSON-RPC 2.0 error code. `-32601`/`-32602`/`-32700` are the standard
    /// codes for unknown method, bad params, and parse failure; the rest
    /// of this protocol's codes live in the `-3200x` application range.
    pub fn to_error_code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::Serialization(_) => -32700,
            McpError::Protocol(_) => -32000,
            McpError::Unauthorized => -32001,
            McpError::Coordinator(e) => match e {
                CoordinatorError::NotRegistered(_) => -32002,
                CoordinatorError::AlreadyRegistered(_) => -32003,
                CoordinatorError::AlreadyAssigned(_) => -32004,
                CoordinatorError::NotAssignedToAgent { .. } => -32005,
                CoordinatorError::Validation(_) => -32602,
                CoordinatorError::TaskNotFound(_) | CoordinatorError::AgentNotFound(_) => -32006,
                CoordinatorError::NoTaskAvailable => -32007,
                CoordinatorError::Provider(_) => -32008,
                CoordinatorError::Persistence(_) => -32009,
                CoordinatorError::Internal(_) => -32010,
            },
        }
    }

    /// The stable `error_code` string tool callers can branch on, distinct
    /// from the numeric JSON-RPC code.
    pub fn error_code(&self) -> &'static str {
        match self {
            McpError::UnknownTool(_) => "unknown_tool",
            McpError::InvalidParams(_) => "invalid_params",
            McpError::Serialization(_) => "serialization",
            McpError::Protocol(_) => "protocol",
            McpError::Unauthorized => "unauthorized",
            McpError::Coordinator(e) => e.error_code(),
        }
    }

    /// Renders this error as a full JSON-RPC 2.0 error response object.
    pub fn to_json_rpc_error(&self, id: Option<Value>) -> Value {
        json!({
            "jsonrpc": "2.0",
            "error": {
                "code": self.to_error_code(),
                "message": self.to_string(),
                "data": { "error_code": self.error_code() }
            },
            "id": id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_maps_to_method_not_found() {
        let err = McpError::UnknownTool("frobnicate".to_string());
        assert_eq!(err.to_error_code(), -32601);
    }

    #[test]
    fn coordinator_error_is_wrapped_and_carries_its_own_code() {
        let err: McpError = CoordinatorError::NotRegistered("a1".into()).into();
        assert_eq!(err.error_code(), "not_registered");
        assert_eq!(err.to_error_code(), -32002);
    }

    #[test]
    fn json_rpc_error_shape_includes_id_and_data() {
        let err = McpError::InvalidParams("missing agent_id".to_string());
        let rendered = err.to_json_rpc_error(Some(json!(7)));
        assert_eq!(rendered["jsonrpc"], "2.0");
        assert_eq!(rendered["id"], 7);
        assert_eq!(rendered["error"]["code"], -32602);
        assert_eq!(rendered["error"]["data"]["error_code"], "invalid_params");
    }
}
