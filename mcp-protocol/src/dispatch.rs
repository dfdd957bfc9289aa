//! The transport-agnostic JSON-RPC envelope handling shared by the stdio
//! and SSE transports: parse `method`/`params`, route `tools/list` and
//! `tools/call`, wrap the result or error as a JSON-RPC 2.0 response.

use serde_json::{json, Value};

use marcus_core::Coordinator;

use crate::error::McpError;
use crate::serialization::{create_success_response, create_tool_call_response};
use crate::tools;

/// Handles one already-parsed JSON-RPC request object and returns the
/// JSON-RPC response object (success or error, both fully formed).
pub async fn handle_json_rpc(coordinator: &Coordinator, request: &Value) -> Value {
    let id = request.get("id").cloned();
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    match method {
        "initialize" => create_success_response(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "marcus", "version": env!("CARGO_PKG_VERSION") }
            }),
        ),
        "tools/list" => create_success_response(id, json!({ "tools": tools::tool_schemas() })),
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).map(str::to_string);
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            match name {
                Some(name) => match tools::dispatch(coordinator, &name, arguments).await {
                    Ok(result) => create_tool_call_response(id, &result),
                    Err(e) => e.to_json_rpc_error(id),
                },
                None => McpError::InvalidParams("missing tool name".to_string()).to_json_rpc_error(id),
            }
        }
        other => McpError::Protocol(format!("unknown method: {other}")).to_json_rpc_error(id),
    }
}
