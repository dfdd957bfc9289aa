//! The stdio transport: newline-delimited JSON-RPC 2.0 over a pair of
//! async streams. One connection, one request at a time, read until EOF.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use marcus_core::Coordinator;

use crate::dispatch::handle_json_rpc;
use crate::error::McpError;

/// Reads one JSON-RPC request per line from `reader` until EOF, dispatches
/// it, and writes one JSON-RPC response per line to `writer`. Malformed
/// lines produce a JSON-RPC parse error rather than aborting the loop, so
/// one bad line doesn't take down the whole session.
pub async fn serve<R, W>(coordinator: Arc<Coordinator>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader;
    let mut buf = String::new();

    loop {
        buf.clear();
        let read = lines.read_line(&mut buf).await?;
        if read == 0 {
            debug!("stdio transport: EOF, closing");
            return Ok(());
        }
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(&coordinator, line).await;
        let mut rendered = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        rendered.push('\n');
        writer.write_all(rendered.as_bytes()).await?;
        writer.flush().await?;
    }
}

async fn handle_line(coordinator: &Coordinator, line: &str) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "stdio transport: malformed JSON-RPC line");
            return McpError::Serialization(e.to_string()).to_json_rpc_error(None);
        }
    };
    handle_json_rpc(coordinator, &request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools;
    use database::InMemoryProvider;
    use marcus_core::ai::NullAiAdapter;
    use serde_json::json;
    use std::time::Duration;

    fn coordinator() -> Arc<Coordinator> {
        Arc::new(Coordinator::new(
            Arc::new(InMemoryProvider::new()),
            Arc::new(database::JsonAssignmentStore::new(
                tempfile::NamedTempFile::new().unwrap().path().to_path_buf(),
            )),
            Arc::new(NullAiAdapter),
            Duration::from_secs(5),
            chrono::Duration::hours(24),
        ))
    }

    #[tokio::test]
    async fn dispatches_a_register_agent_call_and_writes_one_response_line() {
        let coordinator = coordinator();
        let request = json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "register_agent", "arguments": {"agent_id": "a1", "name": "A", "role": "Backend", "skills": ["python"]}}
        });
        let input = format!("{}\n", request);
        let mut output = Vec::new();
        serve(coordinator, input.as_bytes(), &mut output).await.unwrap();

        let rendered = String::from_utf8(output).unwrap();
        let response: Value = serde_json::from_str(rendered.trim()).unwrap();
        assert_eq!(response["id"], 1);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let inner: Value = serde_json::from_str(text).unwrap();
        assert_eq!(inner["success"], true);
        assert_eq!(inner["agent_id"], "a1");
    }

    #[tokio::test]
    async fn tools_list_reports_every_catalog_entry() {
        let coordinator = coordinator();
        let input = "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n";
        let mut output = Vec::new();
        serve(coordinator, input.as_bytes(), &mut output).await.unwrap();

        let rendered = String::from_utf8(output).unwrap();
        let response: Value = serde_json::from_str(rendered.trim()).unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), tools::TOOL_NAMES.len());
    }

    #[tokio::test]
    async fn malformed_line_yields_a_parse_error_without_closing_the_stream() {
        let coordinator = coordinator();
        let input = "not json\n{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/list\"}\n";
        let mut output = Vec::new();
        serve(coordinator, input.as_bytes(), &mut output).await.unwrap();

        let rendered = String::from_utf8(output).unwrap();
        let mut responses = rendered.lines();
        let first: Value = serde_json::from_str(responses.next().unwrap()).unwrap();
        assert!(first["error"].is_object());
        let second: Value = serde_json::from_str(responses.next().unwrap()).unwrap();
        assert_eq!(second["id"], 3);
    }
}
