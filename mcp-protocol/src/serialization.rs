//! JSON-RPC envelope helpers and the MCP-facing JSON shape for core domain
//! types. The coordinator's own types derive `Serialize`, but the wire
//! shape expected by tool callers differs in a few field names (`completed`
//! instead of `done`, a nested `workers` object, etc.), so the mapping
//! lives here rather than on the core types themselves.

use serde_json::{json, Value};

use marcus_core::{Agent, ProjectSnapshot, Task};

use crate::error::McpError;

/// Wraps a successful JSON-RPC 2.0 response.
pub fn create_success_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
}

/// Wraps a tool result as the `tools/call` content-block envelope the
/// stdio and SSE transports both return: `result.content[0].text` holds
/// the JSON-serialized `{success, ...}` object.
pub fn create_tool_call_response(id: Option<Value>, tool_result: &Value) -> Value {
    let text = serde_json::to_string(tool_result).unwrap_or_else(|_| "{}".to_string());
    create_success_response(
        id,
        json!({
            "content": [{ "type": "text", "text": text }]
        }),
    )
}

/// Deserializes a tool's `arguments` object into `T`, mapping failures to
/// [`McpError::InvalidParams`].
pub fn deserialize_params<T>(params: Value) -> Result<T, McpError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// The `task{...}` shape returned by `request_next_task`, per the tool
/// catalog: `id, name, description, priority, instructions, dependencies[]`.
pub fn serialize_task_for_assignment(task: &Task, instructions: &str) -> Value {
    json!({
        "id": task.id,
        "name": task.name,
        "description": task.description,
        "priority": task.priority.to_string(),
        "instructions": instructions,
        "dependencies": task.dependencies,
    })
}

/// The `agent{...}` shape returned by `get_agent_status`.
pub fn serialize_agent(agent: &Agent) -> Value {
    json!({
        "agent_id": agent.id,
        "name": agent.name,
        "role": agent.role,
        "skills": agent.skills,
        "current_task_id": agent.current_task_id,
        "completed_count": agent.completed_count,
        "registered_at": agent.registered_at.to_rfc3339(),
        "last_seen_at": agent.last_seen_at.to_rfc3339(),
    })
}

/// The project-status result shape: `total, completed, in_progress,
/// blocked, completion_percentage, workers{total,active,available}`.
pub fn serialize_project_status(snapshot: &ProjectSnapshot) -> Value {
    json!({
        "success": true,
        "total": snapshot.total,
        "completed": snapshot.done,
        "in_progress": snapshot.in_progress,
        "blocked": snapshot.blocked,
        "todo": snapshot.todo,
        "completion_percentage": snapshot.completion_percentage(),
        "overdue_task_ids": snapshot.overdue_task_ids,
        "workers": {
            "total": snapshot.active_agents + snapshot.available_agents,
            "active": snapshot.active_agents,
            "available": snapshot.available_agents,
        },
        "refreshed_at": snapshot.refreshed_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn success_response_has_jsonrpc_envelope() {
        let response = create_success_response(Some(json!(1)), json!({"success": true}));
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["success"], true);
    }

    #[test]
    fn tool_call_response_embeds_json_as_text() {
        let response = create_tool_call_response(Some(json!(1)), &json!({"success": true, "agent_id": "a1"}));
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["agent_id"], "a1");
    }

    #[test]
    fn project_status_renames_done_to_completed() {
        let snapshot = ProjectSnapshot {
            total: 10,
            todo: 2,
            in_progress: 3,
            done: 4,
            blocked: 1,
            overdue_task_ids: vec![],
            active_agents: 2,
            available_agents: 1,
            refreshed_at: chrono::Utc::now(),
        };
        let rendered = serialize_project_status(&snapshot);
        assert_eq!(rendered["completed"], 4);
        assert_eq!(rendered["workers"]["total"], 3);
    }

    #[test]
    fn task_for_assignment_includes_instructions_and_dependencies() {
        let task = Task {
            id: "t1".into(),
            name: "Build endpoint".into(),
            description: "desc".into(),
            status: marcus_core::TaskStatus::InProgress,
            priority: marcus_core::Priority::High,
            labels: BTreeSet::new(),
            dependencies: ["t0".to_string()].into_iter().collect(),
            assigned_to: Some("a1".into()),
            estimated_hours: 1.0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            due_date: None,
        };
        let rendered = serialize_task_for_assignment(&task, "do the thing");
        assert_eq!(rendered["instructions"], "do the thing");
        assert_eq!(rendered["dependencies"][0], "t0");
    }
}
