//! The tool catalog: JSON Schema definitions for `tools/list` and the
//! dispatcher that turns a `tools/call` invocation into a coordinator
//! method call. Schemas are hand-built `serde_json` objects rather than
//! derived through `schemars`/`rmcp`; see `DESIGN.md` for why this
//! workspace doesn't pull in that SDK.

use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use marcus_core::{BlockerSeverity, Coordinator, CoordinatorError, ProgressStatus, ProviderError};

use crate::error::McpError;
use crate::serialization::{serialize_agent, serialize_project_status, serialize_task_for_assignment};

/// Names of every tool this dispatcher handles. `create_project` and
/// `add_feature` from the distilled catalog are delegated to the
/// out-of-core natural-language pipeline and are not implemented here.
pub const TOOL_NAMES: &[&str] = &[
    "register_agent",
    "request_next_task",
    "report_task_progress",
    "report_blocker",
    "get_project_status",
    "get_agent_status",
    "list_registered_agents",
    "ping",
    "check_assignment_health",
];

/// Builds the `tools/list` response body: one entry per tool with a name,
/// description, and JSON Schema for its arguments.
pub fn tool_schemas() -> Vec<Value> {
    vec![
        json!({
            "name": "register_agent",
            "description": "Registers a new agent in the in-memory registry.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "agent_id": {"type": "string"},
                    "name": {"type": "string"},
                    "role": {"type": "string"},
                    "skills": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["agent_id", "name", "role"]
            }
        }),
        json!({
            "name": "request_next_task",
            "description": "Requests the next available task for a registered agent.",
            "inputSchema": {
                "type": "object",
                "properties": { "agent_id": {"type": "string"} },
                "required": ["agent_id"]
            }
        }),
        json!({
            "name": "report_task_progress",
            "description": "Reports progress, completion, or a blocked status for the agent's active task.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "agent_id": {"type": "string"},
                    "task_id": {"type": "string"},
                    "status": {"type": "string", "enum": ["in_progress", "completed", "blocked"]},
                    "progress": {"type": "integer", "minimum": 0, "maximum": 100},
                    "message": {"type": "string"}
                },
                "required": ["agent_id", "task_id", "status"]
            }
        }),
        json!({
            "name": "report_blocker",
            "description": "Reports a blocker on the agent's active task and requests AI-generated suggestions.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "agent_id": {"type": "string"},
                    "task_id": {"type": "string"},
                    "blocker_description": {"type": "string"},
                    "severity": {"type": "string", "enum": ["low", "medium", "high"]}
                },
                "required": ["agent_id", "task_id", "blocker_description"]
            }
        }),
        json!({
            "name": "get_project_status",
            "description": "Returns the aggregate project status snapshot.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "get_agent_status",
            "description": "Returns the registration and assignment status of one agent.",
            "inputSchema": {
                "type": "object",
                "properties": { "agent_id": {"type": "string"} },
                "required": ["agent_id"]
            }
        }),
        json!({
            "name": "list_registered_agents",
            "description": "Lists every registered agent and aggregate counts.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
        json!({
            "name": "ping",
            "description": "Liveness check; echoes back an optional string.",
            "inputSchema": {
                "type": "object",
                "properties": { "echo": {"type": "string"} }
            }
        }),
        json!({
            "name": "check_assignment_health",
            "description": "Runs one reconciliation pass and reports its findings.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
    ]
}

#[derive(Deserialize)]
struct RegisterAgentParams {
    agent_id: String,
    name: String,
    role: String,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Deserialize)]
struct AgentIdParams {
    agent_id: String,
}

#[derive(Deserialize)]
struct ReportProgressParams {
    agent_id: String,
    task_id: String,
    status: String,
    progress: Option<u8>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ReportBlockerParams {
    agent_id: String,
    task_id: String,
    blocker_description: String,
    severity: Option<String>,
}

#[derive(Deserialize)]
struct PingParams {
    echo: Option<String>,
}

/// Dispatches one `tools/call` invocation to the coordinator, returning
/// the inner `{success, ...}` result object (not yet wrapped in the
/// JSON-RPC/content-block envelope; that's the transport's job).
///
/// An error the coordinator itself
/// produces (unknown agent, conflict, transient provider failure, ...) is
/// not a JSON-RPC protocol-level failure: it's folded into this
/// `{success: false, error, error_code}` result object so the caller gets
/// a well-formed JSON-RPC *success* envelope either way. Only malformed
/// tool-call framing (unknown tool name, arguments that don't match the
/// schema) surfaces as a genuine `McpError`.
pub async fn dispatch(coordinator: &Coordinator, name: &str, arguments: Value) -> Result<Value, McpError> {
    match dispatch_inner(coordinator, name, arguments).await {
        Err(McpError::Coordinator(e)) => Ok(coordinator_error_response(&e)),
        other => other,
    }
}

/// Renders a coordinator-originated failure as the tool-response body the
/// spec's propagation policy describes, including a `retry_after_ms` hint
/// when the provider supplied one (or a conservative default for any
/// other retryable error).
fn coordinator_error_response(e: &CoordinatorError) -> Value {
    let mut body = json!({
        "success": false,
        "error": e.to_string(),
        "error_code": e.error_code(),
    });
    match e {
        CoordinatorError::Provider(ProviderError::RateLimited { retry_after_ms }) => {
            body["retry_after_ms"] = json!(retry_after_ms);
        }
        _ if e.is_retryable() => {
            body["retry_after_ms"] = json!(500);
        }
        _ => {}
    }
    body
}

async fn dispatch_inner(coordinator: &Coordinator, name: &str, arguments: Value) -> Result<Value, McpError> {
    match name {
        "register_agent" => {
            let p: RegisterAgentParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            let skills = p.skills.into_iter().collect();
            coordinator.register_agent(p.agent_id.clone(), p.name, p.role, skills).await?;
            Ok(json!({ "success": true, "agent_id": p.agent_id }))
        }

        "request_next_task" => {
            let p: AgentIdParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            match coordinator.request_next_task(&p.agent_id).await? {
                marcus_core::coordinator::RequestOutcome::Assigned { task, instructions } => Ok(json!({
                    "success": true,
                    "task": serialize_task_for_assignment(&task, &instructions),
                })),
                marcus_core::coordinator::RequestOutcome::NoTaskAvailable => {
                    Ok(json!({ "success": true, "message": "no tasks" }))
                }
            }
        }

        "report_task_progress" => {
            let p: ReportProgressParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            let status = ProgressStatus::from_str(&p.status)
                .map_err(McpError::InvalidParams)?;
            coordinator
                .report_progress(&p.agent_id, &p.task_id, status, p.progress, p.message)
                .await?;
            Ok(json!({ "success": true }))
        }

        "report_blocker" => {
            let p: ReportBlockerParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            let severity = match p.severity {
                Some(s) => BlockerSeverity::from_str(&s).map_err(McpError::InvalidParams)?,
                None => BlockerSeverity::Medium,
            };
            let suggestions = coordinator
                .report_blocker(&p.agent_id, &p.task_id, &p.blocker_description, severity)
                .await?;
            Ok(json!({ "success": true, "suggestions": suggestions }))
        }

        "get_project_status" => {
            let snapshot = coordinator.get_project_status().await;
            Ok(serialize_project_status(&snapshot))
        }

        "get_agent_status" => {
            let p: AgentIdParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            let agent = coordinator.get_agent_status(&p.agent_id).await?;
            Ok(json!({ "success": true, "agent": serialize_agent(&agent) }))
        }

        "list_registered_agents" => {
            let agents = coordinator.list_agents().await;
            let total = agents.len();
            let active = agents.iter().filter(|a| !a.is_available()).count();
            let available = total - active;
            Ok(json!({
                "success": true,
                "agents": agents.iter().map(serialize_agent).collect::<Vec<_>>(),
                "total": total,
                "active": active,
                "available": available,
            }))
        }

        "ping" => {
            let p: PingParams =
                serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))?;
            Ok(json!({
                "status": "online",
                "echo": p.echo,
                "timestamp": Utc::now().to_rfc3339(),
            }))
        }

        "check_assignment_health" => {
            let report = coordinator.reconcile_once().await?;
            let checked = report.cleared_count() + report.stalled.len();
            let issues: Vec<Value> = report
                .stalled
                .iter()
                .map(|t| json!({ "task_id": t, "kind": "stalled" }))
                .collect();
            Ok(json!({
                "success": true,
                "health_status": if issues.is_empty() { "healthy" } else { "degraded" },
                "checks": {
                    "agent_gone": report.agent_gone,
                    "completed_externally": report.completed_externally,
                    "lost": report.lost,
                    "not_found": report.not_found,
                },
                "metrics": {
                    "success_rate": if checked == 0 { 1.0 } else { 1.0 - (issues.len() as f64 / checked as f64) },
                },
                "issues": issues,
            }))
        }

        other => Err(McpError::UnknownTool(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::InMemoryProvider;
    use marcus_core::ai::NullAiAdapter;
    use marcus_core::NewTask;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator_with(tasks: Vec<NewTask>) -> Coordinator {
        let provider = Arc::new(InMemoryProvider::seeded(tasks));
        let store = Arc::new(database::JsonAssignmentStore::new(
            tempfile::NamedTempFile::new().unwrap().path().to_path_buf(),
        ));
        Coordinator::new(provider, store, Arc::new(NullAiAdapter), Duration::from_secs(5), chrono::Duration::hours(24))
    }

    fn seed(id: &str) -> NewTask {
        NewTask {
            id: id.to_string(),
            name: format!("task {id}"),
            description: "do it".to_string(),
            priority: marcus_core::Priority::High,
            labels: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            estimated_hours: 1.0,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn register_agent_round_trip() {
        let coordinator = coordinator_with(vec![]);
        let result = dispatch(
            &coordinator,
            "register_agent",
            json!({"agent_id": "a1", "name": "Agent", "role": "Backend", "skills": ["python"]}),
        )
        .await
        .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["agent_id"], "a1");
    }

    #[tokio::test]
    async fn request_next_task_returns_task_with_instructions() {
        let coordinator = coordinator_with(vec![seed("t1")]);
        dispatch(
            &coordinator,
            "register_agent",
            json!({"agent_id": "a1", "name": "Agent", "role": "Backend"}),
        )
        .await
        .unwrap();

        let result = dispatch(&coordinator, "request_next_task", json!({"agent_id": "a1"})).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["task"]["id"], "t1");
        assert!(result["task"]["instructions"].as_str().unwrap().contains("Setup"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let coordinator = coordinator_with(vec![]);
        let err = dispatch(&coordinator, "delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn ping_echoes_and_reports_online() {
        let coordinator = coordinator_with(vec![]);
        let result = dispatch(&coordinator, "ping", json!({"echo": "hi"})).await.unwrap();
        assert_eq!(result["status"], "online");
        assert_eq!(result["echo"], "hi");
    }

    #[tokio::test]
    async fn report_task_progress_rejects_unknown_status() {
        let coordinator = coordinator_with(vec![seed("t1")]);
        dispatch(&coordinator, "register_agent", json!({"agent_id": "a1", "name": "A", "role": "B"}))
            .await
            .unwrap();
        dispatch(&coordinator, "request_next_task", json!({"agent_id": "a1"})).await.unwrap();

        let err = dispatch(
            &coordinator,
            "report_task_progress",
            json!({"agent_id": "a1", "task_id": "t1", "status": "nonsense"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn coordinator_errors_surface_as_success_false_not_a_protocol_error() {
        let coordinator = coordinator_with(vec![]);
        dispatch(&coordinator, "register_agent", json!({"agent_id": "a1", "name": "A", "role": "B"}))
            .await
            .unwrap();

        // Registering the same agent twice is a CoordinatorError, not a
        // malformed tool call, so it must come back as a well-formed
        // `Ok` result with `success: false`.
        let result = dispatch(&coordinator, "register_agent", json!({"agent_id": "a1", "name": "A", "role": "B"}))
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error_code"], "already_registered");
    }

    #[tokio::test]
    async fn request_next_task_for_unregistered_agent_is_success_false() {
        let coordinator = coordinator_with(vec![seed("t1")]);
        let result = dispatch(&coordinator, "request_next_task", json!({"agent_id": "ghost"}))
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error_code"], "not_registered");
    }
}
