//! Domain model for the coordination engine: tasks, agents, assignments,
//! blockers, and the aggregate project snapshot.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque task identifier, unique within a project.
pub type TaskId = String;

/// Opaque agent identifier, unique across the registry.
pub type AgentId = String;

/// Lifecycle state of a task as tracked on the kanban board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
            TaskStatus::Blocked => "BLOCKED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Priority band used by the selection engine's composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Integer weight used directly in the composite score formula.
    pub fn weight(self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Severity of a reported blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockerSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for BlockerSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockerSeverity::Low => "low",
            BlockerSeverity::Medium => "medium",
            BlockerSeverity::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for BlockerSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(BlockerSeverity::Low),
            "medium" => Ok(BlockerSeverity::Medium),
            "high" => Ok(BlockerSeverity::High),
            other => Err(format!("unknown blocker severity: {other}")),
        }
    }
}

/// A unit of work tracked on the external kanban board.
///
/// The core never owns this record: it is a cached view refreshed through
/// the [`crate::provider::KanbanProvider`], but holds it in the same shape
/// the provider returns it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub labels: BTreeSet<String>,
    pub dependencies: BTreeSet<TaskId>,
    pub assigned_to: Option<AgentId>,
    pub estimated_hours: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// True once every dependency listed on the task is itself DONE, per the
    /// readiness filter consumed by the selection engine.
    pub fn is_ready(&self, all_tasks: &std::collections::HashMap<TaskId, Task>) -> bool {
        self.dependencies.iter().all(|dep| {
            all_tasks
                .get(dep)
                .map(|t| t.status == TaskStatus::Done)
                .unwrap_or(false)
        })
    }

    /// Whether this task is overdue relative to `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && self.status != TaskStatus::Done,
            None => false,
        }
    }
}

/// A registered worker agent and its current assignment slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    pub skills: BTreeSet<String>,
    pub current_task_id: Option<TaskId>,
    pub completed_count: u64,
    pub registered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(id: AgentId, name: String, role: String, skills: BTreeSet<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            role,
            skills,
            current_task_id: None,
            completed_count: 0,
            registered_at: now,
            last_seen_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.current_task_id.is_none()
    }
}

/// The durable record binding one agent to one task while it is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub assigned_at: DateTime<Utc>,
    pub instructions: String,
    pub progress_percent: u8,
    pub last_update_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(task_id: TaskId, agent_id: AgentId, instructions: String) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            agent_id,
            assigned_at: now,
            instructions,
            progress_percent: 0,
            last_update_at: now,
        }
    }

    /// Whether this assignment has not been touched since `threshold`.
    pub fn is_stalled(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.last_update_at > threshold
    }
}

/// A reported obstacle against an active assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub description: String,
    pub severity: BlockerSeverity,
    pub reported_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub suggestions: String,
}

/// Aggregate, derived, never-persisted view of project health.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub total: u64,
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
    pub blocked: u64,
    pub overdue_task_ids: Vec<TaskId>,
    pub active_agents: u64,
    pub available_agents: u64,
    pub refreshed_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }
}

/// Seed data used by the in-memory reference kanban provider to create a
/// task; the core otherwise only ever reads tasks handed to it by a
/// provider.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub labels: BTreeSet<String>,
    pub dependencies: BTreeSet<TaskId>,
    pub estimated_hours: f64,
    pub due_date: Option<DateTime<Utc>>,
}
