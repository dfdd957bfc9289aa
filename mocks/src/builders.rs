//! Fluent builders for constructing [`marcus_core`] domain values in
//! tests, so a scenario test can state only the fields it cares about.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use marcus_core::{Agent, AgentId, Priority, Task, TaskId, TaskStatus};

/// Builder for a [`Task`], defaulting to an unassigned TODO task with
/// medium priority, no labels, and no dependencies.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: impl Into<TaskId>) -> Self {
        let now = Utc::now();
        let id = id.into();
        Self {
            task: Task {
                name: format!("Task {id}"),
                id,
                description: String::new(),
                status: TaskStatus::Todo,
                priority: Priority::Medium,
                labels: BTreeSet::new(),
                dependencies: BTreeSet::new(),
                assigned_to: None,
                estimated_hours: 1.0,
                created_at: now,
                updated_at: now,
                due_date: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.task.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.task.description = description.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn labels<I: IntoIterator<Item = S>, S: Into<String>>(mut self, labels: I) -> Self {
        self.task.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn dependencies<I: IntoIterator<Item = S>, S: Into<TaskId>>(mut self, deps: I) -> Self {
        self.task.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn assigned_to(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.task.assigned_to = Some(agent_id.into());
        self
    }

    pub fn estimated_hours(mut self, hours: f64) -> Self {
        self.task.estimated_hours = hours;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.task.created_at = created_at;
        self
    }

    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.task.due_date = Some(due_date);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for an [`Agent`], defaulting to an unassigned Backend agent
/// with no skills.
pub struct AgentBuilder {
    agent: Agent,
}

impl AgentBuilder {
    pub fn new(id: impl Into<AgentId>) -> Self {
        let id = id.into();
        let name = format!("Agent {id}");
        Self {
            agent: Agent::new(id, name, "Backend".to_string(), BTreeSet::new()),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.agent.name = name.into();
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.agent.role = role.into();
        self
    }

    pub fn skills<I: IntoIterator<Item = S>, S: Into<String>>(mut self, skills: I) -> Self {
        self.agent.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn current_task_id(mut self, task_id: impl Into<TaskId>) -> Self {
        self.agent.current_task_id = Some(task_id.into());
        self
    }

    pub fn completed_count(mut self, count: u64) -> Self {
        self.agent.completed_count = count;
        self
    }

    pub fn build(self) -> Agent {
        self.agent
    }
}
