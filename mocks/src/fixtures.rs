//! Standard test fixtures: the small task/agent pools used across the
//! end-to-end scenario tests, built once here so tests in every crate
//! share the same shapes instead of re-deriving them.

use marcus_core::{Priority, Task};

use crate::builders::{AgentBuilder, TaskBuilder};

/// A single HIGH-priority task matching an agent's skills exactly.
pub fn single_matching_task() -> Task {
    TaskBuilder::new("t1")
        .name("Build endpoint")
        .priority(Priority::High)
        .labels(["python", "api"])
        .build()
}

/// A dependency-gating fixture: `t1` (LOW, no deps), `t2`
/// (URGENT, depends on `t3`), `t3` (MEDIUM, no deps). Selection must pick
/// `t3`: `t2` is gated and `t3` outranks `t1`.
pub fn dependency_gating_tasks() -> Vec<Task> {
    let t1 = TaskBuilder::new("t1").priority(Priority::Low).build();
    let t3 = TaskBuilder::new("t3").priority(Priority::Medium).build();
    let t2 = TaskBuilder::new("t2")
        .priority(Priority::Urgent)
        .dependencies(["t3"])
        .build();
    vec![t1, t2, t3]
}

/// A registered agent with a typical two-skill profile, unassigned.
pub fn idle_agent(id: &str) -> marcus_core::Agent {
    AgentBuilder::new(id).skills(["python", "api"]).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_gating_fixture_has_the_expected_shape() {
        let tasks = dependency_gating_tasks();
        assert_eq!(tasks.len(), 3);
        let t2 = tasks.iter().find(|t| t.id == "t2").unwrap();
        assert!(t2.dependencies.contains("t3"));
    }

    #[test]
    fn idle_agent_has_no_current_task() {
        let a = idle_agent("a1");
        assert!(a.current_task_id.is_none());
    }
}
