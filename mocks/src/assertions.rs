//! Assertion helpers encoding the system's core invariants, so a scenario
//! test can assert "the system is consistent" in one call instead of
//! re-deriving each invariant field-by-field.

use marcus_core::{Agent, Assignment, Task, TaskStatus};

/// Every task in IN_PROGRESS or BLOCKED has a non-null `assigned_to`
/// that names a registered agent.
pub fn assert_in_progress_tasks_have_registered_owner(tasks: &[Task], agents: &[Agent]) {
    for task in tasks {
        if matches!(task.status, TaskStatus::InProgress | TaskStatus::Blocked) {
            let owner = task.assigned_to.as_ref().unwrap_or_else(|| {
                panic!("task {} is {:?} but has no assigned_to", task.id, task.status)
            });
            assert!(
                agents.iter().any(|a| &a.id == owner),
                "task {} is assigned to unregistered agent {owner}",
                task.id
            );
        }
    }
}

/// No two active assignments share a `task_id` or an `agent_id`.
pub fn assert_assignments_are_exclusive(assignments: &[Assignment]) {
    let mut seen_tasks = std::collections::HashSet::new();
    let mut seen_agents = std::collections::HashSet::new();
    for a in assignments {
        assert!(seen_tasks.insert(&a.task_id), "task {} has more than one active assignment", a.task_id);
        assert!(seen_agents.insert(&a.agent_id), "agent {} has more than one active assignment", a.agent_id);
    }
}

/// Asserts a task's core identifying fields match, ignoring timestamps,
/// useful after round-tripping through a provider or the persistence
/// store.
pub fn assert_task_equivalent(actual: &Task, expected: &Task) {
    assert_eq!(actual.id, expected.id, "task ids differ");
    assert_eq!(actual.name, expected.name, "task names differ");
    assert_eq!(actual.status, expected.status, "task statuses differ");
    assert_eq!(actual.priority, expected.priority, "task priorities differ");
    assert_eq!(actual.assigned_to, expected.assigned_to, "task assignees differ");
}

/// Asserts every agent's `current_task_id`, if set, points at a task that
/// is actually assigned to it and in an active status. The converse of
/// [`assert_in_progress_tasks_have_registered_owner`].
pub fn assert_agent_slots_are_consistent(agents: &[Agent], tasks: &[Task]) {
    for agent in agents {
        let Some(task_id) = &agent.current_task_id else { continue };
        let task = tasks
            .iter()
            .find(|t| &t.id == task_id)
            .unwrap_or_else(|| panic!("agent {} points at unknown task {task_id}", agent.id));
        assert_eq!(task.assigned_to.as_ref(), Some(&agent.id));
        assert!(matches!(task.status, TaskStatus::InProgress | TaskStatus::Blocked));
    }
}
