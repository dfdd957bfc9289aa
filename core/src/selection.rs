//! Task Selection Engine.
//!
//! Pure over its inputs: no I/O, no side effects, no shared state. Called
//! by the coordinator under its lock, once per `request_next_task`.

use std::collections::HashMap;

use crate::models::{Agent, Priority, Task, TaskId};

/// `|t.labels ∩ A.skills| / max(1, |t.labels|)`, a fraction in `[0, 1]`.
/// A task with no labels scores 0; skill match is a preference, never a
/// gate.
pub fn skill_score(task: &Task, agent: &Agent) -> f64 {
    if task.labels.is_empty() {
        return 0.0;
    }
    let overlap = task.labels.intersection(&agent.skills).count();
    overlap as f64 / task.labels.len().max(1) as f64
}

/// `priority_weight * (1 + skill_score)`. Higher is better.
pub fn composite_score(task: &Task, agent: &Agent) -> f64 {
    task.priority.weight() as f64 * (1.0 + skill_score(task, agent))
}

/// Drops any task with an undone dependency, given the latest snapshot of
/// all known tasks (used to resolve dependency ids to their status).
fn readiness_filter<'a>(
    candidates: &'a [Task],
    all_tasks: &HashMap<TaskId, Task>,
) -> Vec<&'a Task> {
    candidates
        .iter()
        .filter(|t| t.is_ready(all_tasks))
        .collect()
}

/// Selects the best task for `agent` out of `available`, or `None` if no
/// task is ready. `all_tasks` supplies dependency status lookups and should
/// include at least every task referenced in any candidate's
/// `dependencies`.
pub fn select_task_for_agent<'a>(
    agent: &Agent,
    available: &'a [Task],
    all_tasks: &HashMap<TaskId, Task>,
) -> Option<&'a Task> {
    let ready = readiness_filter(available, all_tasks);

    ready.into_iter().max_by(|a, b| {
        let score_a = composite_score(a, agent);
        let score_b = composite_score(b, agent);

        score_a
            .partial_cmp(&score_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            // Tie-break 1: earlier created_at wins, so reverse the
            // comparison (older = "greater" in this max_by).
            .then_with(|| b.created_at.cmp(&a.created_at))
            // Tie-break 2: lexicographic task id, ascending.
            .then_with(|| b.id.cmp(&a.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn mk_task(id: &str, priority: Priority, labels: &[&str], created_offset_secs: i64) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            dependencies: BTreeSet::new(),
            assigned_to: None,
            estimated_hours: 1.0,
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
            updated_at: Utc::now(),
            due_date: None,
        }
    }

    fn mk_agent(skills: &[&str]) -> Agent {
        Agent::new(
            "a1".into(),
            "Agent".into(),
            "Backend".into(),
            skills.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn empty_candidates_returns_none() {
        let agent = mk_agent(&[]);
        let all = HashMap::new();
        assert!(select_task_for_agent(&agent, &[], &all).is_none());
    }

    #[test]
    fn single_eligible_task_is_returned() {
        let agent = mk_agent(&["python"]);
        let t = mk_task("t1", Priority::Medium, &["python"], 0);
        let all = HashMap::new();
        let picked = select_task_for_agent(&agent, &[t.clone()], &all).unwrap();
        assert_eq!(picked.id, "t1");
    }

    #[test]
    fn higher_priority_wins_over_skill_match() {
        let agent = mk_agent(&["python", "api"]);
        let low_matching = mk_task("low", Priority::Low, &["python", "api"], 0);
        let urgent_unmatched = mk_task("urgent", Priority::Urgent, &[], 0);
        let all = HashMap::new();

        let picked =
            select_task_for_agent(&agent, &[low_matching, urgent_unmatched], &all).unwrap();
        assert_eq!(picked.id, "urgent");
    }

    #[test]
    fn skill_match_breaks_ties_within_same_priority() {
        let agent = mk_agent(&["python"]);
        let matching = mk_task("matching", Priority::Medium, &["python"], 0);
        let unmatched = mk_task("unmatched", Priority::Medium, &["rust"], 0);
        let all = HashMap::new();

        let picked = select_task_for_agent(&agent, &[unmatched, matching], &all).unwrap();
        assert_eq!(picked.id, "matching");
    }

    #[test]
    fn earlier_created_at_wins_on_tie() {
        let agent = mk_agent(&[]);
        let older = mk_task("older", Priority::Medium, &[], -100);
        let newer = mk_task("newer", Priority::Medium, &[], 0);
        let all = HashMap::new();

        let picked = select_task_for_agent(&agent, &[newer, older], &all).unwrap();
        assert_eq!(picked.id, "older");
    }

    #[test]
    fn dependency_gating_excludes_not_ready_tasks() {
        let agent = mk_agent(&[]);

        let mut dep = mk_task("dep", Priority::Medium, &[], 0);
        dep.status = TaskStatus::Todo; // not done yet

        let mut gated = mk_task("gated", Priority::Urgent, &[], 0);
        gated.dependencies.insert("dep".to_string());

        let ready_low = mk_task("ready", Priority::Low, &[], 0);

        let mut all = HashMap::new();
        all.insert(dep.id.clone(), dep.clone());

        let picked =
            select_task_for_agent(&agent, &[gated, ready_low.clone()], &all).unwrap();
        assert_eq!(picked.id, "ready");
    }

    #[test]
    fn urgent_task_with_unmet_dependency_loses_to_ready_lower_priority_task() {
        // t1(TODO, deps=∅, LOW), t2(TODO, deps={t3}, URGENT), t3(TODO, deps=∅, MEDIUM)
        let agent = mk_agent(&[]);
        let t1 = mk_task("t1", Priority::Low, &[], 0);
        let t3 = mk_task("t3", Priority::Medium, &[], 0);
        let mut t2 = mk_task("t2", Priority::Urgent, &[], 0);
        t2.dependencies.insert("t3".to_string());

        let mut all = HashMap::new();
        all.insert(t3.id.clone(), t3.clone());

        let picked = select_task_for_agent(&agent, &[t1, t2, t3], &all).unwrap();
        assert_eq!(picked.id, "t3");
    }
}
