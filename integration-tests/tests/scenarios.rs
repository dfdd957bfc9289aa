//! End-to-end coverage for scenarios 1, 2, and 5 of the testable-properties
//! list, exercised against the in-memory provider and the real JSON
//! assignment store through the same `tools/call` dispatcher the stdio and
//! SSE transports use.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use integration_tests::{new_task, Harness};
use marcus_core::{Coordinator, Priority};

/// Scenario 1: register -> request -> complete.
///
/// Register agent `a1` with skills `["python", "api"]`. The board has one
/// TODO task `t1` (name "Build endpoint", labels `["python", "api"]`,
/// priority HIGH, no deps). `request_next_task(a1)` returns `t1`;
/// `report_task_progress` moves it to 50% in_progress, then completed.
/// Expect: `t1` TODO -> IN_PROGRESS -> DONE, `a1.current_task_id` clears,
/// `a1.completed_count == 1`, and the persisted assignment is gone.
#[tokio::test]
async fn register_request_complete_clears_the_assignment() {
    let mut t1 = new_task("t1", "Build endpoint", Priority::High);
    t1.labels = ["python", "api"].into_iter().map(String::from).collect();
    let harness = Harness::new(vec![t1]);

    harness
        .call(
            "register_agent",
            json!({"agent_id": "a1", "name": "Agent One", "role": "Backend", "skills": ["python", "api"]}),
        )
        .await;

    let requested = harness.call("request_next_task", json!({"agent_id": "a1"})).await;
    assert_eq!(requested["success"], true);
    assert_eq!(requested["task"]["id"], "t1");

    let progress = harness
        .call(
            "report_task_progress",
            json!({"agent_id": "a1", "task_id": "t1", "status": "in_progress", "progress": 50}),
        )
        .await;
    assert_eq!(progress["success"], true);

    let completed = harness
        .call(
            "report_task_progress",
            json!({"agent_id": "a1", "task_id": "t1", "status": "completed", "progress": 100}),
        )
        .await;
    assert_eq!(completed["success"], true);

    let agent_status = harness.call("get_agent_status", json!({"agent_id": "a1"})).await;
    assert!(agent_status["agent"]["current_task_id"].is_null());
    assert_eq!(agent_status["agent"]["completed_count"], 1);

    let project_status = harness.call("get_project_status", json!({})).await;
    assert_eq!(project_status["completed"], 1);
    assert_eq!(project_status["in_progress"], 0);

    assert!(harness.coordinator.bootstrap().await.unwrap() == 0, "completed assignment must not remain persisted");
}

/// Scenario 2: two agents, one task. Concurrent `request_next_task` from
/// `a1` and `a2` against a single TODO task: exactly one gets `t1`, the
/// other gets the `no tasks` message.
#[tokio::test]
async fn two_agents_one_task_exactly_one_wins() {
    let harness = Harness::new(vec![new_task("t1", "Solo task", Priority::Medium)]);

    harness
        .call("register_agent", json!({"agent_id": "a1", "name": "Agent One", "role": "Backend"}))
        .await;
    harness
        .call("register_agent", json!({"agent_id": "a2", "name": "Agent Two", "role": "Backend"}))
        .await;

    let (r1, r2) = tokio::join!(
        harness.call("request_next_task", json!({"agent_id": "a1"})),
        harness.call("request_next_task", json!({"agent_id": "a2"})),
    );

    let got_task = |r: &serde_json::Value| r.get("task").is_some();
    let winners = [got_task(&r1), got_task(&r2)].into_iter().filter(|w| *w).count();
    assert_eq!(winners, 1, "exactly one agent should receive the task");

    let loser = if got_task(&r1) { &r2 } else { &r1 };
    assert_eq!(loser["success"], true);
    assert_eq!(loser["message"], "no tasks");
}

/// Scenario 5: crash recovery. Assign `t1` to `a1` and persist it, then
/// simulate a process restart by building a fresh coordinator over the
/// same provider and store but an empty (in-memory) agent registry.
/// Bootstrap loads the persisted assignment; since `a1` never
/// re-registers, the next reconciliation pass treats it as orphaned and
/// reverts `t1` to TODO, clearing the persisted assignment.
#[tokio::test]
async fn crash_recovery_reverts_orphaned_assignment_to_todo() {
    let t1 = new_task("t1", "Needs a home", Priority::Medium);
    let harness = Harness::new(vec![t1]);

    harness
        .call("register_agent", json!({"agent_id": "a1", "name": "Agent One", "role": "Backend"}))
        .await;
    let assigned = harness.call("request_next_task", json!({"agent_id": "a1"})).await;
    assert_eq!(assigned["task"]["id"], "t1");

    let persisted_path = harness.persistence_path();
    let provider = harness.provider();

    // "Kill" the process: drop the coordinator (and with it, the in-memory
    // agent registry) without deregistering a1, then rebuild over the same
    // provider and persistence file.
    drop(harness);

    let store = Arc::new(database::JsonAssignmentStore::new(&persisted_path));
    let restarted = Arc::new(Coordinator::new(
        provider,
        store.clone(),
        Arc::new(marcus_core::ai::NullAiAdapter),
        Duration::from_secs(10),
        chrono::Duration::hours(24),
    ));

    let restored = restarted.bootstrap().await.unwrap();
    assert_eq!(restored, 1, "the persisted assignment for t1 must survive the restart");

    let report = restarted.reconcile_once().await.unwrap();
    assert_eq!(report.agent_gone, vec!["t1".to_string()]);

    assert!(store.load_all().await.unwrap().is_empty(), "orphaned assignment must be cleared");
}
