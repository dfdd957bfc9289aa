//! Integration tests for the mocks crate's own test-support surface:
//! exercises the builders, fixtures, assertions, and contract suite
//! together the way a scenario test in another crate would.

use marcus_core::{KanbanProvider, ProviderError, TaskStatus};
use mocks::builders::{AgentBuilder, TaskBuilder};
use mocks::contracts::{contract_seed_task, test_provider_contract};
use mocks::fixtures::{dependency_gating_tasks, idle_agent, single_matching_task};
use mocks::{
    assert_agent_slots_are_consistent, assert_assignments_are_exclusive,
    assert_in_progress_tasks_have_registered_owner, MockKanbanProvider,
};

#[tokio::test]
async fn mock_provider_satisfies_the_shared_contract() {
    let provider = MockKanbanProvider::with_tasks(vec![contract_seed_task()]);
    test_provider_contract(&provider).await;
}

#[tokio::test]
async fn mock_provider_tracks_call_history() {
    let provider = MockKanbanProvider::with_tasks(vec![single_matching_task()]);
    provider.list_available_tasks().await.unwrap();
    provider.claim_task(&"t1".to_string(), "a1").await.unwrap();
    provider.assert_called("list_available_tasks()");
    provider.assert_called("claim_task(t1, a1)");
}

#[tokio::test]
async fn mock_provider_error_injection_is_one_shot() {
    let provider = MockKanbanProvider::with_tasks(vec![single_matching_task()]);
    provider.inject_error(ProviderError::Connection("board unreachable".into()));

    let err = provider.get_task(&"t1".to_string()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Connection(_)));

    let task = provider.get_task(&"t1".to_string()).await.unwrap();
    assert_eq!(task.id, "t1");
}

#[tokio::test]
async fn dependency_gating_fixture_feeds_the_selection_engine() {
    let tasks = dependency_gating_tasks();
    let agent = idle_agent("a1");
    let all = tasks.iter().map(|t| (t.id.clone(), t.clone())).collect();

    let picked = marcus_core::selection::select_task_for_agent(&agent, &tasks, &all).unwrap();
    assert_eq!(picked.id, "t3", "URGENT t2 is gated; t3 is ready and outranks LOW t1");
}

#[test]
fn builders_and_assertions_compose_into_a_consistent_snapshot() {
    let agent = AgentBuilder::new("a1").current_task_id("t1").build();
    let task = TaskBuilder::new("t1")
        .status(TaskStatus::InProgress)
        .assigned_to("a1")
        .build();

    assert_in_progress_tasks_have_registered_owner(&[task.clone()], &[agent.clone()]);
    assert_agent_slots_are_consistent(&[agent], &[task]);
}

#[test]
fn exclusivity_assertion_passes_for_a_well_formed_assignment_set() {
    use marcus_core::Assignment;
    let assignments = vec![
        Assignment::new("t1".into(), "a1".into(), "do it".into()),
        Assignment::new("t2".into(), "a2".into(), "do it too".into()),
    ];
    assert_assignments_are_exclusive(&assignments);
}
