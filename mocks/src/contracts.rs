//! Contract test suite for [`marcus_core::KanbanProvider`] implementations.
//!
//! Runs the same sequence of assertions against any concrete provider, so
//! [`crate::MockKanbanProvider`] and `database::InMemoryProvider` are
//! exercised identically and can't drift into incompatible behavior.

use marcus_core::{KanbanProvider, Priority, ProviderError, TaskStatus};

use crate::builders::TaskBuilder;

/// Runs every contract check against `provider`, a fresh instance seeded
/// with exactly one TODO task with id `"contract-t1"`.
pub async fn test_provider_contract<P: KanbanProvider>(provider: &P) {
    test_list_available_contract(provider).await;
    test_claim_contract(provider).await;
    test_status_transition_contract(provider).await;
    test_not_found_contract(provider).await;
}

async fn test_list_available_contract<P: KanbanProvider>(provider: &P) {
    let available = provider
        .list_available_tasks()
        .await
        .expect("list_available_tasks should succeed on a fresh provider");
    assert!(
        available.iter().any(|t| t.id == "contract-t1"),
        "seeded task should be listed as available"
    );
    assert!(
        available.iter().all(|t| t.status == TaskStatus::Todo && t.assigned_to.is_none()),
        "every listed task must be TODO with no assignee"
    );
}

async fn test_claim_contract<P: KanbanProvider>(provider: &P) {
    let claimed = provider
        .claim_task(&"contract-t1".to_string(), "contract-agent")
        .await
        .expect("claiming an available task should succeed");
    assert_eq!(claimed.status, TaskStatus::InProgress);
    assert_eq!(claimed.assigned_to.as_deref(), Some("contract-agent"));

    let second = provider.claim_task(&"contract-t1".to_string(), "other-agent").await;
    assert!(
        matches!(second, Err(ProviderError::Conflict(_))),
        "claiming an already-claimed task must return Conflict, got {second:?}"
    );
}

async fn test_status_transition_contract<P: KanbanProvider>(provider: &P) {
    provider
        .update_task_status(&"contract-t1".to_string(), TaskStatus::Blocked)
        .await
        .expect("status transition should succeed for an existing task");
    let task = provider.get_task(&"contract-t1".to_string()).await.unwrap();
    assert_eq!(task.status, TaskStatus::Blocked);

    provider
        .complete_task(&"contract-t1".to_string())
        .await
        .expect("complete_task should succeed");
    let task = provider.get_task(&"contract-t1".to_string()).await.unwrap();
    assert_eq!(task.status, TaskStatus::Done);
}

async fn test_not_found_contract<P: KanbanProvider>(provider: &P) {
    let err = provider.get_task(&"no-such-task".to_string()).await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

/// A contract-test-ready seed task: TODO, medium priority, no labels.
pub fn contract_seed_task() -> marcus_core::Task {
    TaskBuilder::new("contract-t1").priority(Priority::Medium).build()
}
