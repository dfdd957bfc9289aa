//! Mock [`marcus_core::KanbanProvider`]: thread-safe, error-injectable,
//! with call-history tracking for verifying what the coordinator actually
//! asked the board to do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use marcus_core::{KanbanProvider, ProviderError, Task, TaskId, TaskStatus};
use parking_lot::Mutex;

/// A kanban provider double. Seed it with [`MockKanbanProvider::with_tasks`],
/// arrange a failure with [`MockKanbanProvider::inject_error`], and assert
/// on what was called with [`MockKanbanProvider::call_history`].
pub struct MockKanbanProvider {
    tasks: Arc<Mutex<HashMap<TaskId, Task>>>,
    error_injection: Arc<Mutex<Option<ProviderError>>>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl Default for MockKanbanProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKanbanProvider {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            error_injection: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let provider = Self::new();
        provider.tasks.lock().extend(tasks.into_iter().map(|t| (t.id.clone(), t)));
        provider
    }

    /// The next call to any trait method returns this error instead of
    /// performing its normal behavior, then clears itself.
    pub fn inject_error(&self, error: ProviderError) {
        *self.error_injection.lock() = Some(error);
    }

    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.call_history.lock().clear();
    }

    pub fn assert_called(&self, method: &str) {
        let history = self.call_history.lock();
        assert!(
            history.iter().any(|call| call.contains(method)),
            "method '{method}' was not called; history: {history:?}"
        );
    }

    fn record(&self, call: impl Into<String>) {
        self.call_history.lock().push(call.into());
    }

    fn check_error_injection(&self) -> Result<(), ProviderError> {
        match self.error_injection.lock().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KanbanProvider for MockKanbanProvider {
    async fn connect(&self) -> Result<(), ProviderError> {
        self.record("connect()");
        self.check_error_injection()
    }

    async fn list_available_tasks(&self) -> Result<Vec<Task>, ProviderError> {
        self.record("list_available_tasks()");
        self.check_error_injection()?;
        Ok(self
            .tasks
            .lock()
            .values()
            .filter(|t| t.status == TaskStatus::Todo && t.assigned_to.is_none())
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, ProviderError> {
        self.record(format!("get_task({id})"));
        self.check_error_injection()?;
        self.tasks.lock().get(id).cloned().ok_or_else(|| ProviderError::NotFound(id.clone()))
    }

    async fn claim_task(&self, id: &TaskId, agent_id: &str) -> Result<Task, ProviderError> {
        self.record(format!("claim_task({id}, {agent_id})"));
        self.check_error_injection()?;
        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        if task.status != TaskStatus::Todo || task.assigned_to.is_some() {
            return Err(ProviderError::Conflict(id.clone()));
        }
        task.status = TaskStatus::InProgress;
        task.assigned_to = Some(agent_id.to_string());
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), ProviderError> {
        self.record(format!("update_task_status({id}, {status})"));
        self.check_error_injection()?;
        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        task.status = status;
        if status == TaskStatus::Todo {
            task.assigned_to = None;
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn set_progress(&self, id: &TaskId, percent: u8) -> Result<(), ProviderError> {
        self.record(format!("set_progress({id}, {percent})"));
        self.check_error_injection()?;
        let mut tasks = self.tasks.lock();
        tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        Ok(())
    }

    async fn add_comment(&self, id: &TaskId, text: &str) -> Result<(), ProviderError> {
        self.record(format!("add_comment({id}, {text})"));
        self.check_error_injection()?;
        if !self.tasks.lock().contains_key(id) {
            return Err(ProviderError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn complete_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        self.record(format!("complete_task({id})"));
        self.check_error_injection()?;
        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        task.status = TaskStatus::Done;
        task.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TaskBuilder;

    #[tokio::test]
    async fn injected_error_is_returned_once_then_clears() {
        let provider = MockKanbanProvider::with_tasks(vec![TaskBuilder::new("t1").build()]);
        provider.inject_error(ProviderError::RateLimited { retry_after_ms: 500 });

        let err = provider.list_available_tasks().await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));

        let tasks = provider.list_available_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn call_history_records_method_and_args() {
        let provider = MockKanbanProvider::with_tasks(vec![TaskBuilder::new("t1").build()]);
        provider.claim_task(&"t1".to_string(), "a1").await.unwrap();
        provider.assert_called("claim_task(t1, a1)");
    }
}
