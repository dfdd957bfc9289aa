//! The reference [`marcus_core::KanbanProvider`]: an in-process task board
//! with no external dependency, used for local operation, demos, and the
//! integration test suite. Selected via `ProviderKind::Memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use marcus_core::{KanbanProvider, NewTask, ProviderError, Task, TaskId, TaskStatus};
use tokio::sync::Mutex;

/// An in-memory kanban board. Cloning a [`Task`] out of it never lets a
/// caller mutate board state directly; every transition goes through one
/// of the trait methods below, matching the optimistic-concurrency
/// contract real backends must offer.
pub struct InMemoryProvider {
    tasks: Mutex<HashMap<TaskId, Task>>,
    comments: Mutex<HashMap<TaskId, Vec<String>>>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a board pre-populated from seed data, e.g. loaded from a
    /// project file at startup.
    pub fn seeded(seeds: Vec<NewTask>) -> Self {
        let now = Utc::now();
        let mut tasks = HashMap::with_capacity(seeds.len());
        for seed in seeds {
            tasks.insert(
                seed.id.clone(),
                Task {
                    id: seed.id,
                    name: seed.name,
                    description: seed.description,
                    status: TaskStatus::Todo,
                    priority: seed.priority,
                    labels: seed.labels,
                    dependencies: seed.dependencies,
                    assigned_to: None,
                    estimated_hours: seed.estimated_hours,
                    created_at: now,
                    updated_at: now,
                    due_date: seed.due_date,
                },
            );
        }
        Self {
            tasks: Mutex::new(tasks),
            comments: Mutex::new(HashMap::new()),
        }
    }

    /// Test/demo helper: the comments posted against a task, in order.
    pub async fn comments_for(&self, task_id: &TaskId) -> Vec<String> {
        self.comments.lock().await.get(task_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl KanbanProvider for InMemoryProvider {
    async fn connect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn list_available_tasks(&self) -> Result<Vec<Task>, ProviderError> {
        Ok(self
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Todo && t.assigned_to.is_none())
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, ProviderError> {
        self.tasks
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.clone()))
    }

    async fn claim_task(&self, id: &TaskId, agent_id: &str) -> Result<Task, ProviderError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        if task.status != TaskStatus::Todo || task.assigned_to.is_some() {
            return Err(ProviderError::Conflict(format!(
                "task {id} is not available for claiming"
            )));
        }
        task.status = TaskStatus::InProgress;
        task.assigned_to = Some(agent_id.to_string());
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), ProviderError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        task.status = status;
        if status == TaskStatus::Todo {
            task.assigned_to = None;
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn set_progress(&self, id: &TaskId, _percent: u8) -> Result<(), ProviderError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn add_comment(&self, id: &TaskId, text: &str) -> Result<(), ProviderError> {
        if !self.tasks.lock().await.contains_key(id) {
            return Err(ProviderError::NotFound(id.clone()));
        }
        self.comments
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    async fn complete_task(&self, id: &TaskId) -> Result<(), ProviderError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(id).ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        task.status = TaskStatus::Done;
        task.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use marcus_core::Priority;

    fn seed(id: &str) -> NewTask {
        NewTask {
            id: id.to_string(),
            name: format!("task {id}"),
            description: "do it".to_string(),
            priority: Priority::Medium,
            labels: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            estimated_hours: 1.0,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn seeded_tasks_are_available() {
        let provider = InMemoryProvider::seeded(vec![seed("t1"), seed("t2")]);
        let available = provider.list_available_tasks().await.unwrap();
        assert_eq!(available.len(), 2);
    }

    #[tokio::test]
    async fn claim_task_makes_it_unavailable_to_others() {
        let provider = InMemoryProvider::seeded(vec![seed("t1")]);
        let claimed = provider.claim_task(&"t1".to_string(), "a1").await.unwrap();
        assert_eq!(claimed.status, TaskStatus::InProgress);
        assert_eq!(claimed.assigned_to.as_deref(), Some("a1"));

        let available = provider.list_available_tasks().await.unwrap();
        assert!(available.is_empty());
    }

    #[tokio::test]
    async fn claiming_an_already_claimed_task_conflicts() {
        let provider = InMemoryProvider::seeded(vec![seed("t1")]);
        provider.claim_task(&"t1".to_string(), "a1").await.unwrap();
        let err = provider.claim_task(&"t1".to_string(), "a2").await.unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_to_todo_clears_assignee() {
        let provider = InMemoryProvider::seeded(vec![seed("t1")]);
        provider.claim_task(&"t1".to_string(), "a1").await.unwrap();
        provider
            .update_task_status(&"t1".to_string(), TaskStatus::Todo)
            .await
            .unwrap();
        let task = provider.get_task(&"t1".to_string()).await.unwrap();
        assert!(task.assigned_to.is_none());
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn comments_are_recorded_in_order() {
        let provider = InMemoryProvider::seeded(vec![seed("t1")]);
        provider.add_comment(&"t1".to_string(), "first").await.unwrap();
        provider.add_comment(&"t1".to_string(), "second").await.unwrap();
        assert_eq!(
            provider.comments_for(&"t1".to_string()).await,
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test]
    async fn comment_on_unknown_task_is_not_found() {
        let provider = InMemoryProvider::new();
        let err = provider.add_comment(&"ghost".to_string(), "x").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
