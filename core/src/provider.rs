//! The Kanban Provider Interface: the polymorphic capability set the
//! coordinator consumes. Concrete wire clients for specific kanban backends
//! (Planka, GitHub Issues, Linear) live outside this crate; this module
//! defines only the contract and the one reference implementation
//! ([`crate::memory_provider::InMemoryProvider`]) used for local operation
//! and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::{Task, TaskId};

/// Selects which concrete backend a deployment talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Planka,
    Github,
    Linear,
    Memory,
}

/// A kanban backend behind a uniform async contract.
///
/// Every call returns either success or one of [`ProviderError`]'s typed
/// variants; none of them panic or propagate a foreign error type. Retries
/// for transient failures (`Connection`, `RateLimited`) are the caller's
/// responsibility; see the coordinator's retry policy.
#[async_trait]
pub trait KanbanProvider: Send + Sync {
    /// Idempotent: establishes or refreshes credentials.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// Tasks with status TODO and no assignee. Must reflect any
    /// out-of-band board changes made since the last call.
    async fn list_available_tasks(&self) -> Result<Vec<Task>, ProviderError>;

    async fn get_task(&self, id: &TaskId) -> Result<Task, ProviderError>;

    /// Atomically transitions the remote card from TODO to IN_PROGRESS and
    /// records the assignee. If the backend cannot offer atomicity it must
    /// implement an optimistic check: read current state, fail with
    /// `Conflict` if it already has an assignee or is not TODO.
    ///
    /// This is the sole anti-race line of defense against two coordinators;
    /// the core assumes a single coordinator process and uses this call
    /// only as a correctness check.
    async fn claim_task(&self, id: &TaskId, agent_id: &str) -> Result<Task, ProviderError>;

    async fn update_task_status(
        &self,
        id: &TaskId,
        status: crate::models::TaskStatus,
    ) -> Result<(), ProviderError>;

    async fn set_progress(&self, id: &TaskId, percent: u8) -> Result<(), ProviderError>;

    async fn add_comment(&self, id: &TaskId, text: &str) -> Result<(), ProviderError>;

    /// Transitions the task to DONE.
    async fn complete_task(&self, id: &TaskId) -> Result<(), ProviderError>;
}
