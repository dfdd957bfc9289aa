//! The Assignment Persistence Store: an append-and-rewrite durable record
//! of active `(agent -> task)` assignments.
//!
//! The store itself does not decide *when* to persist; the coordinator
//! calls `record`/`clear` exactly at the points the assignment protocol
//! requires durability (see `crate::coordinator`). Concrete storage lives
//! outside this crate; the `database` crate ships the one implementation
//! used in this workspace, a temp-file-plus-rename JSON document.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Assignment, TaskId};

/// Durable keeper of the active-assignment set.
///
/// Implementations must flush writes to stable storage before `record`/
/// `clear` return: a crash at any point must leave either the prior or the
/// new state, never a torn write.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Persists a new active assignment, replacing any existing entry for
    /// the same `task_id`. Durable before returning.
    async fn record(&self, assignment: Assignment) -> Result<()>;

    /// Removes the assignment for `task_id`, if any. Durable before
    /// returning. Not an error if no such assignment exists.
    async fn clear(&self, task_id: &TaskId) -> Result<()>;

    /// All active assignments, loaded from stable storage. Called on
    /// startup; returns an empty list if nothing has ever been persisted.
    async fn load_all(&self) -> Result<Vec<Assignment>>;

    /// All active assignments, equivalent to `load_all` but used by
    /// in-process callers (the coordinator, the health monitor) that don't
    /// need the startup-specific framing.
    async fn list_active(&self) -> Result<Vec<Assignment>> {
        self.load_all().await
    }
}
