//! The Assignment Health Monitor: a periodic background reconciliation
//! loop wrapped around [`crate::coordinator::Coordinator::reconcile_once`].
//!
//! The reconciliation algorithm itself lives on `Coordinator` because it
//! needs the same lock and the same collaborators the coordinator already
//! holds; this module is only the `tokio::spawn` + `tokio::time::interval`
//! scaffolding and the report type the algorithm returns.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::coordinator::Coordinator;
use crate::models::TaskId;

/// Outcome of a single reconciliation pass, returned for observability and
/// used directly by tests that want to assert on what a pass did without
/// scraping logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Assignments cleared and reverted to TODO because their agent is no
    /// longer registered in this process (the crash-recovery path).
    pub agent_gone: Vec<TaskId>,
    /// Assignments cleared because the kanban board already shows the task
    /// DONE.
    pub completed_externally: Vec<TaskId>,
    /// Assignments cleared because the board shows the task back at TODO
    /// or reassigned to someone else.
    pub lost: Vec<TaskId>,
    /// Assignments cleared because the task no longer exists on the board.
    pub not_found: Vec<TaskId>,
    /// Agents whose `current_task_id` pointed at an assignment that no
    /// longer exists; the slot was cleared so the agent can be re-offered
    /// work.
    pub agent_slot_cleared: Vec<TaskId>,
    /// Assignments that are still active and consistent, but haven't been
    /// touched since the stall threshold. Not auto-cancelled.
    pub stalled: Vec<TaskId>,
    /// Assignments left untouched because the provider returned a
    /// transient error (connection, rate limit) while checking them.
    pub errors: Vec<TaskId>,
}

impl ReconciliationReport {
    /// Number of assignments this pass actually cleared or reverted.
    pub fn cleared_count(&self) -> usize {
        self.agent_gone.len() + self.completed_externally.len() + self.lost.len() + self.not_found.len()
    }
}

/// Runs [`Coordinator::reconcile_once`] on a fixed interval until the
/// returned handle is dropped or aborted.
pub struct HealthMonitor {
    handle: tokio::task::JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawns the periodic reconciliation loop. The first pass runs after
    /// one interval has elapsed; call `coordinator.bootstrap()` and, if an
    /// immediate pass is wanted, `coordinator.reconcile_once()` once before
    /// spawning this.
    pub fn spawn(coordinator: Arc<Coordinator>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so we don't
            // reconcile twice in quick succession right after bootstrap.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match coordinator.reconcile_once().await {
                    Ok(report) => {
                        if !report.stalled.is_empty() {
                            warn!(stalled = ?report.stalled, "assignments exceeded the stall threshold");
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "reconciliation pass failed");
                    }
                }
            }
        });
        Self { handle }
    }

    /// Stops the background loop. Safe to call more than once.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
