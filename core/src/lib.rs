//! Marcus Coordination Engine
//!
//! This crate provides the domain model, pluggable-backend traits, and the
//! assignment-and-coordination logic that the rest of the workspace wires
//! into a runnable MCP service. It never speaks JSON-RPC and never opens a
//! socket or a file directly; those concerns live in `database` (the
//! persistence store and the in-memory reference provider) and
//! `mcp-protocol`/`mcp-server` (the transports and process entrypoint).
//!
//! # Architecture
//!
//! - [`models`]: Task, Agent, Assignment, Blocker, ProjectSnapshot and the
//!   sealed status/priority/severity enums.
//! - [`error`]: the coordinator and provider error taxonomies.
//! - [`provider`]: the Kanban Provider Interface (`KanbanProvider` trait).
//! - [`store`]: the Assignment Persistence Store interface
//!   (`AssignmentStore` trait).
//! - [`selection`]: the pure Task Selection Engine.
//! - [`validation`]: stateless input validation.
//! - [`ai`]: the AI Enrichment Adapter interface, a fallback template
//!   builder, and a retry-with-backoff helper shared by both.
//! - [`coordinator`]: the Assignment Coordinator: the serialization point
//!   for every mutation of agent/task/assignment state, plus the Blocker &
//!   Progress Handler.
//! - [`health`]: the Assignment Health Monitor's reconciliation loop.

pub mod ai;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod models;
pub mod provider;
pub mod selection;
pub mod store;
pub mod validation;

pub use coordinator::{Coordinator, ProgressStatus};
pub use error::{CoordinatorError, ProviderError, Result};
pub use health::{HealthMonitor, ReconciliationReport};
pub use models::{
    Agent, AgentId, Assignment, Blocker, BlockerSeverity, NewTask, Priority, ProjectSnapshot,
    Task, TaskId, TaskStatus,
};
pub use provider::{KanbanProvider, ProviderKind};
pub use store::AssignmentStore;
pub use validation::Validator;

/// Current version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current crate name.
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(CRATE_NAME, "marcus-core");
    }

    #[test]
    fn test_re_exports() {
        use std::str::FromStr;
        let status = TaskStatus::Todo;
        assert_eq!(status.to_string(), "TODO");

        let err = CoordinatorError::TaskNotFound("t1".into());
        assert_eq!(err.error_code(), "not_found");

        assert_eq!(TaskStatus::from_str("DONE").unwrap(), TaskStatus::Done);
    }
}
