//! Error taxonomy for the coordination engine.
//!
//! Mirrors the layering used throughout this workspace: a `thiserror` enum
//! per crate boundary, with `From` conversions at the seams rather than
//! stringly-typed errors crossing module lines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Errors the coordinator and its collaborators can produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    #[error("agent not registered: {0}")]
    NotRegistered(String),

    #[error("agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("agent {0} already has an active assignment")]
    AlreadyAssigned(String),

    #[error("agent {agent} is not assigned to task {task}")]
    NotAssignedToAgent { agent: String, task: String },

    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("no task available for assignment")]
    NoTaskAvailable,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("internal invariant violation: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// Whether a caller may reasonably retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Provider(ProviderError::Connection(_))
                | CoordinatorError::Provider(ProviderError::RateLimited { .. })
        )
    }

    /// A stable machine-readable code surfaced to tool callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoordinatorError::NotRegistered(_) => "not_registered",
            CoordinatorError::AlreadyRegistered(_) => "already_registered",
            CoordinatorError::AlreadyAssigned(_) => "already_assigned",
            CoordinatorError::NotAssignedToAgent { .. } => "not_assigned_to_agent",
            CoordinatorError::Validation(_) => "invalid_input",
            CoordinatorError::TaskNotFound(_) => "not_found",
            CoordinatorError::AgentNotFound(_) => "not_found",
            CoordinatorError::NoTaskAvailable => "no_task_available",
            CoordinatorError::Provider(e) => e.error_code(),
            CoordinatorError::Persistence(_) => "internal",
            CoordinatorError::Internal(_) => "internal",
        }
    }
}

/// Typed failures a [`crate::provider::KanbanProvider`] call can produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Connection(_) => "connection",
            ProviderError::Auth(_) => "auth",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::NotFound(_) => "not_found",
            ProviderError::Conflict(_) => "conflict",
            ProviderError::Backend(_) => "backend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_stable_codes() {
        assert_eq!(ProviderError::Connection("x".into()).error_code(), "connection");
        assert_eq!(
            ProviderError::RateLimited { retry_after_ms: 100 }.error_code(),
            "rate_limited"
        );
    }

    #[test]
    fn connection_and_rate_limited_are_retryable() {
        let e: CoordinatorError = ProviderError::Connection("down".into()).into();
        assert!(e.is_retryable());

        let e: CoordinatorError = ProviderError::NotFound("t1".into()).into();
        assert!(!e.is_retryable());
    }

    #[test]
    fn validation_error_has_invalid_input_code() {
        assert_eq!(
            CoordinatorError::Validation("bad".into()).error_code(),
            "invalid_input"
        );
    }
}
