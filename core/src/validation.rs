//! Input validation for registry and assignment operations. Stateless
//! associated functions, mirroring the selection engine's "no side effects"
//! discipline: these are pure checks, never I/O.

use crate::error::{CoordinatorError, Result};

pub struct Validator;

impl Validator {
    /// Agent ids must be short, non-empty tokens safe to use as map keys
    /// and to echo back in JSON-RPC responses.
    pub fn validate_agent_id(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(CoordinatorError::Validation(
                "agent_id must not be empty".to_string(),
            ));
        }
        if id.len() > 100 {
            return Err(CoordinatorError::Validation(
                "agent_id must be at most 100 characters".to_string(),
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoordinatorError::Validation(
                "agent_id may only contain letters, digits, hyphens, and underscores".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_agent_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CoordinatorError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_role(role: &str) -> Result<()> {
        if role.trim().is_empty() {
            return Err(CoordinatorError::Validation(
                "role must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_progress_percent(percent: u8) -> u8 {
        percent.min(100)
    }

    pub fn validate_task_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(CoordinatorError::Validation(
                "task_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_blocker_description(description: &str) -> Result<()> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(CoordinatorError::Validation(
                "blocker description must not be empty".to_string(),
            ));
        }
        if trimmed.len() > 4000 {
            return Err(CoordinatorError::Validation(
                "blocker description must be at most 4000 characters".to_string(),
            ));
        }
        Ok(())
    }
}
