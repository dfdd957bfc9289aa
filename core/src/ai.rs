//! AI Enrichment Adapter: the narrow, single seam through which the
//! coordinator and the blocker handler reach an LLM. Every outcome is a
//! `(String, Source)` pair: the adapter never lets an error escape into
//! the coordinator, it degrades to a deterministic fallback instead.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Agent, BlockerSeverity, Task};

/// Where an adapter's returned text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Ai,
    Fallback,
}

/// Narrow interface consumed by the coordinator and the blocker handler.
/// No concrete LLM vendor client lives in this crate; see
/// [`NullAiAdapter`] for the always-fallback implementation used when no
/// `ai_api_key` is configured (`DESIGN.md` records why no vendor HTTP
/// client is in scope).
#[async_trait]
pub trait InstructionAdapter: Send + Sync {
    /// Generates per-assignment instructions for `agent` on `task`.
    async fn generate_instructions(&self, task: &Task, agent: &Agent) -> (String, Source);

    /// Analyzes a reported blocker and suggests next steps.
    async fn analyze_blocker(
        &self,
        description: &str,
        task: &Task,
        severity: BlockerSeverity,
    ) -> (String, Source);
}

/// The reference [`InstructionAdapter`]: always takes the fallback path.
/// Used whenever no LLM vendor key is configured, and in every test in
/// this workspace that doesn't specifically exercise the retry/timeout
/// path.
pub struct NullAiAdapter;

#[async_trait]
impl InstructionAdapter for NullAiAdapter {
    async fn generate_instructions(&self, task: &Task, agent: &Agent) -> (String, Source) {
        (fallback_instructions(task, agent), Source::Fallback)
    }

    async fn analyze_blocker(
        &self,
        description: &str,
        task: &Task,
        severity: BlockerSeverity,
    ) -> (String, Source) {
        (
            fallback_blocker_suggestions(description, task, severity),
            Source::Fallback,
        )
    }
}

/// Deterministic template built from task name, description, labels, and
/// estimated hours, used whenever the LLM adapter fails, times out, or is
/// disabled. Always non-empty and always contains the task name plus at
/// least one labelled phase.
pub fn fallback_instructions(task: &Task, agent: &Agent) -> String {
    let labels = if task.labels.is_empty() {
        "general".to_string()
    } else {
        task.labels.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    format!(
        "Task: {name}\n\
         Assigned to: {agent}\n\
         Priority: {priority}\n\
         Estimated hours: {hours:.1}\n\
         Relevant skills: {labels}\n\n\
         {description}\n\n\
         Suggested phases:\n\
         1. Setup — review the task description and confirm the approach before writing code.\n\
         2. Implementation — build the change, keeping commits small and focused.\n\
         3. Testing — verify the change against the task's acceptance criteria and report progress.",
        name = task.name,
        agent = agent.name,
        priority = task.priority,
        hours = task.estimated_hours,
        description = task.description,
    )
}

/// Deterministic bulleted checklist derived from severity and labels, used
/// whenever the blocker-analysis call fails or is disabled.
pub fn fallback_blocker_suggestions(
    description: &str,
    task: &Task,
    severity: BlockerSeverity,
) -> String {
    let mut lines = vec![format!(
        "Blocker on \"{}\" ({} severity): {}",
        task.name, severity, description
    )];

    lines.push("- Re-read the task description and dependencies for a missed precondition.".to_string());
    lines.push("- Check whether any of this task's dependencies have since changed state.".to_string());

    match severity {
        BlockerSeverity::High => {
            lines.push(
                "- Escalate immediately; a HIGH severity blocker should not sit unattended."
                    .to_string(),
            );
        }
        BlockerSeverity::Medium => {
            lines.push(
                "- Flag the blocker in the next status update if it isn't resolved soon."
                    .to_string(),
            );
        }
        BlockerSeverity::Low => {
            lines.push("- Note the blocker and continue with any unaffected subtasks.".to_string());
        }
    }

    if !task.labels.is_empty() {
        lines.push(format!(
            "- Consider whether this is a known issue in one of: {}.",
            task.labels.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }

    lines.join("\n")
}

/// Runs `op` up to `max_attempts` times with exponential backoff
/// (`base * 2^attempt`), returning the first success or the last error.
/// Shared by every retry loop in the adapter layer (and reusable by a
/// future vendor-specific adapter).
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    base: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(base * 2u32.pow(attempt - 1)).await;
            }
        }
    }
}
