//! The Assignment Coordinator: the serialization point for every mutation
//! of agent, task, and assignment state, and the Blocker & Progress
//! Handler that rides alongside it.
//!
//! Every public method takes the coordinator's lock for its full
//! duration, including any provider or AI calls it makes. This keeps
//! `request_next_task`'s claim-then-persist sequence atomic with respect
//! to every other coordinator operation without a separate
//! distributed-lock mechanism.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::ai::{self, InstructionAdapter};
use crate::error::{CoordinatorError, ProviderError, Result};
use crate::health::ReconciliationReport;
use crate::models::{Agent, AgentId, Assignment, Blocker, BlockerSeverity, ProjectSnapshot, Task, TaskId, TaskStatus};
use crate::provider::KanbanProvider;
use crate::selection;
use crate::store::AssignmentStore;
use crate::validation::Validator;

/// Maximum number of re-selection attempts `request_next_task` makes after
/// a `claim_task` conflict before giving up.
const MAX_CLAIM_ATTEMPTS: u32 = 3;

/// The status an agent reports through `report_progress`. Parsed once at
/// the transport edge from the wire string (`in_progress` / `completed` /
/// `blocked`); the coordinator never sees the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Blocked,
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            "blocked" => Ok(ProgressStatus::Blocked),
            other => Err(format!("unknown progress status: {other}")),
        }
    }
}

/// What `request_next_task` resolved to.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Assigned { task: Task, instructions: String },
    NoTaskAvailable,
}

/// In-memory state guarded by the coordinator's single mutex. Never
/// exposed directly: every read goes through a coordinator method that
/// clones out what it needs before releasing the lock.
struct CoordinatorState {
    agents: HashMap<AgentId, Agent>,
    /// Cached view of tasks the coordinator has seen, refreshed via
    /// `list_available_tasks` and incidental `get_task` lookups (the
    /// provider interface has no full-board listing primitive; see
    /// DESIGN.md).
    tasks: HashMap<TaskId, Task>,
    assignments: HashMap<TaskId, Assignment>,
    blockers: HashMap<TaskId, Blocker>,
    /// Dedup key for retried progress updates, keyed on
    /// `(task_id, percent, message)`. Bounded by clearing a task's
    /// entries on completion.
    seen_progress: HashSet<(TaskId, u8, String)>,
}

impl CoordinatorState {
    fn new() -> Self {
        Self {
            agents: HashMap::new(),
            tasks: HashMap::new(),
            assignments: HashMap::new(),
            blockers: HashMap::new(),
            seen_progress: HashSet::new(),
        }
    }
}

/// The heart of Marcus: serializes task requests, guarantees at-most-one
/// agent per task and at-most-one active task per agent, transitions
/// kanban status, invokes the AI instruction generator, and persists.
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    provider: Arc<dyn KanbanProvider>,
    store: Arc<dyn AssignmentStore>,
    ai: Arc<dyn InstructionAdapter>,
    ai_timeout: Duration,
    stall_threshold: chrono::Duration,
}

impl Coordinator {
    pub fn new(
        provider: Arc<dyn KanbanProvider>,
        store: Arc<dyn AssignmentStore>,
        ai: Arc<dyn InstructionAdapter>,
        ai_timeout: Duration,
        stall_threshold: chrono::Duration,
    ) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::new()),
            provider,
            store,
            ai,
            ai_timeout,
            stall_threshold,
        }
    }

    /// The kanban provider this coordinator was built with, so callers can
    /// drive its lifecycle (e.g. the initial `connect()`) without building
    /// a second, unwired instance.
    pub fn provider(&self) -> &Arc<dyn KanbanProvider> {
        &self.provider
    }

    /// Loads persisted assignments from the store into memory. Called once
    /// at startup, before the health monitor's first tick. Agents are
    /// never persisted, so assignments whose agent never re-registers are
    /// picked up as orphans on the first reconciliation, see
    /// [`Coordinator::reconcile_once`].
    pub async fn bootstrap(&self) -> Result<usize> {
        let persisted = self.store.load_all().await?;
        let mut state = self.state.lock().await;
        let count = persisted.len();
        for assignment in persisted {
            state.assignments.insert(assignment.task_id.clone(), assignment);
        }
        Ok(count)
    }

    // ---- registration --------------------------------------------------

    pub async fn register_agent(
        &self,
        id: AgentId,
        name: String,
        role: String,
        skills: std::collections::BTreeSet<String>,
    ) -> Result<()> {
        Validator::validate_agent_id(&id)?;
        Validator::validate_agent_name(&name)?;
        Validator::validate_role(&role)?;

        let mut state = self.state.lock().await;
        if state.agents.contains_key(&id) {
            return Err(CoordinatorError::AlreadyRegistered(id));
        }
        state.agents.insert(id.clone(), Agent::new(id, name, role, skills));
        Ok(())
    }

    pub async fn deregister_agent(&self, id: &AgentId) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .agents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoordinatorError::NotRegistered(id.clone()))
    }

    // ---- the core operation ---------------------------------------------

    /// The hardest operation in the coordinator. Holds the coordinator
    /// lock for the whole call, including the provider's `claim_task` and
    /// the persistence write, so no other request can observe or claim
    /// the same task in between.
    pub async fn request_next_task(&self, agent_id: &AgentId) -> Result<RequestOutcome> {
        let mut state = self.state.lock().await;

        let agent = state
            .agents
            .get(agent_id)
            .ok_or_else(|| CoordinatorError::NotRegistered(agent_id.clone()))?
            .clone();
        if agent.current_task_id.is_some() {
            return Err(CoordinatorError::AlreadyAssigned(agent_id.clone()));
        }

        let available = self.provider.list_available_tasks().await?;
        for t in &available {
            state.tasks.insert(t.id.clone(), t.clone());
        }

        let mut candidates = available;
        let mut attempts = 0u32;

        loop {
            self.ensure_dependencies_cached(&mut state, &candidates).await?;

            let chosen = selection::select_task_for_agent(&agent, &candidates, &state.tasks)
                .map(|t| t.id.clone());
            let Some(task_id) = chosen else {
                return Ok(RequestOutcome::NoTaskAvailable);
            };

            match self.provider.claim_task(&task_id, agent_id).await {
                Ok(claimed) => {
                    if claimed.status != TaskStatus::InProgress
                        || claimed.assigned_to.as_deref() != Some(agent_id.as_str())
                    {
                        return Err(CoordinatorError::Internal(format!(
                            "claim_task succeeded but task {} is in status {:?} assigned to {:?}",
                            claimed.id, claimed.status, claimed.assigned_to
                        )));
                    }

                    let (instructions, _source) = tokio::time::timeout(
                        self.ai_timeout,
                        self.ai.generate_instructions(&claimed, &agent),
                    )
                    .await
                    .unwrap_or_else(|_| {
                        (ai::fallback_instructions(&claimed, &agent), ai::Source::Fallback)
                    });

                    let assignment =
                        Assignment::new(claimed.id.clone(), agent_id.clone(), instructions.clone());

                    if let Err(e) = self.store.record(assignment.clone()).await {
                        warn!(task_id = %claimed.id, error = %e, "persistence failed after claim, compensating");
                        if let Err(compensate_err) = self
                            .provider
                            .update_task_status(&claimed.id, TaskStatus::Todo)
                            .await
                        {
                            error!(task_id = %claimed.id, error = %compensate_err, "compensating status revert also failed");
                        }
                        return Err(e);
                    }

                    state.tasks.insert(claimed.id.clone(), claimed.clone());
                    state.assignments.insert(claimed.id.clone(), assignment);
                    if let Some(a) = state.agents.get_mut(agent_id) {
                        a.current_task_id = Some(claimed.id.clone());
                        a.last_seen_at = Utc::now();
                    }

                    return Ok(RequestOutcome::Assigned {
                        task: claimed,
                        instructions,
                    });
                }
                Err(ProviderError::Conflict(_)) | Err(ProviderError::NotFound(_)) => {
                    candidates.retain(|t| t.id != task_id);
                    attempts += 1;
                    if attempts >= MAX_CLAIM_ATTEMPTS {
                        return Ok(RequestOutcome::NoTaskAvailable);
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetches any dependency referenced by a candidate that isn't already
    /// in the task cache, so the readiness filter sees its real status.
    async fn ensure_dependencies_cached(
        &self,
        state: &mut CoordinatorState,
        candidates: &[Task],
    ) -> Result<()> {
        let missing: Vec<TaskId> = candidates
            .iter()
            .flat_map(|t| t.dependencies.iter().cloned())
            .filter(|dep| !state.tasks.contains_key(dep))
            .collect();

        for dep in missing {
            match self.provider.get_task(&dep).await {
                Ok(t) => {
                    state.tasks.insert(t.id.clone(), t);
                }
                Err(ProviderError::NotFound(_)) => {
                    // Dependency vanished; leave it out of the cache so
                    // `is_ready` treats it as not-done (conservatively
                    // un-ready) rather than panicking on a missing entry.
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    // ---- progress & blockers --------------------------------------------

    pub async fn report_progress(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        status: ProgressStatus,
        percent: Option<u8>,
        message: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        let agent = state
            .agents
            .get(agent_id)
            .ok_or_else(|| CoordinatorError::NotRegistered(agent_id.clone()))?;
        if agent.current_task_id.as_ref() != Some(task_id) {
            return Err(CoordinatorError::NotAssignedToAgent {
                agent: agent_id.clone(),
                task: task_id.clone(),
            });
        }

        let clamped = percent.map(Validator::validate_progress_percent);
        let dedup_key = (
            task_id.clone(),
            clamped.unwrap_or(0),
            message.clone().unwrap_or_default(),
        );
        let already_seen = state.seen_progress.contains(&dedup_key);
        if !already_seen {
            state.seen_progress.insert(dedup_key);
        }

        match status {
            ProgressStatus::InProgress => {
                if let Some(a) = state.assignments.get_mut(task_id) {
                    if let Some(p) = clamped {
                        a.progress_percent = a.progress_percent.max(p);
                    }
                    a.last_update_at = Utc::now();
                }

                let task_is_in_progress = state
                    .tasks
                    .get(task_id)
                    .map(|t| t.status == TaskStatus::InProgress)
                    .unwrap_or(false);
                if !task_is_in_progress {
                    self.provider
                        .update_task_status(task_id, TaskStatus::InProgress)
                        .await?;
                    if let Some(t) = state.tasks.get_mut(task_id) {
                        t.status = TaskStatus::InProgress;
                    }
                }

                if !already_seen {
                    if let Some(p) = clamped {
                        self.provider.set_progress(task_id, p).await?;
                    }
                    if let Some(ref m) = message {
                        self.provider.add_comment(task_id, m).await?;
                    }
                }
                Ok(())
            }
            ProgressStatus::Completed => {
                self.provider.complete_task(task_id).await?;
                if let Err(e) = self.store.clear(task_id).await {
                    warn!(task_id = %task_id, error = %e, "persistence clear failed on completion; health monitor will reconcile");
                }
                state.assignments.remove(task_id);
                state.seen_progress.retain(|(t, _, _)| t != task_id);
                if let Some(t) = state.tasks.get_mut(task_id) {
                    t.status = TaskStatus::Done;
                    t.assigned_to = None;
                }
                if let Some(a) = state.agents.get_mut(agent_id) {
                    a.current_task_id = None;
                    a.completed_count += 1;
                    a.last_seen_at = Utc::now();
                }
                Ok(())
            }
            ProgressStatus::Blocked => {
                self.provider.update_task_status(task_id, TaskStatus::Blocked).await?;
                if let Some(t) = state.tasks.get_mut(task_id) {
                    t.status = TaskStatus::Blocked;
                }
                if !already_seen {
                    if let Some(ref m) = message {
                        self.provider.add_comment(task_id, m).await?;
                    }
                }
                Ok(())
            }
        }
    }

    pub async fn report_blocker(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        description: &str,
        severity: BlockerSeverity,
    ) -> Result<String> {
        Validator::validate_blocker_description(description)?;

        let mut state = self.state.lock().await;
        let agent = state
            .agents
            .get(agent_id)
            .ok_or_else(|| CoordinatorError::NotRegistered(agent_id.clone()))?;
        if agent.current_task_id.as_ref() != Some(task_id) {
            return Err(CoordinatorError::NotAssignedToAgent {
                agent: agent_id.clone(),
                task: task_id.clone(),
            });
        }

        self.provider.update_task_status(task_id, TaskStatus::Blocked).await?;
        if let Some(t) = state.tasks.get_mut(task_id) {
            t.status = TaskStatus::Blocked;
        }

        self.provider
            .add_comment(task_id, &format!("BLOCKER[{severity}]: {description}"))
            .await?;

        let task = state
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.clone()))?;

        let (suggestions, _source) = tokio::time::timeout(
            self.ai_timeout,
            self.ai.analyze_blocker(description, &task, severity),
        )
        .await
        .unwrap_or_else(|_| {
            (
                ai::fallback_blocker_suggestions(description, &task, severity),
                ai::Source::Fallback,
            )
        });

        state.blockers.insert(
            task_id.clone(),
            Blocker {
                task_id: task_id.clone(),
                agent_id: agent_id.clone(),
                description: description.to_string(),
                severity,
                reported_at: Utc::now(),
                resolved: false,
                resolution: None,
                suggestions: suggestions.clone(),
            },
        );

        Ok(suggestions)
    }

    // ---- read-only views --------------------------------------------------

    pub async fn get_project_status(&self) -> ProjectSnapshot {
        let state = self.state.lock().await;
        let now = Utc::now();

        let mut snapshot = ProjectSnapshot {
            refreshed_at: now,
            ..Default::default()
        };

        for task in state.tasks.values() {
            snapshot.total += 1;
            match task.status {
                TaskStatus::Todo => snapshot.todo += 1,
                TaskStatus::InProgress => snapshot.in_progress += 1,
                TaskStatus::Done => snapshot.done += 1,
                TaskStatus::Blocked => snapshot.blocked += 1,
            }
            if task.is_overdue(now) {
                snapshot.overdue_task_ids.push(task.id.clone());
            }
        }

        snapshot.active_agents = state.agents.values().filter(|a| !a.is_available()).count() as u64;
        snapshot.available_agents = state.agents.values().filter(|a| a.is_available()).count() as u64;

        snapshot
    }

    pub async fn get_agent_status(&self, id: &AgentId) -> Result<Agent> {
        let state = self.state.lock().await;
        state
            .agents
            .get(id)
            .cloned()
            .ok_or_else(|| CoordinatorError::AgentNotFound(id.clone()))
    }

    pub async fn list_agents(&self) -> Vec<Agent> {
        let state = self.state.lock().await;
        state.agents.values().cloned().collect()
    }

    // ---- reconciliation (invoked by the health monitor) --------------------

    /// Performs one reconciliation pass: makes the persisted assignment set
    /// agree with the kanban board and the in-memory agent registry.
    /// Returns a report for observability and testing; never panics.
    pub async fn reconcile_once(&self) -> Result<ReconciliationReport> {
        let mut state = self.state.lock().await;
        let mut report = ReconciliationReport::default();
        let now = Utc::now();

        let persisted = self.store.list_active().await?;

        for assignment in persisted {
            let task_id = assignment.task_id.clone();

            if !state.agents.contains_key(&assignment.agent_id) {
                if let Err(e) = self
                    .provider
                    .update_task_status(&task_id, TaskStatus::Todo)
                    .await
                {
                    warn!(task_id = %task_id, error = %e, "failed to revert orphaned task to TODO");
                }
                if let Err(e) = self.store.clear(&task_id).await {
                    warn!(task_id = %task_id, error = %e, "failed to clear orphaned assignment");
                }
                state.assignments.remove(&task_id);
                if let Some(t) = state.tasks.get_mut(&task_id) {
                    t.status = TaskStatus::Todo;
                    t.assigned_to = None;
                }
                report.agent_gone.push(task_id);
                continue;
            }

            match self.provider.get_task(&task_id).await {
                Ok(t) if t.status == TaskStatus::Done => {
                    let _ = self.store.clear(&task_id).await;
                    state.assignments.remove(&task_id);
                    if let Some(a) = state.agents.get_mut(&assignment.agent_id) {
                        if a.current_task_id.as_ref() == Some(&task_id) {
                            a.current_task_id = None;
                            a.completed_count += 1;
                        }
                    }
                    state.tasks.insert(t.id.clone(), t);
                    report.completed_externally.push(task_id);
                }
                Ok(t)
                    if t.status == TaskStatus::Todo
                        || t.assigned_to.as_deref() != Some(assignment.agent_id.as_str()) =>
                {
                    let _ = self.store.clear(&task_id).await;
                    state.assignments.remove(&task_id);
                    if let Some(a) = state.agents.get_mut(&assignment.agent_id) {
                        if a.current_task_id.as_ref() == Some(&task_id) {
                            a.current_task_id = None;
                        }
                    }
                    state.tasks.insert(t.id.clone(), t);
                    report.lost.push(task_id);
                }
                Ok(t) => {
                    state.tasks.insert(t.id.clone(), t);
                }
                Err(ProviderError::NotFound(_)) => {
                    let _ = self.store.clear(&task_id).await;
                    state.assignments.remove(&task_id);
                    if let Some(a) = state.agents.get_mut(&assignment.agent_id) {
                        if a.current_task_id.as_ref() == Some(&task_id) {
                            a.current_task_id = None;
                        }
                    }
                    report.not_found.push(task_id);
                }
                Err(e) => {
                    debug!(task_id = %task_id, error = %e, "reconciliation: transient provider error, leaving assignment untouched");
                    report.errors.push(task_id);
                }
            }
        }

        let dangling: Vec<(AgentId, TaskId)> = state
            .agents
            .values()
            .filter_map(|a| a.current_task_id.clone().map(|t| (a.id.clone(), t)))
            .filter(|(_, t)| !state.assignments.contains_key(t))
            .collect();
        for (agent_id, task_id) in dangling {
            if let Some(a) = state.agents.get_mut(&agent_id) {
                a.current_task_id = None;
            }
            report.agent_slot_cleared.push(task_id);
        }

        for assignment in state.assignments.values() {
            if assignment.is_stalled(now, self.stall_threshold) {
                report.stalled.push(assignment.task_id.clone());
            }
        }

        info!(
            agent_gone = report.agent_gone.len(),
            completed_externally = report.completed_externally.len(),
            lost = report.lost.len(),
            not_found = report.not_found.len(),
            stalled = report.stalled.len(),
            "reconciliation pass complete"
        );

        Ok(report)
    }
}
