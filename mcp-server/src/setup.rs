//! Wires configuration into a running [`Coordinator`], its background
//! [`HealthMonitor`], and the chosen provider/store/AI-adapter
//! collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use database::{InMemoryProvider, JsonAssignmentStore};
use marcus_core::ai::{InstructionAdapter, NullAiAdapter};
use marcus_core::provider::{KanbanProvider, ProviderKind};
use marcus_core::{AssignmentStore, Coordinator, HealthMonitor};

use crate::config::Config;

/// Builds the configured [`KanbanProvider`]. Only `memory` has a concrete
/// implementation in this workspace; selecting any other kind is a
/// configuration error caught by [`Config::validate`] plus this function's
/// own guard, never a panic.
pub fn build_provider(config: &Config) -> Result<Arc<dyn KanbanProvider>> {
    match config.provider.kind {
        ProviderKind::Memory => {
            info!("using in-memory kanban provider");
            Ok(Arc::new(InMemoryProvider::new()))
        }
        other => bail!(
            "provider.kind is {other:?}, but this build ships no concrete wire client for it \
             (only `memory` is implemented)"
        ),
    }
}

/// Builds the durable assignment store.
pub fn build_store(config: &Config) -> Arc<dyn AssignmentStore> {
    info!(path = %config.persistence.path, "using JSON assignment store");
    Arc::new(JsonAssignmentStore::new(config.persistence.path.clone()))
}

/// Builds the AI Enrichment Adapter. Marcus ships no concrete LLM vendor
/// client, so every configuration resolves to the deterministic-fallback
/// adapter; an `ai.api_key` is accepted for forward compatibility but
/// currently unused.
pub fn build_ai_adapter(_config: &Config) -> Arc<dyn InstructionAdapter> {
    Arc::new(NullAiAdapter)
}

/// Assembles the coordinator from its collaborators, without bootstrapping
/// persisted state or attempting the initial provider connection; see
/// [`initialize_app`] for the full startup sequence.
pub fn build_coordinator(config: &Config) -> Result<Arc<Coordinator>> {
    let provider = build_provider(config)?;
    let store = build_store(config);
    let ai = build_ai_adapter(config);

    Ok(Arc::new(Coordinator::new(
        provider,
        store,
        ai,
        Duration::from_secs(config.ai.timeout_seconds),
        chrono::Duration::hours(config.monitor.stall_threshold_hours as i64),
    )))
}

/// Full startup sequence: build the coordinator, connect to the board
/// once, and replay any persisted assignments. Returns the coordinator
/// ready for transports and the health monitor to be attached.
pub async fn initialize_app(config: &Config) -> Result<Arc<Coordinator>> {
    info!("initializing application");

    let coordinator = build_coordinator(config).context("failed to build coordinator")?;

    coordinator
        .provider()
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("provider connection failed: {e}"))
        .context("initial provider.connect() failed")?;

    let restored = coordinator.bootstrap().await.context("failed to bootstrap persisted assignments")?;
    info!(restored_assignments = restored, "bootstrap complete");

    info!("application initialized successfully");
    Ok(coordinator)
}

/// Spawns the background reconciliation loop at the configured interval.
pub fn spawn_health_monitor(config: &Config, coordinator: Arc<Coordinator>) -> HealthMonitor {
    HealthMonitor::spawn(coordinator, Duration::from_secs(config.monitor.interval_seconds))
}

/// Ensures the parent directory of the configured persistence path exists,
/// so the first `AssignmentStore::record` call doesn't fail on a missing
/// directory.
pub fn ensure_persistence_directory(config: &Config) -> Result<()> {
    let path = std::path::Path::new(&config.persistence.path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!(dir = %parent.display(), "creating persistence directory");
            std::fs::create_dir_all(parent).context("failed to create persistence directory")?;
        }
    }
    Ok(())
}
