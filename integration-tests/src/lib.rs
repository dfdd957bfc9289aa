//! Shared harness for the end-to-end scenario tests in `tests/`: builds a
//! fully wired [`marcus_core::Coordinator`] over an in-memory kanban board
//! and a temp-file-backed assignment store, then dispatches `tools/call`
//! requests through the same `mcp_protocol::tools::dispatch` entry point
//! the stdio and SSE transports use.

use std::sync::Arc;
use std::time::Duration;

use marcus_core::ai::NullAiAdapter;
use marcus_core::{Coordinator, KanbanProvider, NewTask};
use tempfile::NamedTempFile;

/// A coordinator wired to an in-memory provider, holding the temp file so
/// it isn't cleaned up until the test is done with it.
pub struct Harness {
    pub coordinator: Arc<Coordinator>,
    provider: Arc<dyn KanbanProvider>,
    _persistence_file: NamedTempFile,
}

impl Harness {
    /// Builds a harness whose board is seeded with `tasks` and whose
    /// stall threshold and AI timeout match the service's configured
    /// defaults.
    pub fn new(tasks: Vec<NewTask>) -> Self {
        let persistence_file = NamedTempFile::new().expect("create temp persistence file");
        let provider: Arc<dyn KanbanProvider> = Arc::new(database::InMemoryProvider::seeded(tasks));
        let store = Arc::new(database::JsonAssignmentStore::new(persistence_file.path()));
        let coordinator = Arc::new(Coordinator::new(
            provider.clone(),
            store,
            Arc::new(NullAiAdapter),
            Duration::from_secs(10),
            chrono::Duration::hours(24),
        ));
        Self { coordinator, provider, _persistence_file: persistence_file }
    }

    /// The same kanban provider handle the coordinator was built with, for
    /// tests that simulate a restart by wiring a fresh `Coordinator` over
    /// the surviving provider and persistence file.
    pub fn provider(&self) -> Arc<dyn KanbanProvider> {
        self.provider.clone()
    }

    /// Dispatches one `tools/call`-shaped request and returns the raw tool
    /// result value (unwrapped from the JSON-RPC envelope).
    pub async fn call(&self, tool: &str, arguments: serde_json::Value) -> serde_json::Value {
        mcp_protocol::tools::dispatch(&self.coordinator, tool, arguments)
            .await
            .unwrap_or_else(|e| panic!("tool call {tool} failed: {e}"))
    }

    /// The path of this harness's persisted-assignment file, for tests
    /// that assert on what got written to disk.
    pub fn persistence_path(&self) -> std::path::PathBuf {
        self._persistence_file.path().to_path_buf()
    }
}

/// A `NewTask` builder for scenario fixtures, with explicit control over
/// priority, labels, and dependencies.
pub fn new_task(id: &str, name: &str, priority: marcus_core::Priority) -> NewTask {
    NewTask {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        priority,
        labels: Default::default(),
        dependencies: Default::default(),
        estimated_hours: 1.0,
        due_date: None,
    }
}
