//! Durable assignment storage: a single JSON document, written via the
//! standard temp-file-plus-rename sequence so a crash mid-write can never
//! leave a torn file on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use marcus_core::{Assignment, AssignmentStore, CoordinatorError, Result, TaskId};
use tokio::sync::Mutex;
use tracing::debug;

/// `AssignmentStore` backed by one file holding the full active-assignment
/// set as a JSON array. Every mutation rewrites the whole document:
/// acceptable at the scale this engine targets (a handful to a few hundred
/// concurrent assignments), and much simpler than an append log.
pub struct JsonAssignmentStore {
    path: PathBuf,
    /// Serializes the read-modify-write sequence so two concurrent
    /// `record`/`clear` calls on this store can't race each other's
    /// rename. The coordinator already holds its own lock across calls
    /// into this store, but the store must be safe standing alone too.
    guard: Mutex<()>,
}

impl JsonAssignmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn read_map(&self) -> Result<HashMap<TaskId, Assignment>> {
        read_map_at(&self.path).await
    }

    async fn write_map(&self, map: &HashMap<TaskId, Assignment>) -> Result<()> {
        write_map_at(&self.path, &self.tmp_path(), map).await
    }
}

async fn read_map_at(path: &Path) -> Result<HashMap<TaskId, Assignment>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            if bytes.is_empty() {
                return Ok(HashMap::new());
            }
            let assignments: Vec<Assignment> = serde_json::from_slice(&bytes)
                .map_err(|e| CoordinatorError::Persistence(format!("corrupt assignment store: {e}")))?;
            Ok(assignments.into_iter().map(|a| (a.task_id.clone(), a)).collect())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(CoordinatorError::Persistence(format!(
            "failed to read assignment store: {e}"
        ))),
    }
}

async fn write_map_at(
    path: &Path,
    tmp_path: &Path,
    map: &HashMap<TaskId, Assignment>,
) -> Result<()> {
    let assignments: Vec<&Assignment> = map.values().collect();
    let bytes = serde_json::to_vec_pretty(&assignments)
        .map_err(|e| CoordinatorError::Persistence(format!("failed to serialize assignments: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoordinatorError::Persistence(format!("failed to create parent dir: {e}")))?;
        }
    }

    tokio::fs::write(tmp_path, &bytes)
        .await
        .map_err(|e| CoordinatorError::Persistence(format!("failed to write temp file: {e}")))?;

    let tmp_path_owned = tmp_path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        std::fs::File::open(&tmp_path_owned)?.sync_all()
    })
    .await
    .map_err(|e| CoordinatorError::Persistence(format!("fsync task panicked: {e}")))?
    .map_err(|e| CoordinatorError::Persistence(format!("fsync failed: {e}")))?;

    tokio::fs::rename(tmp_path, path)
        .await
        .map_err(|e| CoordinatorError::Persistence(format!("failed to rename temp file: {e}")))?;

    debug!(path = %path.display(), count = assignments.len(), "assignment store written");
    Ok(())
}

#[async_trait]
impl AssignmentStore for JsonAssignmentStore {
    async fn record(&self, assignment: Assignment) -> Result<()> {
        let _lock = self.guard.lock().await;
        let mut map = self.read_map().await?;
        map.insert(assignment.task_id.clone(), assignment);
        self.write_map(&map).await
    }

    async fn clear(&self, task_id: &TaskId) -> Result<()> {
        let _lock = self.guard.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(task_id).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }

    async fn load_all(&self) -> Result<Vec<Assignment>> {
        let _lock = self.guard.lock().await;
        Ok(self.read_map().await?.into_values().collect())
    }
}
