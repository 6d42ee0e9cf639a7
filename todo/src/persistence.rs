//! Snapshot persistence for the todo list.
//!
//! The whole list is stored as one JSON array under [`TODOS_KEY`]. Every
//! mutation produces a full snapshot tagged with a monotonically increasing
//! sequence number; [`SnapshotWriter`] applies snapshots so that an older
//! snapshot can never overwrite a newer one.

use crate::types::{Todo, TodoId};
use pocket_todo_core::storage::{KeyValueStore, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Storage key holding the serialized list
pub const TODOS_KEY: &str = "todos";

/// Errors from loading or saving the list
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The storage backend failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The stored value is not a valid todo list
    #[error("stored todos are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialize the list, newest first
///
/// # Errors
///
/// Returns [`PersistenceError::Malformed`] if serialization fails.
pub fn encode_snapshot(todos: &[Todo]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(todos)?)
}

/// Parse a stored list
///
/// Records without `completed` are treated as pending and unknown fields are
/// ignored. When two records share an id, the first one wins.
///
/// # Errors
///
/// Returns [`PersistenceError::Malformed`] if `raw` is not a JSON array of
/// todo records.
pub fn decode_snapshot(raw: &str) -> Result<Vec<Todo>, PersistenceError> {
    let todos: Vec<Todo> = serde_json::from_str(raw)?;
    Ok(dedupe(todos))
}

fn dedupe(todos: Vec<Todo>) -> Vec<Todo> {
    let mut seen: HashSet<TodoId> = HashSet::with_capacity(todos.len());
    let before = todos.len();
    let unique: Vec<Todo> = todos.into_iter().filter(|t| seen.insert(t.id())).collect();
    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "Stored todos contained duplicate ids"
        );
    }
    unique
}

/// Read the list from `storage`
///
/// Returns `Ok(None)` when nothing has been stored under [`TODOS_KEY`].
///
/// # Errors
///
/// Returns [`PersistenceError::Storage`] if the read fails, or
/// [`PersistenceError::Malformed`] if the stored value cannot be parsed.
pub async fn load_todos(storage: &dyn KeyValueStore) -> Result<Option<Vec<Todo>>, PersistenceError> {
    match storage.get(TODOS_KEY).await? {
        Some(raw) => decode_snapshot(&raw).map(Some),
        None => Ok(None),
    }
}

/// What happened to a snapshot handed to [`SnapshotWriter::write`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot is now in storage
    Written,
    /// A newer snapshot was already written; this one was skipped
    Stale {
        /// Sequence number of the snapshot in storage
        latest: u64,
    },
}

/// Applies sequenced snapshots to storage, newest wins
///
/// Writes are serialized. A snapshot whose sequence number is not greater
/// than the last one written is skipped, so storage always converges to the
/// newest state even when save tasks finish out of order.
#[derive(Clone)]
pub struct SnapshotWriter {
    storage: Arc<dyn KeyValueStore>,
    last_applied: Arc<Mutex<Option<u64>>>,
}

impl SnapshotWriter {
    /// Create a writer over `storage`
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            last_applied: Arc::new(Mutex::new(None)),
        }
    }

    /// Sequence number of the newest snapshot written so far
    pub async fn last_applied(&self) -> Option<u64> {
        *self.last_applied.lock().await
    }

    /// Write snapshot `seq` unless a newer one is already stored
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Storage`] if the backend rejects the write.
    /// A failed write does not advance the last applied sequence number.
    pub async fn write(&self, seq: u64, payload: String) -> Result<WriteOutcome, PersistenceError> {
        let mut last_applied = self.last_applied.lock().await;
        if let Some(latest) = *last_applied {
            if seq <= latest {
                tracing::debug!(seq, latest, "Skipping stale snapshot");
                return Ok(WriteOutcome::Stale { latest });
            }
        }

        self.storage.set(TODOS_KEY, payload).await?;
        *last_applied = Some(seq);
        tracing::trace!(seq, "Snapshot written");
        Ok(WriteOutcome::Written)
    }
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter").finish_non_exhaustive()
    }
}
