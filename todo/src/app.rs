//! High-level handle used by the presentation layer.

use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{LoadPhase, PersistenceHealth, Todo, TodoAction, TodoId, TodoState, TodoStats};
use pocket_todo_core::environment::Clock;
use pocket_todo_core::storage::KeyValueStore;
use pocket_todo_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Store specialized for the todo list
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Default bound on how long [`TodoApp::start`] waits for the initial load
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Owned todo list with persistence
///
/// Mutations return as soon as the in-memory list is updated; the matching
/// snapshot is written in the background. Use [`TodoApp::flush`] to wait
/// for pending writes.
///
/// # Example
///
/// ```no_run
/// use pocket_todo::TodoApp;
/// use pocket_todo_core::environment::SystemClock;
/// use pocket_todo_storage::FileKeyValueStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), pocket_todo_runtime::StoreError> {
/// let storage = Arc::new(FileKeyValueStore::new("todos.json"));
/// let app = TodoApp::start(storage, Arc::new(SystemClock)).await;
/// app.add("Buy milk").await?;
/// println!("{:?}", app.stats().await);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
}

impl TodoApp {
    /// Build the store and wait for the initial load with the default timeout
    pub async fn start(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::start_with(storage, clock, StoreConfig::default(), DEFAULT_LOAD_TIMEOUT).await
    }

    /// Build the store with a custom runtime configuration and load timeout
    ///
    /// If storage does not answer within `load_timeout` the app is returned
    /// still in [`LoadPhase::Loading`]; the load keeps running.
    pub async fn start_with(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: StoreConfig,
        load_timeout: Duration,
    ) -> Self {
        let env = TodoEnvironment::new(clock, storage);
        let store = Store::with_config(TodoState::new(), TodoReducer::new(), env, config);
        let app = Self { store };

        match app.store.send(TodoAction::Load).await {
            Ok(()) => {
                if let Err(error) = app.store.wait_for_idle(load_timeout).await {
                    tracing::warn!(%error, "Initial load still running");
                }
            },
            Err(error) => tracing::error!(%error, "Could not start initial load"),
        }

        app
    }

    /// Underlying store, for subscribing to feedback actions
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Add a todo; blank text is ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoApp::shutdown`].
    pub async fn add(&self, text: impl Into<String>) -> Result<(), StoreError> {
        self.store.send(TodoAction::Add { text: text.into() }).await
    }

    /// Flip a todo between pending and completed; unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoApp::shutdown`].
    pub async fn toggle(&self, id: TodoId) -> Result<(), StoreError> {
        self.store.send(TodoAction::Toggle { id }).await
    }

    /// Remove a todo; unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoApp::shutdown`].
    pub async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        self.store.send(TodoAction::Delete { id }).await
    }

    /// Todos, newest first
    pub async fn todos(&self) -> Vec<Todo> {
        self.store.state(|s| s.todos().to_vec()).await
    }

    /// Counts over the whole list
    pub async fn stats(&self) -> TodoStats {
        self.store.state(TodoState::stats).await
    }

    /// Counts for display, hidden while the list is empty
    pub async fn summary(&self) -> Option<TodoStats> {
        self.store.state(TodoState::summary).await
    }

    /// Whether the initial load has finished
    pub async fn phase(&self) -> LoadPhase {
        self.store.state(TodoState::phase).await
    }

    /// Persistence health
    pub async fn health(&self) -> PersistenceHealth {
        self.store.state(|s| s.health().clone()).await
    }

    /// Wait for every pending snapshot write
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if writes are still running after `timeout`.
    pub async fn flush(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.wait_for_idle(timeout).await
    }

    /// Stop accepting changes and wait for pending writes
    ///
    /// An initial load still in flight finishes first, so changes made
    /// while loading are saved as well.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if writes are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl std::fmt::Debug for TodoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoApp")
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
