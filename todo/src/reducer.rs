//! Reducer logic for the todo list.
//!
//! User intents mutate state synchronously and return a snapshot-save
//! effect. Persistence outcomes come back as feedback actions and only
//! touch [`PersistenceHealth`](crate::types::PersistenceHealth).

use crate::persistence::{self, SnapshotWriter, WriteOutcome};
use crate::types::{LoadPhase, PersistenceOutcome, Todo, TodoAction, TodoId, TodoState};
use pocket_todo_core::storage::KeyValueStore;
use pocket_todo_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock used to derive todo ids
    pub clock: Arc<dyn Clock>,
    /// Backing key-value storage
    pub storage: Arc<dyn KeyValueStore>,
    writer: SnapshotWriter,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, storage: Arc<dyn KeyValueStore>) -> Self {
        let writer = SnapshotWriter::new(Arc::clone(&storage));
        Self {
            clock,
            storage,
            writer,
        }
    }

    /// Writer shared by every save effect
    #[must_use]
    pub const fn writer(&self) -> &SnapshotWriter {
        &self.writer
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn load(state: &TodoState, env: &TodoEnvironment) -> Effects {
        if state.phase() == LoadPhase::Ready {
            tracing::debug!("Load ignored: todos already loaded");
            return SmallVec::new();
        }

        let storage = Arc::clone(&env.storage);
        smallvec![Effect::future(async move {
            match persistence::load_todos(storage.as_ref()).await {
                Ok(todos) => Some(TodoAction::Loaded { todos }),
                Err(error) => Some(TodoAction::LoadFailed {
                    error: error.to_string(),
                }),
            }
        })]
    }

    /// Adopt the stored list, keeping anything added while the read was in flight
    ///
    /// A todo added while loading whose id is already taken by a stored todo
    /// gets a fresh id; it has never been written, so nothing refers to it.
    fn loaded(state: &mut TodoState, stored: Option<Vec<Todo>>, env: &TodoEnvironment) -> Effects {
        if state.phase() == LoadPhase::Ready {
            tracing::debug!("Duplicate load result ignored");
            return SmallVec::new();
        }

        state.set_phase(LoadPhase::Ready);
        state.health_mut().last_load = PersistenceOutcome::Ok;

        match stored {
            Some(stored) => {
                state.observe_ids(stored.iter().map(Todo::id));
                let pending = std::mem::take(state.todos_mut());
                let added_while_loading = pending.len();
                let now = env.clock.now_millis();

                let mut merged = Vec::with_capacity(added_while_loading + stored.len());
                for todo in pending {
                    if stored.iter().any(|t| t.id() == todo.id()) {
                        let id = state.issue_id(now);
                        tracing::debug!(old = %todo.id(), new = %id, "Reissued colliding id");
                        merged.push(todo.reissued(id));
                    } else {
                        merged.push(todo);
                    }
                }
                merged.extend(stored);
                *state.todos_mut() = merged;

                tracing::info!(
                    count = state.len(),
                    added_while_loading,
                    "Todos loaded from storage"
                );
            },
            None => tracing::info!("No stored todos, starting empty"),
        }

        Self::save(state, env)
    }

    fn load_failed(state: &mut TodoState, error: String) -> Effects {
        if state.phase() == LoadPhase::Ready {
            return SmallVec::new();
        }

        tracing::warn!(%error, "Failed to load todos, starting empty");
        state.set_phase(LoadPhase::Ready);
        state.health_mut().last_load = PersistenceOutcome::Failed { error };
        SmallVec::new()
    }

    fn add(state: &mut TodoState, text: &str, env: &TodoEnvironment) -> Effects {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Add ignored: blank text");
            return SmallVec::new();
        }

        let id = state.issue_id(env.clock.now_millis());
        state.todos_mut().insert(0, Todo::new(id, text));
        tracing::debug!(%id, "Todo added");
        Self::save(state, env)
    }

    fn toggle(state: &mut TodoState, id: TodoId, env: &TodoEnvironment) -> Effects {
        let Some(todo) = state.todos_mut().iter_mut().find(|t| t.id() == id) else {
            tracing::debug!(%id, "Toggle ignored: unknown id");
            return SmallVec::new();
        };

        todo.toggle();
        tracing::debug!(%id, completed = todo.is_completed(), "Todo toggled");
        Self::save(state, env)
    }

    fn delete(state: &mut TodoState, id: TodoId, env: &TodoEnvironment) -> Effects {
        let Some(index) = state.todos().iter().position(|t| t.id() == id) else {
            tracing::debug!(%id, "Delete ignored: unknown id");
            return SmallVec::new();
        };

        state.todos_mut().remove(index);
        tracing::debug!(%id, "Todo deleted");
        Self::save(state, env)
    }

    /// Snapshot the current list and schedule the write
    ///
    /// Nothing is written before the initial load completes, so a partial
    /// list can never replace what is already stored.
    fn save(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        if state.phase() == LoadPhase::Loading {
            tracing::trace!("Save deferred until load completes");
            return SmallVec::new();
        }

        let seq = state.next_write_seq();
        let payload = match persistence::encode_snapshot(state.todos()) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(seq, %error, "Failed to encode todos");
                state.health_mut().record_write_failure(Some(seq), error.to_string());
                return SmallVec::new();
            },
        };

        let writer = env.writer.clone();
        smallvec![Effect::future(async move {
            match writer.write(seq, payload).await {
                Ok(WriteOutcome::Written) => Some(TodoAction::Saved { seq }),
                Ok(WriteOutcome::Stale { .. }) => Some(TodoAction::SaveDiscarded { seq }),
                Err(error) => Some(TodoAction::SaveFailed {
                    seq,
                    error: error.to_string(),
                }),
            }
        })]
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.name(), "Reducing");

        match action {
            // ========== Intents ==========
            TodoAction::Load => Self::load(state, env),
            TodoAction::Add { text } => Self::add(state, &text, env),
            TodoAction::Toggle { id } => Self::toggle(state, id, env),
            TodoAction::Delete { id } => Self::delete(state, id, env),

            // ========== Persistence feedback ==========
            TodoAction::Loaded { todos } => Self::loaded(state, todos, env),
            TodoAction::LoadFailed { error } => Self::load_failed(state, error),
            TodoAction::Saved { seq } => {
                state.health_mut().record_write(seq);
                SmallVec::new()
            },
            TodoAction::SaveFailed { seq, error } => {
                tracing::warn!(seq, %error, "Failed to save todos");
                state.health_mut().record_write_failure(Some(seq), error);
                SmallVec::new()
            },
            TodoAction::SaveDiscarded { seq } => {
                tracing::debug!(seq, "Superseded snapshot skipped");
                SmallVec::new()
            },
        }
    }
}
