//! Domain types for the todo list.
//!
//! A todo list is an ordered, newest-first collection of short text tasks.
//! Each task can be toggled between pending and completed, or deleted.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a todo, derived from its creation timestamp
/// (milliseconds since the Unix epoch)
///
/// Serialized as a bare integer. Integral floats such as `1735689600000.0`
/// are accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// Creates a `TodoId` from its raw value
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TodoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_i64(TodoIdVisitor)
    }
}

struct TodoIdVisitor;

impl Visitor<'_> for TodoIdVisitor {
    type Value = TodoId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer todo id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TodoId, E> {
        Ok(TodoId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TodoId, E> {
        i64::try_from(v)
            .map(TodoId)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TodoId, E> {
        // 2^63; the first float that no longer fits in i64
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if v.fract() == 0.0 && v >= -LIMIT && v < LIMIT {
            Ok(TodoId(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A single task
///
/// `id` and `text` never change after creation; only the completion flag
/// can be toggled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    id: TodoId,
    text: String,
    #[serde(default)]
    completed: bool,
}

impl Todo {
    /// Creates a pending todo
    #[must_use]
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }

    /// Same todo with the given completion flag
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Identifier
    #[must_use]
    pub const fn id(&self) -> TodoId {
        self.id
    }

    /// Task text, already trimmed
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the task is done
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Same todo under a new id, for todos that were never persisted
    #[must_use]
    pub(crate) const fn reissued(mut self, id: TodoId) -> Self {
        self.id = id;
        self
    }

    /// Flip the completion flag
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Aggregate counts over a list
///
/// `completed + pending == total` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TodoStats {
    /// Number of todos
    pub total: usize,
    /// Number of completed todos
    pub completed: usize,
    /// Number of todos still pending
    pub pending: usize,
}

impl TodoStats {
    /// Count the todos in `todos`
    #[must_use]
    pub fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|t| t.is_completed()).count();
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

/// Whether the initial load from storage has finished
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Waiting for the first load to complete
    #[default]
    Loading,
    /// The first load completed (successfully or not)
    Ready,
}

/// Result of the most recent storage operation of one kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PersistenceOutcome {
    /// Nothing has been attempted yet
    #[default]
    Unknown,
    /// The last attempt succeeded
    Ok,
    /// The last attempt failed
    Failed {
        /// Human-readable failure
        error: String,
    },
}

impl PersistenceOutcome {
    /// Returns true unless the last attempt failed
    #[must_use]
    pub const fn is_ok_or_unknown(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Persistence health, for callers that want to surface it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistenceHealth {
    /// Outcome of the initial load
    pub last_load: PersistenceOutcome,
    /// Outcome of the newest snapshot write that completed
    pub last_write: PersistenceOutcome,
    /// Sequence number of the newest snapshot that reached storage
    pub last_applied_write: Option<u64>,
    /// Total snapshot writes that failed
    pub failed_writes: u64,
}

impl PersistenceHealth {
    /// True when neither the load nor the newest write failed
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.last_load.is_ok_or_unknown() && self.last_write.is_ok_or_unknown()
    }

    /// Most recent failure message, preferring write failures
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        [&self.last_write, &self.last_load]
            .into_iter()
            .find_map(|outcome| match outcome {
                PersistenceOutcome::Failed { error } => Some(error.as_str()),
                _ => None,
            })
    }

    pub(crate) fn record_write(&mut self, seq: u64) {
        if self.last_applied_write.is_none_or(|last| seq > last) {
            self.last_applied_write = Some(seq);
            self.last_write = PersistenceOutcome::Ok;
        }
    }

    pub(crate) fn record_write_failure(&mut self, seq: Option<u64>, error: String) {
        self.failed_writes += 1;
        let superseded = match (seq, self.last_applied_write) {
            (Some(seq), Some(last)) => seq < last,
            _ => false,
        };
        if !superseded {
            self.last_write = PersistenceOutcome::Failed { error };
        }
    }
}

/// State of the todo store
#[derive(Clone, Debug, Default)]
pub struct TodoState {
    todos: Vec<Todo>,
    phase: LoadPhase,
    health: PersistenceHealth,
    last_issued_id: Option<TodoId>,
    write_seq: u64,
}

impl TodoState {
    /// Empty state waiting for the initial load
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State that has already loaded `todos` (newest first)
    #[must_use]
    pub fn ready(todos: Vec<Todo>) -> Self {
        let last_issued_id = todos.iter().map(Todo::id).max();
        Self {
            todos,
            phase: LoadPhase::Ready,
            last_issued_id,
            ..Self::default()
        }
    }

    /// Todos, newest first
    #[must_use]
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id() == id)
    }

    /// Number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Aggregate counts
    #[must_use]
    pub fn stats(&self) -> TodoStats {
        TodoStats::from_todos(&self.todos)
    }

    /// Counts for display; `None` while the list is empty
    #[must_use]
    pub fn summary(&self) -> Option<TodoStats> {
        (!self.is_empty()).then(|| self.stats())
    }

    /// Initial load progress
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Persistence health
    #[must_use]
    pub const fn health(&self) -> &PersistenceHealth {
        &self.health
    }

    /// Sequence number of the newest snapshot issued
    #[must_use]
    pub const fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub(crate) fn todos_mut(&mut self) -> &mut Vec<Todo> {
        &mut self.todos
    }

    pub(crate) fn health_mut(&mut self) -> &mut PersistenceHealth {
        &mut self.health
    }

    pub(crate) fn set_phase(&mut self, phase: LoadPhase) {
        self.phase = phase;
    }

    /// Next id: the clock reading, bumped past every id issued or loaded so far
    pub(crate) fn issue_id(&mut self, now_millis: i64) -> TodoId {
        let id = match self.last_issued_id {
            Some(last) if now_millis <= last.get() => TodoId::new(last.get().saturating_add(1)),
            _ => TodoId::new(now_millis),
        };
        self.last_issued_id = Some(id);
        id
    }

    /// Remember ids seen in storage so they are never reissued
    pub(crate) fn observe_ids(&mut self, ids: impl IntoIterator<Item = TodoId>) {
        let max = ids.into_iter().max();
        self.last_issued_id = self.last_issued_id.max(max);
    }

    pub(crate) fn next_write_seq(&mut self) -> u64 {
        self.write_seq += 1;
        self.write_seq
    }
}

/// Inputs to the todo reducer
///
/// User intents (`Load`, `Add`, `Toggle`, `Delete`) come from the
/// presentation layer. The remaining variants are fed back by persistence
/// effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Read the persisted list (honored once, while loading)
    Load,
    /// Add a todo with the given text
    Add {
        /// Raw user input
        text: String,
    },
    /// Flip the completion flag of a todo
    Toggle {
        /// Todo to toggle
        id: TodoId,
    },
    /// Remove a todo
    Delete {
        /// Todo to delete
        id: TodoId,
    },

    /// Storage was read; `None` when nothing had been stored yet
    Loaded {
        /// Persisted list, newest first
        todos: Option<Vec<Todo>>,
    },
    /// Storage could not be read or held malformed data
    LoadFailed {
        /// Failure description
        error: String,
    },
    /// A snapshot reached storage
    Saved {
        /// Snapshot sequence number
        seq: u64,
    },
    /// A snapshot write failed
    SaveFailed {
        /// Snapshot sequence number
        seq: u64,
        /// Failure description
        error: String,
    },
    /// A snapshot was skipped because a newer one had already been written
    SaveDiscarded {
        /// Snapshot sequence number
        seq: u64,
    },
}

impl TodoAction {
    /// Short variant name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Load => "Load",
            Self::Add { .. } => "Add",
            Self::Toggle { .. } => "Toggle",
            Self::Delete { .. } => "Delete",
            Self::Loaded { .. } => "Loaded",
            Self::LoadFailed { .. } => "LoadFailed",
            Self::Saved { .. } => "Saved",
            Self::SaveFailed { .. } => "SaveFailed",
            Self::SaveDiscarded { .. } => "SaveDiscarded",
        }
    }

    /// Returns true for actions that originate from the user
    #[must_use]
    pub const fn is_intent(&self) -> bool {
        matches!(
            self,
            Self::Load | Self::Add { .. } | Self::Toggle { .. } | Self::Delete { .. }
        )
    }
}
