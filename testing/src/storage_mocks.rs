//! In-memory key-value storage testing utilities
//!
//! - [`InMemoryKeyValueStore`]: `HashMap`-based storage with write counting
//! - [`FaultyKeyValueStore`]: wrapper that fails or delays operations on demand

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use pocket_todo_core::storage::{KeyValueStore, StorageError, StorageFuture};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// In-memory key-value store for fast, deterministic testing.
///
/// Clones share the same map, so a test can keep one handle for assertions
/// and hand another to the code under test.
///
/// # Example
///
/// ```
/// use pocket_todo_core::storage::KeyValueStore;
/// use pocket_todo_testing::InMemoryKeyValueStore;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryKeyValueStore::new();
/// store.set("todos", "[]".to_string()).await.unwrap();
/// assert_eq!(store.writes(), 1);
/// assert_eq!(store.value("todos").as_deref(), Some("[]"));
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeyValueStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.write().unwrap().insert(key.into(), value.into());
        self
    }

    /// Current value for `key`, read synchronously for assertions
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Number of successful `set` calls
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().unwrap().is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.value(key)) })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if key.is_empty() {
                return Err(StorageError::InvalidKey(String::new()));
            }
            self.data.write().unwrap().insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Storage wrapper that injects failures and latency.
///
/// Reads and writes pass through to the inner store unless the matching
/// failure switch is on. Scripted delays are consumed one per call, which
/// lets a test make an early write finish after a later one or hold the
/// initial read open.
///
/// # Example
///
/// ```
/// use pocket_todo_core::storage::{KeyValueStore, StorageError};
/// use pocket_todo_testing::{FaultyKeyValueStore, InMemoryKeyValueStore};
///
/// # tokio_test::block_on(async {
/// let store = FaultyKeyValueStore::new(InMemoryKeyValueStore::new());
/// store.fail_writes(true);
/// let result = store.set("todos", "[]".to_string()).await;
/// assert!(matches!(result, Err(StorageError::Unavailable(_))));
/// # });
/// ```
#[derive(Clone)]
pub struct FaultyKeyValueStore {
    inner: Arc<dyn KeyValueStore>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    read_delays: Arc<Mutex<VecDeque<Duration>>>,
    write_delays: Arc<Mutex<VecDeque<Duration>>>,
    failed_operations: Arc<AtomicUsize>,
}

impl FaultyKeyValueStore {
    /// Wrap `inner`; all operations succeed until a switch is flipped
    pub fn new(inner: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            read_delays: Arc::new(Mutex::new(VecDeque::new())),
            write_delays: Arc::new(Mutex::new(VecDeque::new())),
            failed_operations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every `get` fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Queue delays applied to the next `get` calls, in order
    pub fn delay_next_reads(&self, delays: impl IntoIterator<Item = Duration>) {
        self.read_delays.lock().unwrap().extend(delays);
    }

    /// Queue delays applied to the next `set` calls, in order
    pub fn delay_next_writes(&self, delays: impl IntoIterator<Item = Duration>) {
        self.write_delays.lock().unwrap().extend(delays);
    }

    /// Number of operations that were failed on purpose
    #[must_use]
    pub fn failed_operations(&self) -> usize {
        self.failed_operations.load(Ordering::SeqCst)
    }

    fn injected(&self, operation: &str) -> StorageError {
        self.failed_operations.fetch_add(1, Ordering::SeqCst);
        StorageError::Unavailable(format!("injected {operation} failure"))
    }
}

impl std::fmt::Debug for FaultyKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyKeyValueStore")
            .field("fail_reads", &self.fail_reads.load(Ordering::SeqCst))
            .field("fail_writes", &self.fail_writes.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for FaultyKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            let delay = self.read_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(self.injected("read"));
            }
            self.inner.get(key).await
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let delay = self.write_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(self.injected("write"));
            }
            self.inner.set(key, value).await
        })
    }
}
