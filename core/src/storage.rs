//! Key-value storage trait and related types.
//!
//! This module defines the persistence gateway consumed by stores: an opaque,
//! asynchronous, fallible string key-value map. It is the on-device storage a
//! store uses to survive process restarts.
//!
//! # Implementations
//!
//! - `FileKeyValueStore` (in `pocket-todo-storage` crate): durable JSON file
//! - `InMemoryKeyValueStore` (in `pocket-todo-testing` crate): fast, deterministic testing
//! - `FaultyKeyValueStore` (in `pocket-todo-testing` crate): fault injection wrapper
//!
//! # Example
//!
//! ```no_run
//! use pocket_todo_core::storage::{KeyValueStore, StorageError};
//!
//! async fn example<S: KeyValueStore>(store: &S) -> Result<(), StorageError> {
//!     store.set("greeting", "hello".to_string()).await?;
//!     let value = store.get("greeting").await?;
//!     assert_eq!(value.as_deref(), Some("hello"));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors that can occur during key-value storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying medium could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The storage medium holds data that cannot be interpreted.
    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    /// The key is not acceptable to this storage backend.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// The storage backend is temporarily unavailable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Asynchronous string key-value store.
///
/// `get` returns `Ok(None)` for a key that has never been written. `set`
/// overwrites any previous value for the key.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` and captured by effects running on the runtime.
///
/// # Dyn Compatibility
///
/// This trait returns boxed futures instead of using `async fn` so it can be
/// used as a trait object (`Arc<dyn KeyValueStore>`) inside an environment.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written or the key
    /// is rejected.
    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()>;
}

impl<T> KeyValueStore for std::sync::Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        (**self).get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        (**self).set(key, value)
    }
}
