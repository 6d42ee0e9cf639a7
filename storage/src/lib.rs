//! File-backed key-value storage for pocket-todo.
//!
//! This crate provides the on-device implementation of the `KeyValueStore`
//! trait from `pocket-todo-core`. All keys live in a single JSON object file:
//!
//! ```json
//! { "todos": "[{\"id\":1735689600000,\"text\":\"Buy milk\",\"completed\":false}]" }
//! ```
//!
//! - The file is read lazily on first access and cached in memory
//! - Every `set` rewrites the whole file through a temp file and a rename,
//!   so a crash mid-write leaves the previous contents intact
//! - Operations are serialized by an async mutex
//!
//! # Example
//!
//! ```no_run
//! use pocket_todo_core::storage::KeyValueStore;
//! use pocket_todo_storage::FileKeyValueStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileKeyValueStore::new("/var/lib/pocket-todo/store.json");
//! storage.set("todos", "[]".to_string()).await?;
//! assert_eq!(storage.get("todos").await?.as_deref(), Some("[]"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use pocket_todo_core::storage::{KeyValueStore, StorageError, StorageFuture};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Entries = BTreeMap<String, String>;

/// Key-value store persisted as one JSON object file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    cache: Mutex<Option<Entries>>,
}

impl FileKeyValueStore {
    /// Create a store backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    /// Read and parse the backing file. A missing file is an empty store.
    async fn read_entries(&self) -> Result<Entries, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Storage file absent, starting empty");
                return Ok(Entries::new());
            },
            Err(error) => return Err(error.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&raw).map_err(|error| {
            StorageError::Corrupt(format!("{}: {error}", self.path.display()))
        })
    }

    /// Return the cached entries, loading them on first access
    async fn entries<'a>(
        &self,
        cache: &'a mut Option<Entries>,
    ) -> Result<&'a mut Entries, StorageError> {
        if cache.is_none() {
            *cache = Some(self.read_entries().await?);
        }
        cache
            .as_mut()
            .ok_or_else(|| StorageError::Unavailable("storage cache not loaded".to_string()))
    }

    /// Move an unreadable file out of the way so writes can proceed
    async fn quarantine(&self) -> Result<(), StorageError> {
        let target = self.quarantine_path();
        tracing::warn!(
            path = %self.path.display(),
            quarantine = %target.display(),
            "Storage file is corrupt, moving it aside"
        );
        tokio::fs::rename(&self.path, &target).await?;
        Ok(())
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_string_pretty(entries)
            .map_err(|error| StorageError::Corrupt(error.to_string()))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut cache = self.cache.lock().await;
            let entries = self.entries(&mut cache).await?;
            Ok(entries.get(key).cloned())
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if key.is_empty() {
                return Err(StorageError::InvalidKey(key.to_string()));
            }

            let mut cache = self.cache.lock().await;
            if cache.is_none() {
                match self.read_entries().await {
                    Ok(entries) => *cache = Some(entries),
                    Err(StorageError::Corrupt(_)) => {
                        self.quarantine().await?;
                        *cache = Some(Entries::new());
                    },
                    Err(error) => return Err(error),
                }
            }

            let mut next = self.entries(&mut cache).await?.clone();
            next.insert(key.to_string(), value);

            if let Err(error) = self.write_entries(&next).await {
                metrics::counter!("storage.file.write_failures").increment(1);
                return Err(error);
            }

            *cache = Some(next);
            metrics::counter!("storage.file.writes").increment(1);
            tracing::trace!(key, path = %self.path.display(), "Stored value");
            Ok(())
        })
    }
}
