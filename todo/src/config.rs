//! Configuration for the pocket-todo binary.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the storage file
pub const DEFAULT_DATA_FILE: &str = "pocket-todo.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage file (`POCKET_TODO_DATA_FILE`)
    pub data_file: PathBuf,
    /// Log filter (`RUST_LOG`)
    pub log_level: String,
    /// Seconds to wait for pending writes on exit (`POCKET_TODO_SHUTDOWN_TIMEOUT`)
    pub shutdown_timeout: u64,
}

impl Config {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Unparseable numbers fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_file: lookup("POCKET_TODO_DATA_FILE")
                .filter(|s| !s.trim().is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            shutdown_timeout: lookup("POCKET_TODO_SHUTDOWN_TIMEOUT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(5),
        }
    }

    /// Shutdown timeout as a [`Duration`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
