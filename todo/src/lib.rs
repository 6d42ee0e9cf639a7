//! A single-list todo store with on-device persistence.
//!
//! The list lives in a [`TodoState`] owned by a runtime `Store`. User
//! intents are reduced synchronously by [`TodoReducer`]; every change is
//! followed by a full-list snapshot written to a [`KeyValueStore`] under
//! [`TODOS_KEY`](persistence::TODOS_KEY).
//!
//! - Ids are timestamp-derived and strictly increasing
//! - Snapshots carry sequence numbers so an older one never overwrites a newer one
//! - Storage failures never reach the caller; they are recorded in
//!   [`PersistenceHealth`]
//!
//! # Quick Start
//!
//! ```no_run
//! use pocket_todo::TodoApp;
//! use pocket_todo_core::environment::SystemClock;
//! use pocket_todo_storage::FileKeyValueStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = TodoApp::start(
//!     Arc::new(FileKeyValueStore::new("pocket-todo.json")),
//!     Arc::new(SystemClock),
//! )
//! .await;
//!
//! app.add("Buy milk").await?;
//! let id = app.todos().await[0].id();
//! app.toggle(id).await?;
//!
//! println!("{:?}", app.stats().await);
//! app.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`KeyValueStore`]: pocket_todo_core::storage::KeyValueStore

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod config;
pub mod persistence;
pub mod reducer;
pub mod types;
pub mod view;

pub use app::{TodoApp, TodoStore};
pub use config::Config;
pub use persistence::{PersistenceError, SnapshotWriter, TODOS_KEY, WriteOutcome};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use types::{
    LoadPhase, PersistenceHealth, PersistenceOutcome, Todo, TodoAction, TodoId, TodoState,
    TodoStats,
};
