//! # Pocket Todo Testing
//!
//! Testing utilities and helpers for the pocket-todo reducer architecture.
//!
//! This crate provides:
//! - Mock clocks for deterministic, timestamp-derived ids
//! - In-memory and fault-injecting key-value stores
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - proptest strategies for user-entered text
//!
//! ## Example
//!
//! ```
//! use pocket_todo_core::storage::KeyValueStore;
//! use pocket_todo_testing::InMemoryKeyValueStore;
//!
//! # tokio_test::block_on(async {
//! let storage = InMemoryKeyValueStore::new().with_entry("todos", "[]");
//! assert_eq!(storage.get("todos").await.unwrap().as_deref(), Some("[]"));
//! # });
//! ```

use chrono::{DateTime, Utc};
use pocket_todo_core::environment::Clock;

/// Ergonomic testing utilities for reducers
pub mod reducer_test;

/// In-memory and fault-injecting key-value stores
pub mod storage_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use pocket_todo_testing::mocks::FixedClock;
    /// use pocket_todo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock whose time only moves when a test advances it
    ///
    /// Clones share the same underlying time.
    ///
    /// ```
    /// use pocket_todo_testing::mocks::ManualClock;
    /// use pocket_todo_core::environment::Clock;
    ///
    /// let clock = ManualClock::at_millis(1_000);
    /// clock.advance_millis(5);
    /// assert_eq!(clock.now_millis(), 1_005);
    /// clock.set_millis(10);
    /// assert_eq!(clock.now_millis(), 10);
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        millis: Arc<AtomicI64>,
    }

    impl ManualClock {
        /// Create a clock reading `millis` since the Unix epoch
        #[must_use]
        pub fn at_millis(millis: i64) -> Self {
            Self {
                millis: Arc::new(AtomicI64::new(millis)),
            }
        }

        /// Move the clock forward
        pub fn advance_millis(&self, delta: i64) {
            self.millis.fetch_add(delta, Ordering::SeqCst);
        }

        /// Jump to an absolute time, possibly backwards
        pub fn set_millis(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
                .unwrap_or_default()
        }

        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }

    /// Milliseconds of the default test instant (2025-01-01 00:00:00 UTC)
    pub const TEST_EPOCH_MILLIS: i64 = 1_735_689_600_000;

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::<Utc>::from_timestamp_millis(TEST_EPOCH_MILLIS)
                .unwrap_or_default(),
        )
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Text a user might type that survives trimming
    ///
    /// May carry surrounding whitespace; the trimmed form is never empty.
    pub fn todo_text() -> impl Strategy<Value = String> {
        ("[ \t]{0,3}", "[A-Za-z0-9][A-Za-z0-9 ,.!?-]{0,38}", "[ \t]{0,3}")
            .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
    }

    /// Whitespace-only (or empty) input
    pub fn blank_text() -> impl Strategy<Value = String> {
        "[ \t\n\r]{0,6}"
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use storage_mocks::{FaultyKeyValueStore, InMemoryKeyValueStore};
