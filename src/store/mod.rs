//! Durable key-value persistence for the timer.
//!
//! Two logical stores share one backend:
//!
//! - [`DeadlineStore`] holds at most one serialized [`TimerSnapshot`]
//!   under [`MEDITATION_STATE_KEY`].
//! - [`DurationPreference`] remembers the last selected duration under
//!   [`LAST_DURATION_KEY`].
//!
//! Backends implement [`KeyValueStore`]. [`FileKeyValueStore`] survives
//! process restarts; [`MemoryKeyValueStore`] is used by tests and can be
//! told to fail.
//!
//! [`TimerSnapshot`]: crate::types::TimerSnapshot
//! [`MEDITATION_STATE_KEY`]: crate::types::MEDITATION_STATE_KEY
//! [`LAST_DURATION_KEY`]: crate::types::LAST_DURATION_KEY

mod deadline;
mod error;
mod file;
mod preference;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub use deadline::DeadlineStore;
pub use error::StoreError;
pub use file::FileKeyValueStore;
pub use preference::DurationPreference;

/// Trait for string key-value persistence.
///
/// Last write wins; no compare-and-swap is offered because only one
/// session is ever active at a time.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for testing.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    should_fail: AtomicBool,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Returns the raw stored value, bypassing failure injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Returns true if `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
