//! The deadline store: at most one persisted timer snapshot.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::StoreError;
use super::KeyValueStore;
use crate::types::{TimerSnapshot, MEDITATION_STATE_KEY};

/// Persists the snapshot of a running countdown.
#[derive(Clone)]
pub struct DeadlineStore {
    backend: Arc<dyn KeyValueStore>,
}

impl DeadlineStore {
    /// Creates a deadline store on top of `backend`.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Reads and decodes the stored snapshot.
    ///
    /// Snapshots that are inactive or break the active/deadline pairing
    /// are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the value cannot be decoded.
    pub fn try_load(&self) -> Result<Option<TimerSnapshot>, StoreError> {
        let Some(raw) = self.backend.get(MEDITATION_STATE_KEY)? else {
            return Ok(None);
        };
        let snapshot: TimerSnapshot = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(MEDITATION_STATE_KEY.to_string(), e.to_string()))?;

        if snapshot.active_deadline().is_none() {
            debug!("Ignoring stored snapshot without a running deadline");
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Loads the running snapshot, treating every failure as "none stored".
    ///
    /// Values that cannot be used are removed so the store never keeps a
    /// snapshot that breaks the invariant.
    pub fn load(&self) -> Option<TimerSnapshot> {
        match self.try_load() {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                if matches!(self.backend.get(MEDITATION_STATE_KEY), Ok(Some(_))) {
                    self.discard();
                }
                None
            }
            Err(e) => {
                warn!("Failed to load meditation state: {}", e);
                if e.is_corrupt() {
                    self.discard();
                }
                None
            }
        }
    }

    /// Writes the snapshot of a running countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn save(&self, snapshot: &TimerSnapshot) -> Result<(), StoreError> {
        if snapshot.active_deadline().is_none() {
            // Only running countdowns are stored
            return self.clear();
        }
        let encoded = serde_json::to_string(snapshot)
            .map_err(|e| StoreError::WriteError(MEDITATION_STATE_KEY.to_string(), e.to_string()))?;
        self.backend.set(MEDITATION_STATE_KEY, &encoded)
    }

    /// Removes the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(MEDITATION_STATE_KEY)
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            warn!("Failed to discard unusable meditation state: {}", e);
        }
    }
}

impl std::fmt::Debug for DeadlineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineStore")
            .field("key", &MEDITATION_STATE_KEY)
            .finish_non_exhaustive()
    }
}
