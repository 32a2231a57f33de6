//! Best-effort memory of the last selected duration.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::StoreError;
use super::KeyValueStore;
use crate::types::{parse_custom_duration, DEFAULT_DURATION_MINUTES, LAST_DURATION_KEY};

/// Remembers the last duration the user picked.
#[derive(Clone)]
pub struct DurationPreference {
    backend: Arc<dyn KeyValueStore>,
    default_minutes: u32,
}

impl DurationPreference {
    /// Creates a preference store falling back to the standard default.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_default(backend, DEFAULT_DURATION_MINUTES)
    }

    /// Creates a preference store with a custom fallback.
    pub fn with_default(backend: Arc<dyn KeyValueStore>, default_minutes: u32) -> Self {
        Self {
            backend,
            default_minutes: default_minutes.max(1),
        }
    }

    /// Returns the fallback duration.
    pub fn default_minutes(&self) -> u32 {
        self.default_minutes
    }

    /// Returns the stored duration, or the fallback if none is usable.
    pub fn load(&self) -> u32 {
        match self.backend.get(LAST_DURATION_KEY) {
            Ok(Some(raw)) => parse_custom_duration(&raw).unwrap_or_else(|| {
                debug!("Ignoring unusable stored duration {:?}", raw);
                self.default_minutes
            }),
            Ok(None) => self.default_minutes,
            Err(e) => {
                warn!("Failed to load duration preference: {}", e);
                self.default_minutes
            }
        }
    }

    /// Stores `minutes` as the preferred duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn save(&self, minutes: u32) -> Result<(), StoreError> {
        self.backend.set(LAST_DURATION_KEY, &minutes.to_string())
    }
}

impl std::fmt::Debug for DurationPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurationPreference")
            .field("default_minutes", &self.default_minutes)
            .finish_non_exhaustive()
    }
}
