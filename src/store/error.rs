//! Persistence error types.
//!
//! None of these errors reach the user: the timer treats every failure as
//! "nothing stored" and carries on with a fresh state.

use thiserror::Error;

/// Errors that can occur in the key-value persistence layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key cannot be mapped onto the storage medium.
    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    /// Reading a stored value failed.
    #[error("Failed to read '{0}': {1}")]
    ReadError(String, String),

    /// Writing a value failed.
    #[error("Failed to write '{0}': {1}")]
    WriteError(String, String),

    /// Removing a value failed.
    #[error("Failed to remove '{0}': {1}")]
    RemoveError(String, String),

    /// A stored value could not be decoded.
    #[error("Stored value for '{0}' is corrupt: {1}")]
    Corrupt(String, String),

    /// The storage medium is not reachable at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if this error came from the storage medium itself.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::ReadError(_, _)
                | Self::WriteError(_, _)
                | Self::RemoveError(_, _)
                | Self::Unavailable(_)
        )
    }

    /// Returns true if a stored value exists but cannot be decoded.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_, _))
    }

    /// Returns the key involved, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidKey(key)
            | Self::ReadError(key, _)
            | Self::WriteError(key, _)
            | Self::RemoveError(key, _)
            | Self::Corrupt(key, _) => Some(key),
            Self::Unavailable(_) => None,
        }
    }
}
