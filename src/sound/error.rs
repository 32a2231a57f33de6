//! Audio cue error types.
//!
//! Audio is a notification, never a correctness dependency: every error
//! here is logged by the caller and the timer carries on.

use thiserror::Error;

/// Errors that can occur while preparing or playing the session cue.
#[derive(Debug, Error)]
pub enum SoundError {
    /// No audio output device could be opened.
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// The cue file could not be read.
    #[error("Cue file not found: {0}")]
    FileNotFound(String),

    /// The cue file has an extension no decoder handles.
    #[error("Unsupported cue format: {0}")]
    UnsupportedFormat(String),

    /// The cue could not be decoded.
    #[error("Failed to decode cue: {0}")]
    DecodeError(String),

    /// A playback sink could not be created.
    #[error("Failed to open audio stream: {0}")]
    StreamError(String),

    /// Playback failed after the cue was prepared.
    #[error("Cue playback failed: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to the output device.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the cue file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::UnsupportedFormat(_) | Self::DecodeError(_)
        )
    }

    /// Returns true if the synthesized gong should be used instead of the file.
    #[must_use]
    pub fn should_fall_back_to_tone(&self) -> bool {
        self.is_file_error()
    }
}
