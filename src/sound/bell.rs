//! Terminal bell cue, for hosts without an audio device.

use std::io::{self, Write};
use std::sync::Mutex;

use super::error::SoundError;

const BELL: &[u8] = b"\x07";

/// Rings the terminal bell as the session cue.
pub struct TerminalBellCuePlayer {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalBellCuePlayer {
    /// Creates a bell that rings on stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    /// Creates a bell that writes to `out`.
    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// A bell has no position; rewinding always succeeds.
    pub fn rewind_to_start(&self) -> Result<(), SoundError> {
        Ok(())
    }

    /// Writes the bell character.
    pub fn play(&self) -> Result<(), SoundError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| SoundError::PlaybackError("bell writer lock poisoned".to_string()))?;
        out.write_all(BELL)
            .and_then(|()| out.flush())
            .map_err(|e| SoundError::PlaybackError(e.to_string()))
    }
}

impl Default for TerminalBellCuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerminalBellCuePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalBellCuePlayer").finish_non_exhaustive()
    }
}
