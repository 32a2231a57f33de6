//! Audio cue playback for meditation sessions.
//!
//! The timer only needs two things from audio: put the cue back at its
//! start, and play it. That capability is the [`AudioCuePlayer`] trait.
//! Which backend provides it is decided once, by [`create_cue_player`]:
//!
//! ```text
//! ┌────────────────────┐
//! │  create_cue_player │
//! └─────────┬──────────┘
//!           │ sound disabled ──────────▶ SilentCuePlayer
//!           │ audio device available ──▶ RodioCuePlayer (file or gong)
//!           │ no audio device ─────────▶ TerminalBellCuePlayer
//!           ▼
//!   Arc<dyn AudioCuePlayer>
//! ```
//!
//! Playback failures never reach the timer: [`ring`] logs and swallows them.

mod bell;
mod error;
mod player;
mod source;
mod tone;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

pub use bell::TerminalBellCuePlayer;
pub use error::SoundError;
pub use player::RodioCuePlayer;
pub use source::{CueSource, DEFAULT_CUE_NAME};
pub use tone::{GongTone, GONG_DURATION, GONG_SAMPLE_RATE};

use crate::types::MeditationConfig;

/// The session cue capability.
pub trait AudioCuePlayer {
    /// Positions the cue at its beginning.
    fn rewind_to_start(&self) -> Result<(), SoundError>;

    /// Plays the cue from the current position without blocking.
    fn play(&self) -> Result<(), SoundError>;
}

impl AudioCuePlayer for RodioCuePlayer {
    fn rewind_to_start(&self) -> Result<(), SoundError> {
        RodioCuePlayer::rewind_to_start(self)
    }

    fn play(&self) -> Result<(), SoundError> {
        RodioCuePlayer::play(self)
    }
}

impl AudioCuePlayer for TerminalBellCuePlayer {
    fn rewind_to_start(&self) -> Result<(), SoundError> {
        TerminalBellCuePlayer::rewind_to_start(self)
    }

    fn play(&self) -> Result<(), SoundError> {
        TerminalBellCuePlayer::play(self)
    }
}

/// Rewinds and plays the cue, logging any failure.
///
/// Returns true if the cue started.
pub fn ring(player: &dyn AudioCuePlayer) -> bool {
    match player.rewind_to_start().and_then(|()| player.play()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Error playing cue: {}", e);
            false
        }
    }
}

/// Builds the cue player for this host.
#[must_use]
pub fn create_cue_player(config: &MeditationConfig) -> Arc<dyn AudioCuePlayer> {
    if !config.sound_enabled {
        debug!("Sound disabled, cue will be silent");
        return Arc::new(SilentCuePlayer);
    }

    let source = CueSource::from_path(config.sound_path.as_deref());
    match RodioCuePlayer::new(&source) {
        Ok(player) => {
            debug!("Using audio cue '{}'", player.cue_name());
            Arc::new(player)
        }
        Err(e) => {
            warn!("Audio not available, using terminal bell: {}", e);
            Arc::new(TerminalBellCuePlayer::new())
        }
    }
}

/// A cue player that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCuePlayer;

impl AudioCuePlayer for SilentCuePlayer {
    fn rewind_to_start(&self) -> Result<(), SoundError> {
        Ok(())
    }

    fn play(&self) -> Result<(), SoundError> {
        Ok(())
    }
}

/// A call recorded by [`MockCuePlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCall {
    Rewind,
    Play,
}

/// Mock cue player for testing.
#[derive(Debug, Default)]
pub struct MockCuePlayer {
    calls: Mutex<Vec<CueCall>>,
    should_fail_rewind: AtomicBool,
    should_fail_play: AtomicBool,
}

impl MockCuePlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail_rewind(&self, should_fail: bool) {
        self.should_fail_rewind.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_play(&self, should_fail: bool) {
        self.should_fail_play.store(should_fail, Ordering::SeqCst);
    }

    /// Returns how many times the cue was successfully played.
    #[must_use]
    pub fn play_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == CueCall::Play)
            .count()
    }

    #[must_use]
    pub fn get_calls(&self) -> Vec<CueCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl AudioCuePlayer for MockCuePlayer {
    fn rewind_to_start(&self) -> Result<(), SoundError> {
        if self.should_fail_rewind.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock rewind failure".to_string()));
        }
        self.calls.lock().unwrap().push(CueCall::Rewind);
        Ok(())
    }

    fn play(&self) -> Result<(), SoundError> {
        if self.should_fail_play.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock play failure".to_string()));
        }
        self.calls.lock().unwrap().push(CueCall::Play);
        Ok(())
    }
}
