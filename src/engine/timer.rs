//! Timer engine for meditation sessions.
//!
//! This module provides the countdown logic:
//! - Duration selection, start, pause and reset
//! - Remaining time derived from the wall-clock deadline on every observation
//! - Completion with the session cue, guarded so it fires once
//! - Event firing for hosts that render the countdown

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::sound::{ring, AudioCuePlayer};
use crate::store::{DeadlineStore, DurationPreference, KeyValueStore};
use crate::types::{seconds_until, MeditationConfig, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// What noticed that a countdown had finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// The foreground tick.
    Tick,
    /// Returning to the foreground.
    Foreground,
    /// Reading the stored snapshot at launch.
    ColdStart,
}

impl CompletionSource {
    /// Returns true if the countdown finished while nobody was watching.
    pub fn while_away(&self) -> bool {
        !matches!(self, CompletionSource::Tick)
    }
}

/// Timer events for rendering and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A new session length was chosen
    DurationSelected {
        /// Selected minutes
        minutes: u32,
    },
    /// Countdown started or resumed
    Started {
        /// Seconds left at start
        time_left: u32,
        /// Wall-clock end of the countdown
        deadline: DateTime<Utc>,
    },
    /// Countdown paused
    Paused {
        /// Seconds left when paused
        time_left: u32,
    },
    /// Countdown reset to the full duration
    Reset {
        /// Full duration in seconds
        time_left: u32,
    },
    /// A running countdown was adopted from the store at launch
    Restored {
        /// Seconds left
        time_left: u32,
        /// Wall-clock end of the countdown
        deadline: DateTime<Utc>,
    },
    /// Remaining time recomputed
    Tick {
        /// Seconds left
        time_left: u32,
    },
    /// Countdown reached zero
    Completed {
        /// What detected the completion
        source: CompletionSource,
    },
}

// ============================================================================
// TimerError
// ============================================================================

/// Rejected timer operations. None of them change any state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// `start` while the countdown is running
    #[error("Timer is already running")]
    AlreadyRunning,

    /// `pause` while the countdown is not running
    #[error("Timer is not running")]
    NotRunning,

    /// A duration of zero minutes
    #[error("Duration must be at least 1 minute, got {0}")]
    InvalidDuration(u32),
}

// ============================================================================
// Countdown
// ============================================================================

/// Result of deriving the countdown from the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No countdown is running.
    Idle,
    /// Still running with this many seconds left.
    Running {
        /// Seconds left, rounded up
        time_left: u32,
    },
    /// The deadline has passed; completion has fired.
    Finished,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the countdown state of one mounted timer.
pub struct TimerEngine {
    state: TimerState,
    deadlines: DeadlineStore,
    preference: DurationPreference,
    cue: Arc<dyn AudioCuePlayer>,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine.
    ///
    /// The selected duration comes from the stored preference. The stored
    /// snapshot is not read here; see [`TimerEngine::restore`].
    pub fn new(
        config: &MeditationConfig,
        backend: Arc<dyn KeyValueStore>,
        cue: Arc<dyn AudioCuePlayer>,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let preference = DurationPreference::with_default(backend.clone(), config.default_minutes);
        let selected_minutes = preference.load();

        Self {
            state: TimerState::new(selected_minutes),
            deadlines: DeadlineStore::new(backend),
            preference,
            cue,
            clock,
            event_tx,
        }
    }

    /// Selects a new session length.
    ///
    /// Cancels a running countdown without confirmation.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidDuration` for zero minutes.
    pub fn select_duration(&mut self, minutes: u32) -> Result<(), TimerError> {
        if minutes == 0 {
            return Err(TimerError::InvalidDuration(minutes));
        }

        self.state.selected_minutes = minutes;
        self.state.deactivate();
        self.state.time_left = self.state.full_duration_seconds();
        self.clear_snapshot();

        if let Err(e) = self.preference.save(minutes) {
            warn!("Error saving duration: {}", e);
        }

        debug!("Selected {} minute session", minutes);
        self.emit(TimerEvent::DurationSelected { minutes });
        Ok(())
    }

    /// Starts the countdown from the current `time_left`.
    ///
    /// The cue is played as a start signal. A finished countdown starts
    /// over from the selected duration.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` if the countdown is running.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.state.is_active {
            return Err(TimerError::AlreadyRunning);
        }

        if self.state.time_left == 0 {
            self.state.time_left = self.state.full_duration_seconds();
        }

        ring(self.cue.as_ref());

        let deadline = self.clock.now() + Duration::seconds(i64::from(self.state.time_left));
        self.state.is_active = true;
        self.state.deadline = Some(deadline);
        self.save_snapshot();

        info!(
            "Meditation started: {}s left, ends at {}",
            self.state.time_left, deadline
        );
        self.emit(TimerEvent::Started {
            time_left: self.state.time_left,
            deadline,
        });
        Ok(())
    }

    /// Pauses the countdown, keeping the last computed `time_left`.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotRunning` if the countdown is not running.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        if !self.state.is_active {
            return Err(TimerError::NotRunning);
        }

        self.state.deactivate();
        self.clear_snapshot();

        info!("Meditation paused: {}s left", self.state.time_left);
        self.emit(TimerEvent::Paused {
            time_left: self.state.time_left,
        });
        Ok(())
    }

    /// Starts when idle, pauses when running.
    pub fn toggle(&mut self) -> Result<(), TimerError> {
        if self.state.is_active {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Stops the countdown and shows the full selected duration again.
    pub fn reset(&mut self) {
        self.state.deactivate();
        self.state.time_left = self.state.full_duration_seconds();
        self.clear_snapshot();

        debug!("Meditation reset");
        self.emit(TimerEvent::Reset {
            time_left: self.state.time_left,
        });
    }

    /// Recomputes the countdown for the foreground tick.
    pub fn tick(&mut self) -> Countdown {
        let countdown = self.derive(CompletionSource::Tick);
        if let Countdown::Running { time_left } = countdown {
            self.emit(TimerEvent::Tick { time_left });
        }
        countdown
    }

    /// Recomputes the countdown after returning to the foreground.
    pub fn resume_foreground(&mut self) -> Countdown {
        let countdown = self.derive(CompletionSource::Foreground);
        if let Countdown::Running { time_left } = countdown {
            debug!("Back in foreground with {}s left", time_left);
            self.emit(TimerEvent::Tick { time_left });
        }
        countdown
    }

    /// Writes the running countdown before the host is backgrounded.
    ///
    /// Does nothing while idle.
    pub fn persist_for_background(&mut self) {
        if self.state.is_active {
            self.save_snapshot();
            debug!("Saved meditation state for background");
        }
    }

    /// Adopts a running countdown from the store at launch.
    ///
    /// A deadline still in the future resumes the countdown; a deadline
    /// that passed while the process was gone fires completion once.
    pub fn restore(&mut self) -> Countdown {
        if self.state.is_active {
            return self.derive(CompletionSource::ColdStart);
        }

        let Some(snapshot) = self.deadlines.load() else {
            return Countdown::Idle;
        };
        let Some(deadline) = snapshot.active_deadline() else {
            return Countdown::Idle;
        };

        self.state.is_active = true;
        self.state.deadline = Some(deadline);
        self.state.time_left = snapshot.remaining_seconds();

        let countdown = self.derive(CompletionSource::ColdStart);
        match countdown {
            Countdown::Running { time_left } => {
                info!("Restored meditation: {}s left", time_left);
                self.emit(TimerEvent::Restored {
                    time_left,
                    deadline,
                });
            }
            Countdown::Finished => info!("Meditation finished while the app was closed"),
            Countdown::Idle => {}
        }
        countdown
    }

    /// Finishes the countdown: clears the store and plays the cue.
    ///
    /// Returns false without doing anything if no countdown is running.
    pub fn complete(&mut self, source: CompletionSource) -> bool {
        if !self.state.is_active {
            return false;
        }

        self.state.deactivate();
        self.state.time_left = 0;
        self.clear_snapshot();
        ring(self.cue.as_ref());

        info!("Meditation complete ({:?})", source);
        self.emit(TimerEvent::Completed { source });
        true
    }

    /// Returns a reference to the current timer state.
    pub fn get_state(&self) -> &TimerState {
        &self.state
    }

    /// Returns true if the countdown is running.
    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Returns the seconds shown to the user.
    pub fn time_left(&self) -> u32 {
        self.state.time_left
    }

    /// Returns the selected duration in minutes.
    pub fn selected_minutes(&self) -> u32 {
        self.state.selected_minutes
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub fn get_state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }

    /// The single derivation rule shared by ticks and reconciliation.
    fn derive(&mut self, source: CompletionSource) -> Countdown {
        let (true, Some(deadline)) = (self.state.is_active, self.state.deadline) else {
            return Countdown::Idle;
        };

        match seconds_until(deadline, self.clock.now()) {
            Some(time_left) => {
                self.state.time_left = time_left;
                Countdown::Running { time_left }
            }
            None => {
                self.complete(source);
                Countdown::Finished
            }
        }
    }

    fn save_snapshot(&self) {
        if let Some(snapshot) = self.state.snapshot() {
            if let Err(e) = self.deadlines.save(&snapshot) {
                warn!("Error saving meditation state: {}", e);
            }
        }
    }

    fn clear_snapshot(&self) {
        if let Err(e) = self.deadlines.clear() {
            warn!("Error clearing meditation state: {}", e);
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event receiver dropped");
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
