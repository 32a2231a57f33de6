//! Core data types for the meditation timer.
//!
//! This module defines the data structures used for:
//! - Timer configuration with validation
//! - The persisted timer snapshot and its wire shape
//! - In-memory countdown state
//! - The deadline derivation rule shared by ticks and reconciliation

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Preset session lengths offered to the user, in minutes.
pub const DURATION_PRESETS: &[u32] = &[5, 10, 15, 20, 30, 60];

/// Session length used when no preference has been stored.
pub const DEFAULT_DURATION_MINUTES: u32 = 5;

/// Store key holding the serialized [`TimerSnapshot`].
pub const MEDITATION_STATE_KEY: &str = "meditationState";

/// Store key holding the last selected duration.
pub const LAST_DURATION_KEY: &str = "lastMeditationDuration";

/// Directory name under the home directory used when no data dir is given.
const DEFAULT_DATA_DIR_NAME: &str = ".meditation";

// ============================================================================
// MeditationConfig
// ============================================================================

fn default_duration_minutes() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_sound_enabled() -> bool {
    true
}

/// Configuration for a meditation timer host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationConfig {
    /// Duration in minutes used when no preference is stored
    #[serde(default = "default_duration_minutes")]
    pub default_minutes: u32,
    /// Period of the foreground countdown tick in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Whether the session cue is audible
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    /// Audio file used for the cue instead of the synthesized gong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_path: Option<PathBuf>,
    /// Directory holding the persisted state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for MeditationConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_duration_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
            sound_enabled: default_sound_enabled(),
            sound_path: None,
            data_dir: None,
        }
    }
}

impl MeditationConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Sets the default duration in minutes.
    pub fn with_default_minutes(mut self, minutes: u32) -> Self {
        self.default_minutes = minutes;
        self
    }

    /// Enables or disables the audible cue.
    pub fn with_sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    /// Sets the audio file used for the cue.
    pub fn with_sound_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sound_path = Some(path.into());
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_minutes < 1 {
            return Err("Default duration must be at least 1 minute".to_string());
        }
        if !(100..=60_000).contains(&self.tick_interval_ms) {
            return Err("Tick interval must be between 100 and 60000 milliseconds".to_string());
        }
        Ok(())
    }

    /// Returns the tick period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Returns the data directory, falling back to `~/.meditation`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME))
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// The persisted record of a running countdown.
///
/// Only running countdowns are ever written, so `active` is true exactly
/// when `deadline` is present. Values read back that break this rule are
/// treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    #[serde(rename = "isActive")]
    active: bool,
    /// Last rendered remaining seconds, display fallback only.
    #[serde(rename = "timeLeft")]
    remaining_seconds: u32,
    #[serde(
        rename = "endTime",
        default,
        with = "chrono::serde::ts_milliseconds_option"
    )]
    deadline: Option<DateTime<Utc>>,
}

impl TimerSnapshot {
    /// Creates a snapshot of a running countdown.
    pub fn running(remaining_seconds: u32, deadline: DateTime<Utc>) -> Self {
        Self {
            active: true,
            remaining_seconds,
            deadline: Some(deadline),
        }
    }

    /// Returns true if the countdown was running when persisted.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the last known remaining seconds.
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns true if `active` and `deadline` agree.
    pub fn is_consistent(&self) -> bool {
        self.active == self.deadline.is_some()
    }

    /// Returns the deadline of a consistent, running snapshot.
    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        if self.active && self.is_consistent() {
            self.deadline
        } else {
            None
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// In-memory countdown state of one mounted timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    /// Configured session length in minutes
    pub selected_minutes: u32,
    /// Whether the countdown is running
    pub is_active: bool,
    /// Seconds shown to the user
    pub time_left: u32,
    /// Wall-clock end of the running countdown
    pub deadline: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Creates an idle state showing the full selected duration.
    pub fn new(selected_minutes: u32) -> Self {
        Self {
            selected_minutes,
            is_active: false,
            time_left: minutes_to_seconds(selected_minutes),
            deadline: None,
        }
    }

    /// Returns the full length of the selected duration in seconds.
    pub fn full_duration_seconds(&self) -> u32 {
        minutes_to_seconds(self.selected_minutes)
    }

    /// Stops the countdown, keeping `time_left`.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.deadline = None;
    }

    /// Returns the snapshot to persist, present only while running.
    pub fn snapshot(&self) -> Option<TimerSnapshot> {
        match (self.is_active, self.deadline) {
            (true, Some(deadline)) => Some(TimerSnapshot::running(self.time_left, deadline)),
            _ => None,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Converts whole minutes into seconds.
pub fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes.saturating_mul(60)
}

/// Whole seconds left until `deadline`, rounded up.
///
/// Returns `None` once `now` has reached the deadline.
pub fn seconds_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Option<u32> {
    let millis = (deadline - now).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    let seconds = (millis + 999) / 1000;
    Some(u32::try_from(seconds).unwrap_or(u32::MAX))
}

/// Parses a custom duration typed by the user.
///
/// Non-numeric and non-positive input yields `None`.
pub fn parse_custom_duration(input: &str) -> Option<u32> {
    match input.trim().parse::<u32>() {
        Ok(minutes) if minutes > 0 => Some(minutes),
        _ => None,
    }
}

/// Returns true if `minutes` is one of the presets.
pub fn is_preset(minutes: u32) -> bool {
    DURATION_PRESETS.contains(&minutes)
}

// ============================================================================
// Tests
// ============================================================================
