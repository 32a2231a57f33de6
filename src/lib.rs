//! Meditation Timer Library
//!
//! This library provides the core functionality for the meditation timer:
//! - Timer engine deriving the countdown from a persisted wall-clock deadline
//! - Lifecycle reconciliation for backgrounding and cold starts
//! - Key-value persistence of the running countdown and the last duration
//! - Audio cue playback (rodio, terminal bell, or silent)
//! - CLI command parsing and display utilities

pub mod cli;
pub mod clock;
pub mod engine;
pub mod sound;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    CompletionSource, Countdown, HostState, LifecycleReconciler, LifecycleSignal,
    LifecycleSubscription, MeditationSession, Reconciliation, SessionCommand, TimerEngine,
    TimerError, TimerEvent,
};
pub use types::{MeditationConfig, TimerSnapshot, TimerState};

// Re-export store types
pub use store::{
    DeadlineStore, DurationPreference, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    StoreError,
};

// Re-export sound types
pub use sound::{
    create_cue_player, ring, AudioCuePlayer, CueSource, MockCuePlayer, RodioCuePlayer,
    SilentCuePlayer, SoundError, TerminalBellCuePlayer,
};
