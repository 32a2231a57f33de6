//! Meditation timer engine.
//!
//! - [`timer`]: the countdown and its operations
//! - [`lifecycle`]: foreground/background reconciliation
//! - [`session`]: the event loop of a mounted timer screen

pub mod lifecycle;
pub mod session;
pub mod timer;

pub use lifecycle::{
    HostState, LifecycleReconciler, LifecycleSignal, LifecycleSubscription, Reconciliation,
};
pub use session::{MeditationSession, SessionCommand};
pub use timer::{CompletionSource, Countdown, TimerEngine, TimerError, TimerEvent};
