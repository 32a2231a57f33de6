//! Host lifecycle handling.
//!
//! While the host is in the background no ticks are delivered, so the
//! countdown is written out on the way down and re-derived from the
//! deadline on the way back up.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::timer::{Countdown, TimerEngine};

/// Buffered transitions per subscriber.
const SIGNAL_CAPACITY: usize = 16;

/// Whether the host is visible and able to deliver ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Foreground,
    Background,
}

/// What a lifecycle transition did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Same state as before; nothing happened.
    Unchanged,
    /// Moved to the background; a running countdown was saved.
    Backgrounded,
    /// Back in the foreground with the re-derived countdown.
    Foregrounded(Countdown),
}

/// Applies host lifecycle transitions to a timer engine.
#[derive(Debug, Clone)]
pub struct LifecycleReconciler {
    current: HostState,
}

impl LifecycleReconciler {
    /// Creates a reconciler for a host that mounts in the foreground.
    pub fn new() -> Self {
        Self {
            current: HostState::Foreground,
        }
    }

    pub fn current(&self) -> HostState {
        self.current
    }

    pub fn is_foreground(&self) -> bool {
        self.current == HostState::Foreground
    }

    /// Adopts whatever the previous process left in the store.
    pub fn cold_start(&mut self, engine: &mut TimerEngine) -> Countdown {
        engine.restore()
    }

    /// Handles a transition reported by the host.
    pub fn on_transition(&mut self, engine: &mut TimerEngine, next: HostState) -> Reconciliation {
        if next == self.current {
            debug!("Ignoring repeated {:?} transition", next);
            return Reconciliation::Unchanged;
        }
        self.current = next;

        match next {
            HostState::Background => {
                engine.persist_for_background();
                Reconciliation::Backgrounded
            }
            HostState::Foreground => Reconciliation::Foregrounded(engine.resume_foreground()),
        }
    }
}

impl Default for LifecycleReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcasts host lifecycle transitions to any number of subscribers.
#[derive(Debug, Clone)]
pub struct LifecycleSignal {
    tx: broadcast::Sender<HostState>,
}

impl LifecycleSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    /// Reports a transition. Returns the number of subscribers reached.
    pub fn emit(&self, state: HostState) -> usize {
        self.tx.send(state).unwrap_or(0)
    }

    /// Subscribes to transitions. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> LifecycleSubscription {
        LifecycleSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LifecycleSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to a [`LifecycleSignal`].
#[derive(Debug)]
pub struct LifecycleSubscription {
    rx: broadcast::Receiver<HostState>,
}

impl LifecycleSubscription {
    /// Waits for the next transition.
    ///
    /// Returns `None` once every signal handle has been dropped.
    pub async fn recv(&mut self) -> Option<HostState> {
        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {} lifecycle transitions", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
