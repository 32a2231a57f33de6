//! The mounted meditation screen.
//!
//! A session owns one engine and drives it from three sources: the
//! foreground ticker, host lifecycle transitions and user commands.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::lifecycle::{HostState, LifecycleReconciler, LifecycleSignal};
use super::timer::{Countdown, TimerEngine};

/// User input accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    SelectDuration(u32),
    Start,
    Pause,
    Toggle,
    Reset,
}

/// One mounted timer screen.
#[derive(Debug)]
pub struct MeditationSession {
    engine: TimerEngine,
    reconciler: LifecycleReconciler,
    tick_interval: Duration,
}

impl MeditationSession {
    pub fn new(engine: TimerEngine, tick_interval: Duration) -> Self {
        Self {
            engine,
            reconciler: LifecycleReconciler::new(),
            tick_interval,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    /// Runs the session until `shutdown` resolves or the command channel
    /// closes, and hands the engine back.
    ///
    /// Leaving the session keeps a running countdown in the store so the
    /// next launch picks it up.
    pub async fn run<F>(
        mut self,
        signal: &LifecycleSignal,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        shutdown: F,
    ) -> TimerEngine
    where
        F: Future<Output = ()>,
    {
        let mut lifecycle = signal.subscribe();
        let mut lifecycle_open = true;

        match self.reconciler.cold_start(&mut self.engine) {
            Countdown::Running { time_left } => info!("Resuming meditation, {}s left", time_left),
            Countdown::Finished => info!("Previous meditation finished while away"),
            Countdown::Idle => debug!("No meditation in progress"),
        }

        let mut ticker = new_ticker(self.tick_interval);
        tokio::pin!(shutdown);

        loop {
            let was_ticking = self.is_ticking();

            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick(), if was_ticking => {
                    self.engine.tick();
                }
                transition = lifecycle.recv(), if lifecycle_open => match transition {
                    Some(next) => {
                        self.reconciler.on_transition(&mut self.engine, next);
                    }
                    None => {
                        debug!("Lifecycle signal closed");
                        lifecycle_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }

            // First tick lands one full period after the countdown (re)starts
            if !was_ticking && self.is_ticking() {
                ticker.reset();
            }
        }

        self.engine.persist_for_background();
        info!("Leaving meditation session");
        self.engine
    }

    fn is_ticking(&self) -> bool {
        self.engine.is_active() && self.reconciler.current() == HostState::Foreground
    }

    fn apply(&mut self, command: SessionCommand) {
        let result = match command {
            SessionCommand::SelectDuration(minutes) => self.engine.select_duration(minutes),
            SessionCommand::Start => self.engine.start(),
            SessionCommand::Pause => self.engine.pause(),
            SessionCommand::Toggle => self.engine.toggle(),
            SessionCommand::Reset => {
                self.engine.reset();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Ignored {:?}: {}", command, e);
        }
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    use crate::clock::ManualClock;
    use crate::engine::{CompletionSource, TimerEvent};
    use crate::sound::MockCuePlayer;
    use crate::store::{KeyValueStore, MemoryKeyValueStore};
    use crate::types::{MeditationConfig, MEDITATION_STATE_KEY};

    struct Fixture {
        session: MeditationSession,
        events: mpsc::UnboundedReceiver<TimerEvent>,
        store: Arc<MemoryKeyValueStore>,
        cue: Arc<MockCuePlayer>,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryKeyValueStore::new()))
    }

    fn fixture_with(store: Arc<MemoryKeyValueStore>) -> Fixture {
        let clock = ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let cue = Arc::new(MockCuePlayer::new());
        let (tx, events) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(
            &MeditationConfig::default(),
            store.clone(),
            cue.clone(),
            Arc::new(clock.clone()),
            tx,
        );
        Fixture {
            session: MeditationSession::new(engine, Duration::from_secs(1)),
            events,
            store,
            cue,
            clock,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn completions(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Completed { .. }))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_ticks_count_down_and_complete() {
        let Fixture {
            session,
            mut events,
            store,
            cue,
            clock,
        } = fixture();
        let signal = LifecycleSignal::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let driver = async {
            cmd_tx.send(SessionCommand::Start).unwrap();
            sleep(Duration::from_millis(10)).await;

            clock.advance_secs(299);
            sleep(Duration::from_secs(1)).await;
            let seen = drain(&mut events);
            assert!(seen.contains(&TimerEvent::Tick { time_left: 1 }));

            clock.advance_secs(2);
            sleep(Duration::from_secs(1)).await;
            let seen = drain(&mut events);
            assert_eq!(completions(&seen), 1);
            assert!(seen.contains(&TimerEvent::Completed {
                source: CompletionSource::Tick
            }));

            stop_tx.send(()).unwrap();
        };

        let (engine, ()) = tokio::join!(
            session.run(&signal, cmd_rx, async {
                let _ = stop_rx.await;
            }),
            driver
        );

        assert!(!engine.is_active());
        assert_eq!(engine.time_left(), 0);
        assert!(!store.contains(MEDITATION_STATE_KEY));
        // Start cue plus completion cue
        assert_eq!(cue.play_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_in_background() {
        let Fixture {
            session,
            mut events,
            cue,
            clock,
            ..
        } = fixture();
        let signal = LifecycleSignal::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let driver = async {
            cmd_tx.send(SessionCommand::Start).unwrap();
            sleep(Duration::from_millis(10)).await;
            drain(&mut events);

            signal.emit(HostState::Background);
            sleep(Duration::from_millis(10)).await;
            clock.advance_secs(640);
            sleep(Duration::from_secs(5)).await;
            assert!(drain(&mut events).is_empty());

            signal.emit(HostState::Foreground);
            sleep(Duration::from_millis(10)).await;
            assert_eq!(
                drain(&mut events),
                vec![TimerEvent::Completed {
                    source: CompletionSource::Foreground
                }]
            );

            stop_tx.send(()).unwrap();
        };

        let (engine, ()) = tokio::join!(
            session.run(&signal, cmd_rx, async {
                let _ = stop_rx.await;
            }),
            driver
        );

        assert!(!engine.is_active());
        assert_eq!(cue.play_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_resumes_stored_countdown() {
        let store = Arc::new(MemoryKeyValueStore::new());
        // Deadline 90s after the fixture clock
        store
            .set(
                MEDITATION_STATE_KEY,
                r#"{"isActive":true,"timeLeft":600,"endTime":1700000090000}"#,
            )
            .unwrap();
        let Fixture {
            session,
            mut events,
            cue,
            ..
        } = fixture_with(store);
        let signal = LifecycleSignal::new();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let engine = session
            .run(&signal, cmd_rx, sleep(Duration::from_millis(10)))
            .await;

        assert!(engine.is_active());
        assert_eq!(engine.time_left(), 90);
        assert_eq!(cue.play_count(), 0);
        assert!(matches!(
            drain(&mut events).first(),
            Some(TimerEvent::Restored { time_left: 90, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_completes_elapsed_countdown() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .set(
                MEDITATION_STATE_KEY,
                r#"{"isActive":true,"timeLeft":300,"endTime":1699999000000}"#,
            )
            .unwrap();
        let Fixture {
            session,
            mut events,
            store,
            cue,
            ..
        } = fixture_with(store);
        let signal = LifecycleSignal::new();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let engine = session
            .run(&signal, cmd_rx, sleep(Duration::from_millis(10)))
            .await;

        assert!(!engine.is_active());
        assert_eq!(engine.time_left(), 0);
        assert!(!store.contains(MEDITATION_STATE_KEY));
        assert_eq!(cue.play_count(), 1);
        assert_eq!(
            drain(&mut events),
            vec![TimerEvent::Completed {
                source: CompletionSource::ColdStart
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_drive_engine() {
        let Fixture { session, store, .. } = fixture();
        let signal = LifecycleSignal::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        cmd_tx.send(SessionCommand::SelectDuration(10)).unwrap();
        cmd_tx.send(SessionCommand::Toggle).unwrap();
        cmd_tx.send(SessionCommand::Start).unwrap();
        cmd_tx.send(SessionCommand::Pause).unwrap();
        cmd_tx.send(SessionCommand::Reset).unwrap();
        drop(cmd_tx);

        let engine = session
            .run(&signal, cmd_rx, std::future::pending::<()>())
            .await;

        assert!(!engine.is_active());
        assert_eq!(engine.selected_minutes(), 10);
        assert_eq!(engine.time_left(), 600);
        assert!(!store.contains(MEDITATION_STATE_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_keeps_running_countdown_stored() {
        let Fixture { session, store, .. } = fixture();
        let signal = LifecycleSignal::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        cmd_tx.send(SessionCommand::Start).unwrap();
        drop(cmd_tx);

        let engine = session
            .run(&signal, cmd_rx, std::future::pending::<()>())
            .await;

        assert!(engine.is_active());
        assert!(store.contains(MEDITATION_STATE_KEY));
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_without_lifecycle_transitions() {
        let Fixture { session, .. } = fixture();
        let signal = LifecycleSignal::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let run = session.run(&signal, cmd_rx, std::future::pending::<()>());
        let driver = async {
            sleep(Duration::from_millis(10)).await;
            cmd_tx.send(SessionCommand::Start).unwrap();
            sleep(Duration::from_millis(10)).await;
            drop(cmd_tx);
        };

        let (engine, ()) = tokio::join!(run, driver);
        assert!(engine.is_active());
    }
}
