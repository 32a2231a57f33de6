//! Scenario tests for the meditation timer.
//!
//! These tests drive the engine and the lifecycle reconciler through
//! whole sessions with a manual clock, an in-memory store and a mock cue:
//! - Deadline derivation across skipped ticks
//! - Completion firing exactly once
//! - Snapshot consistency after every operation
//! - Backgrounding, foregrounding and cold starts

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::mpsc;

use meditation_timer::store::{
    DeadlineStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
};
use meditation_timer::types::{MeditationConfig, TimerSnapshot, MEDITATION_STATE_KEY};
use meditation_timer::{
    Clock, CompletionSource, Countdown, HostState, LifecycleReconciler, ManualClock, MockCuePlayer,
    Reconciliation, TimerEngine, TimerEvent,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

struct Rig {
    engine: TimerEngine,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    backend: Arc<dyn KeyValueStore>,
    cue: Arc<MockCuePlayer>,
    clock: ManualClock,
}

impl Rig {
    fn new() -> Self {
        Self::with_backend(Arc::new(MemoryKeyValueStore::new()), ManualClock::new(t0()))
    }

    fn with_backend(backend: Arc<dyn KeyValueStore>, clock: ManualClock) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let cue = Arc::new(MockCuePlayer::new());
        let engine = TimerEngine::new(
            &MeditationConfig::default(),
            backend.clone(),
            cue.clone(),
            Arc::new(clock.clone()),
            tx,
        );
        Self {
            engine,
            events,
            backend,
            cue,
            clock,
        }
    }

    /// A new process over the same store and clock.
    fn relaunch(&self) -> Self {
        Self::with_backend(self.backend.clone(), self.clock.clone())
    }

    fn stored(&self) -> Option<TimerSnapshot> {
        DeadlineStore::new(self.backend.clone()).load()
    }

    fn completions(&mut self) -> Vec<CompletionSource> {
        let mut sources = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let TimerEvent::Completed { source } = event {
                sources.push(source);
            }
        }
        sources
    }

    /// Checks that the persisted snapshot mirrors the engine.
    fn assert_consistent(&self) {
        let raw = self.backend.get(MEDITATION_STATE_KEY).unwrap();
        match raw {
            Some(raw) => {
                let snapshot: TimerSnapshot = serde_json::from_str(&raw).unwrap();
                assert!(snapshot.is_consistent());
                assert!(snapshot.is_active());
                assert!(self.engine.is_active());
                assert_eq!(snapshot.deadline(), self.engine.get_state().deadline);
            }
            None => assert!(!self.engine.is_active()),
        }
    }
}

// ============================================================================
// Derivation
// ============================================================================

#[test]
fn test_derivation_matches_ceiling_for_any_gap() {
    let mut rig = Rig::new();
    rig.engine.select_duration(10).unwrap();
    rig.engine.start().unwrap();
    let deadline = t0() + Duration::seconds(600);

    let gaps_ms = [1, 999, 1_000, 1_001, 59_500, 123_456, 599_001, 599_999];
    for elapsed_ms in gaps_ms {
        rig.clock.set(t0() + Duration::milliseconds(elapsed_ms));
        let remaining_ms = (deadline - rig.clock.now()).num_milliseconds();
        let expected = u32::try_from((remaining_ms + 999) / 1000).unwrap();

        assert_eq!(
            rig.engine.tick(),
            Countdown::Running {
                time_left: expected
            },
            "after {}ms",
            elapsed_ms
        );
    }
}

#[test]
fn test_reconciliation_uses_the_same_rule_as_ticks() {
    let mut ticked = Rig::new();
    let mut reconciled = Rig::new();
    let mut reconciler = LifecycleReconciler::new();
    ticked.engine.start().unwrap();
    reconciled.engine.start().unwrap();
    reconciler.on_transition(&mut reconciled.engine, HostState::Background);

    for rig in [&ticked, &reconciled] {
        rig.clock.advance(Duration::milliseconds(187_250));
    }

    let by_tick = ticked.engine.tick();
    let by_reconcile = reconciler.on_transition(&mut reconciled.engine, HostState::Foreground);
    assert_eq!(by_reconcile, Reconciliation::Foregrounded(by_tick));
    assert_eq!(by_tick, Countdown::Running { time_left: 113 });
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn test_completion_is_idempotent() {
    let mut rig = Rig::new();
    rig.engine.start().unwrap();
    rig.clock.advance_secs(300);
    assert_eq!(rig.engine.tick(), Countdown::Finished);
    rig.cue.clear_calls();
    let state = rig.engine.get_state().clone();

    assert!(!rig.engine.complete(CompletionSource::Tick));
    assert!(!rig.engine.complete(CompletionSource::Foreground));
    rig.engine.tick();
    rig.engine.resume_foreground();

    assert_eq!(rig.engine.get_state(), &state);
    assert_eq!(rig.cue.play_count(), 0);
    assert_eq!(rig.completions(), vec![CompletionSource::Tick]);
}

// ============================================================================
// Invariant
// ============================================================================

#[test]
fn test_snapshot_consistent_after_every_operation() {
    let mut rig = Rig::new();
    let mut reconciler = LifecycleReconciler::new();
    rig.assert_consistent();

    rig.engine.select_duration(15).unwrap();
    rig.assert_consistent();
    rig.engine.start().unwrap();
    rig.assert_consistent();
    rig.clock.advance_secs(20);
    rig.engine.tick();
    rig.assert_consistent();
    reconciler.on_transition(&mut rig.engine, HostState::Background);
    rig.assert_consistent();
    reconciler.on_transition(&mut rig.engine, HostState::Foreground);
    rig.assert_consistent();
    rig.engine.pause().unwrap();
    rig.assert_consistent();
    rig.engine.toggle().unwrap();
    rig.assert_consistent();
    rig.engine.reset();
    rig.assert_consistent();
    rig.engine.start().unwrap();
    rig.engine.select_duration(5).unwrap();
    rig.assert_consistent();
    rig.engine.start().unwrap();
    rig.clock.advance_secs(301);
    rig.engine.tick();
    rig.assert_consistent();

    // Rejected operations leave everything in place
    assert!(rig.engine.pause().is_err());
    assert!(rig.engine.select_duration(0).is_err());
    rig.assert_consistent();
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_persist_then_reconcile_round_trip() {
    let mut rig = Rig::new();
    rig.engine.select_duration(20).unwrap();
    rig.engine.start().unwrap();
    rig.clock.advance(Duration::milliseconds(421_300));
    rig.engine.tick();
    let before = rig.engine.time_left();

    rig.engine.persist_for_background();
    rig.clock.advance(Duration::milliseconds(200));

    let mut relaunched = rig.relaunch();
    match relaunched.engine.restore() {
        Countdown::Running { time_left } => assert!(before.abs_diff(time_left) <= 1),
        other => panic!("Expected a running countdown, got {:?}", other),
    }
}

// ============================================================================
// Cold start
// ============================================================================

#[test]
fn test_cold_start_with_deadline_ten_minutes_ago() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let deadline = t0() - Duration::minutes(10);
    DeadlineStore::new(backend.clone())
        .save(&TimerSnapshot::running(120, deadline))
        .unwrap();

    let mut rig = Rig::with_backend(backend, ManualClock::new(t0()));
    let mut reconciler = LifecycleReconciler::new();

    assert_eq!(reconciler.cold_start(&mut rig.engine), Countdown::Finished);
    assert!(rig.stored().is_none());
    assert!(!rig.engine.is_active());
    assert_eq!(rig.engine.time_left(), 0);
    assert_eq!(rig.cue.play_count(), 1);
    assert_eq!(rig.completions(), vec![CompletionSource::ColdStart]);
}

#[test]
fn test_cold_start_with_future_deadline_adopts_it() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let deadline = t0() + Duration::seconds(75);
    DeadlineStore::new(backend.clone())
        .save(&TimerSnapshot::running(600, deadline))
        .unwrap();

    let mut rig = Rig::with_backend(backend, ManualClock::new(t0()));
    assert_eq!(
        LifecycleReconciler::new().cold_start(&mut rig.engine),
        Countdown::Running { time_left: 75 }
    );
    assert_eq!(rig.engine.get_state().deadline, Some(deadline));
    assert_eq!(rig.cue.play_count(), 0);
}

#[test]
fn test_cold_start_survives_process_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(t0());

    let mut first = Rig::with_backend(Arc::new(FileKeyValueStore::new(dir.path())), clock.clone());
    first.engine.start().unwrap();
    drop(first);

    clock.advance_secs(90);
    let mut second = Rig::with_backend(Arc::new(FileKeyValueStore::new(dir.path())), clock);
    assert_eq!(
        second.engine.restore(),
        Countdown::Running { time_left: 210 }
    );
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_five_minute_session_in_foreground() {
    let mut rig = Rig::new();
    rig.engine.select_duration(5).unwrap();
    rig.engine.start().unwrap();
    assert_eq!(
        rig.stored().and_then(|s| s.deadline()),
        Some(t0() + Duration::seconds(300))
    );

    for _ in 0..299 {
        rig.clock.advance_secs(1);
        rig.engine.tick();
    }
    assert_eq!(rig.engine.time_left(), 1);

    rig.clock.advance_secs(2);
    rig.engine.tick();
    assert!(!rig.engine.is_active());
    assert!(rig.stored().is_none());
    assert_eq!(rig.completions(), vec![CompletionSource::Tick]);
}

#[test]
fn test_background_past_deadline_plays_cue_once() {
    let mut rig = Rig::new();
    let mut reconciler = LifecycleReconciler::new();
    rig.engine.select_duration(10).unwrap();
    rig.engine.start().unwrap();
    rig.cue.clear_calls();

    // Foreground ticks for the first minute
    for _ in 0..60 {
        rig.clock.advance_secs(1);
        rig.engine.tick();
    }
    reconciler.on_transition(&mut rig.engine, HostState::Background);

    rig.clock.set(t0() + Duration::seconds(700));
    let result = reconciler.on_transition(&mut rig.engine, HostState::Foreground);

    assert_eq!(result, Reconciliation::Foregrounded(Countdown::Finished));
    assert_eq!(rig.engine.time_left(), 0);
    assert!(!rig.engine.is_active());
    assert_eq!(rig.cue.play_count(), 1);
    assert_eq!(rig.completions(), vec![CompletionSource::Foreground]);

    rig.engine.tick();
    assert_eq!(rig.cue.play_count(), 1);
}

#[test]
fn test_pause_then_start_resumes_from_paused_time() {
    let mut rig = Rig::new();
    rig.engine.select_duration(10).unwrap();
    rig.engine.start().unwrap();
    rig.clock.advance_secs(250);
    rig.engine.tick();
    rig.engine.pause().unwrap();
    assert_eq!(rig.engine.time_left(), 350);

    rig.clock.advance_secs(3_600);
    rig.engine.start().unwrap();

    assert_eq!(rig.engine.time_left(), 350);
    assert_eq!(
        rig.engine.get_state().deadline,
        Some(t0() + Duration::seconds(250 + 3_600 + 350))
    );
}
