// =====
// TESTS: 17
// =====
//
// Timer-driven flows: watchdog backstop, readiness gate, resize handling,
// idle resume, auto-restart, clone removal and persistence across reloads.

use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::scroll::prefs::AUTO_SCROLL_PREF_KEY;
use guide_autoscroll::scroll::{
    AutoScrollEngine, DriftPhase, EngineEvent, GuideDom as _, InteractionEvent, InteractionKind,
    JsonFileStore, ManualClock, MemoryStore, PreferenceStore as _, StopReason, TimerQueue,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{
    approx, clone_count, engine, engine_with_store, guide, loading_guide, no_loop, run_until,
    scroll_top,
};

// --- Watchdog ---

#[test]
fn watchdog_nudges_when_frames_are_throttled() {
    let g = guide(40, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    assert!(engine.start());
    engine.scheduler_mut().set_frames_throttled(true);

    engine.advance(Duration::from_secs(1));
    // Ticks at 500, 750 and 1000 ms are past the 400 ms threshold.
    assert_eq!(engine.state().watchdog_nudges, 3);
    assert!(approx(scroll_top(&engine, g.outer), 1.8));
    let nudges = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::WatchdogNudge { .. }))
        .count();
    assert_eq!(nudges, 3);

    engine.scheduler_mut().set_frames_throttled(false);
    engine.advance(Duration::from_millis(160));
    assert!(scroll_top(&engine, g.outer) > 1.8 + 5.0 * 0.6);
}

#[test]
fn watchdog_stays_quiet_while_frames_flow() {
    let g = guide(40, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.start();
    engine.advance(Duration::from_secs(2));
    assert_eq!(engine.state().watchdog_nudges, 0);
}

#[test]
fn watchdog_skips_hidden_document() {
    let g = guide(40, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.start();
    engine.scheduler_mut().set_frames_throttled(true);
    engine.dom_mut().set_hidden(true);

    engine.advance(Duration::from_secs(2));
    assert_eq!(engine.state().watchdog_nudges, 0);
    assert!(approx(scroll_top(&engine, g.outer), 0.0));
    assert!(engine.is_scrolling());
}

// --- Readiness ---

#[test]
fn readiness_times_out_and_clones_anyway() {
    let g = loading_guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert!(engine.debug().readiness_pending);

    engine.advance(Duration::from_secs(1));
    assert_eq!(clone_count(&engine, g.outer), 0);

    engine.advance(Duration::from_millis(1100));
    assert_eq!(clone_count(&engine, g.outer), 12);
    assert!(!engine.debug().readiness_pending);
}

#[test]
fn readiness_clones_once_rows_fill_in() {
    let g = loading_guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.advance(Duration::from_millis(300));

    let name = engine.dom().query(Some(g.rows[2]), ".chan-name")[0];
    engine.dom_mut().set_text(name, "7 KGO");
    engine.advance(Duration::from_millis(100));

    assert_eq!(clone_count(&engine, g.outer), 12);
    assert!(approx(scroll_top(&engine, g.outer), 240.0));
}

#[test]
fn reaching_end_before_clones_waits_then_resumes() {
    let g = loading_guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig { speed: 4.0, ..EngineConfig::default() });
    assert!(engine.start());

    engine.advance(Duration::from_millis(1200));
    assert_eq!(engine.state().phase, DriftPhase::AwaitingClones);
    assert!(engine.is_scrolling());
    assert!(approx(scroll_top(&engine, g.outer), 200.0));

    engine.advance(Duration::from_millis(1000));
    assert_eq!(clone_count(&engine, g.outer), 12);
    assert_eq!(engine.state().phase, DriftPhase::Running);
    assert!(scroll_top(&engine, g.outer) > 440.0);
    assert!(!engine.drain_events().iter().any(|e| matches!(e, EngineEvent::Stopped(_))));
}

// --- Resize ---

#[test]
fn resize_rebuilds_clones_when_more_are_needed() {
    let g = guide(20, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.drain_events();

    engine.dom_mut().set_viewport(g.outer, 400.0);
    engine.on_resize();

    assert_eq!(clone_count(&engine, g.outer), 22);
    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::ClonesRemoved(12)));
    let outcome = events.iter().find_map(|e| match e {
        EngineEvent::Cloned(outcome) => Some(*outcome),
        _ => None,
    });
    assert_eq!(outcome.map(|o| o.clones_per_side), Some(11));
    assert_eq!(engine.debug().prepended_height, Some(440.0));
}

#[test]
fn resize_with_same_clone_count_keeps_clones() {
    let g = guide(20, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.drain_events();

    engine.dom_mut().set_viewport(g.outer, 190.0);
    engine.on_resize();

    assert_eq!(clone_count(&engine, g.outer), 12);
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.debug().prepended_height, Some(240.0));
}

// --- Idle resume ---

#[test]
fn interaction_pauses_until_idle_delay_passes() {
    let g = guide(40, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.init();
    engine.start();
    engine.advance(Duration::from_secs(1));

    engine.on_interaction(InteractionEvent::new(InteractionKind::PointerDown, g.rows[1]));
    assert!(!engine.is_scrolling());

    engine.advance(Duration::from_millis(4500));
    assert!(!engine.is_scrolling());
    engine.advance(Duration::from_secs(1));
    assert!(engine.is_scrolling());
}

#[test]
fn pointer_movement_inside_target_extends_pause() {
    let g = guide(40, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.init();
    engine.start();
    engine.advance(Duration::from_secs(1));
    engine.on_interaction(InteractionEvent::new(InteractionKind::Click, g.rows[0]));

    engine.advance(Duration::from_secs(3));
    engine.on_interaction(InteractionEvent::new(InteractionKind::PointerMove, g.rows[3]));
    engine.advance(Duration::from_millis(2500));
    assert!(!engine.is_scrolling());

    engine.advance(Duration::from_secs(3));
    assert!(engine.is_scrolling());
}

#[test]
fn becoming_visible_runs_idle_check_immediately() {
    let g = guide(40, 40.0, 200.0);
    let config = EngineConfig { idle_check_ms: 60_000, ..no_loop() };
    let mut engine = engine(g.dom, config);
    engine.init();
    engine.start();
    engine.advance(Duration::from_millis(500));
    engine.on_interaction(InteractionEvent::new(InteractionKind::TouchStart, g.rows[0]));

    engine.dom_mut().set_hidden(true);
    engine.on_visibility_change();
    engine.advance(Duration::from_millis(5600));
    assert!(!engine.is_scrolling());

    engine.dom_mut().set_hidden(false);
    engine.on_visibility_change();
    assert!(engine.is_scrolling());
}

#[test]
fn end_reached_restarts_after_configured_delay() {
    let g = guide(10, 40.0, 200.0);
    let config = EngineConfig { auto_restart_delay_ms: Some(8000), ..no_loop() };
    let mut engine = engine(g.dom, config);
    engine.init();
    engine.start();
    let events = run_until(&mut engine, Duration::from_secs(10), |e| {
        *e == EngineEvent::Stopped(StopReason::EndReached)
    });
    assert_eq!(events.last(), Some(&EngineEvent::Stopped(StopReason::EndReached)));

    engine.advance(Duration::from_secs(7));
    assert!(!engine.is_scrolling());
    engine.advance(Duration::from_secs(2));
    assert!(engine.is_scrolling());
    assert!(!engine.status().end_reached);
    assert!(scroll_top(&engine, g.outer) < 100.0);
}

// --- Clones and persistence ---

#[test]
fn remove_clones_restores_original_rows() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.drain_events();

    assert_eq!(engine.remove_clones(), 12);
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert!(approx(scroll_top(&engine, g.outer), 0.0));
    assert!(!engine.status().cloned);
    assert_eq!(engine.drain_events(), vec![EngineEvent::ClonesRemoved(12)]);
    assert_eq!(engine.remove_clones(), 0);
    assert!(engine.clone_now());
}

#[test]
fn disabled_preference_at_init_leaves_rows_uncloned() {
    let g = guide(10, 40.0, 200.0);
    let mut store = MemoryStore::new();
    store.set(AUTO_SCROLL_PREF_KEY, "false").unwrap();
    let mut engine = engine_with_store(g.dom, store, EngineConfig::default());
    engine.init();
    engine.advance(Duration::from_secs(3));

    assert!(!engine.is_scrolling());
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert_eq!(engine.dom().children(g.outer).len(), 10);
}

#[test]
fn disable_drops_existing_clones() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.advance(Duration::from_secs(3));
    assert!(clone_count(&engine, g.outer) > 0);

    engine.disable();
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert!(!engine.status().cloned);
    engine.advance(Duration::from_secs(3));
    assert_eq!(clone_count(&engine, g.outer), 0);
}

#[test]
fn json_store_keeps_choice_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    let open = |path: &std::path::Path| {
        let g = guide(10, 40.0, 200.0);
        let queue = TimerQueue::new(ManualClock::new(), Duration::from_millis(16));
        AutoScrollEngine::new(g.dom, queue, JsonFileStore::open(path), EngineConfig::default())
    };

    let mut first = open(&path);
    first.disable();
    drop(first);

    let mut reloaded = open(&path);
    assert!(!reloaded.status().enabled);
    assert!(!reloaded.start());
    assert_eq!(reloaded.prefs().get(AUTO_SCROLL_PREF_KEY).unwrap().as_deref(), Some("false"));
}

#[test]
fn teardown_cancels_every_timer() {
    let g = loading_guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();
    engine.start();
    assert!(engine.scheduler().pending_len() > 0);

    engine.teardown();
    assert_eq!(engine.scheduler().pending_len(), 0);
    assert_eq!(engine.state().last_stop_reason, Some(StopReason::Teardown));
    engine.advance(Duration::from_secs(10));
    assert!(!engine.is_scrolling());
    assert_eq!(clone_count(&engine, g.outer), 0);
}
