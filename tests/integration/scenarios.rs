// =====
// TESTS: 5
// =====
//
// End-to-end scenarios over a ten-row guide with a five-row viewport.

use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::scroll::looping::{all_rows, source_of};
use guide_autoscroll::scroll::prefs::AUTO_SCROLL_PREF_KEY;
use guide_autoscroll::scroll::{DriftPhase, EngineEvent, MemoryStore, StopReason};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{
    approx, clone_count, engine, engine_with_store, guide, no_loop, run_until, scroll_top,
};

#[test]
fn init_clones_one_screen_plus_margin_on_each_side() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();

    let outcome = engine
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            EngineEvent::Cloned(outcome) => Some(outcome),
            _ => None,
        })
        .expect("rows are populated, cloning runs during init");
    assert_eq!(outcome.clones_per_side, 6);
    assert!(approx(outcome.prepended_height, 240.0));
    assert!(approx(scroll_top(&engine, g.outer), 240.0));
    assert_eq!(clone_count(&engine, g.outer), 12);

    // Tail rows 4..10 above the originals, head rows 0..6 below.
    let sources: Vec<_> = all_rows(engine.dom(), g.outer)
        .into_iter()
        .map(|row| source_of(engine.dom(), row).unwrap_or(row))
        .collect();
    let mut expected = g.rows[4..].to_vec();
    expected.extend_from_slice(&g.rows);
    expected.extend_from_slice(&g.rows[..6]);
    assert_eq!(sources, expected);
}

#[test]
fn reaching_bottom_wraps_to_prepended_height_and_keeps_going() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig { speed: 1.2, ..EngineConfig::default() });
    engine.init();
    assert!(engine.start());

    let events = run_until(&mut engine, Duration::from_secs(10), |e| {
        matches!(e, EngineEvent::Wrapped { .. })
    });
    assert!(events.iter().any(|e| matches!(e, EngineEvent::Wrapped { .. })));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::Stopped(_))));
    assert!(approx(scroll_top(&engine, g.outer), 240.0));
    assert!(engine.is_scrolling());

    engine.advance(Duration::from_millis(200));
    assert_eq!(engine.state().phase, DriftPhase::Running);
    assert!(scroll_top(&engine, g.outer) > 240.0);
    assert_eq!(engine.state().wraps, 1);
}

#[test]
fn without_loop_mode_drift_parks_at_the_bottom() {
    let g = guide(10, 40.0, 200.0);
    let config = EngineConfig { auto_restart_delay_ms: Some(30_000), ..no_loop() };
    let mut engine = engine(g.dom, config);
    engine.init();
    assert!(engine.start());

    let events = run_until(&mut engine, Duration::from_secs(10), |e| {
        matches!(e, EngineEvent::Stopped(_))
    });
    assert_eq!(events.last(), Some(&EngineEvent::Stopped(StopReason::EndReached)));
    assert!(approx(scroll_top(&engine, g.outer), 200.0));
    assert!(engine.status().end_reached);
    assert_eq!(clone_count(&engine, g.outer), 0);

    // Idle long enough, but the restart delay has not passed.
    engine.advance(Duration::from_secs(6));
    assert!(!engine.is_scrolling());
    assert!(approx(scroll_top(&engine, g.outer), 200.0));
}

#[test]
fn classic_theme_stops_drift_and_remembers_preference() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();
    assert!(engine.start());
    engine.advance(Duration::from_millis(100));

    engine.on_theme_applied("tvguide1990");

    assert!(!engine.is_scrolling());
    assert_eq!(engine.state().last_stop_reason, Some(StopReason::Theme));
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));
    assert_eq!(engine.debug().remembered_preference, Some(true));
    assert!(engine.status().theme_locked);
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert!(!engine.start());
}

#[test]
fn leaving_classic_theme_restores_preference_and_idle_resumes() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();
    engine.start();
    engine.on_theme_applied("tvguide1990");

    engine.on_theme_applied("default");
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
    assert!(!engine.is_scrolling());
    assert_eq!(engine.debug().remembered_preference, None);

    engine.advance(Duration::from_secs(6));
    assert!(engine.is_scrolling());
    assert_eq!(clone_count(&engine, g.outer), 12);
}
