// =====
// TESTS: 10
// =====
//
// Engine invariants: idempotent stop, no-op without a target, interaction
// scoping, wrap offset, clone idempotence and preference round-trips.

use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::scroll::looping::measure_prepended_height;
use guide_autoscroll::scroll::prefs::AUTO_SCROLL_PREF_KEY;
use guide_autoscroll::scroll::{
    Element, EngineEvent, GuideDom as _, InteractionEvent, InteractionKind, MemoryDom,
    MemoryStore, StopReason, Task,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{
    approx, clone_count, engine, engine_with_store, guide, no_loop, run_until, scroll_top,
};

// --- Stop ---

#[test]
fn stop_twice_matches_stop_once() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    assert!(engine.start());
    engine.stop(StopReason::Manual);
    let once = engine.debug();
    engine.stop(StopReason::Manual);
    let twice = engine.debug();

    assert_eq!(once, twice);
    assert!(!engine.is_scrolling());
    assert!(!twice.pending_tasks.contains(&Task::Frame));
    assert!(!twice.pending_tasks.contains(&Task::Watchdog));
    let stops = engine.drain_events().into_iter().filter(|e| matches!(e, EngineEvent::Stopped(_)));
    assert_eq!(stops.count(), 1);
}

// --- Target resolution ---

#[test]
fn start_without_matching_element_is_a_no_op() {
    let mut dom = MemoryDom::new();
    let body = dom.body();
    let list = dom.append(body, Element::new().class("channel-list").viewport(100.0));
    for _ in 0..10 {
        dom.append(list, Element::new().class("guide-row").height(40.0));
    }
    let mut engine = engine(dom, EngineConfig::default());

    assert!(!engine.start());
    assert!(!engine.is_scrolling());
    assert!(approx(engine.dom().scroll_top(list), 0.0));
    assert!(engine.dom().query(None, ".__auto_scroll_clone").is_empty());
    assert_eq!(engine.dom().attribute(list, "data-auto-scroll-cloned"), None);
}

#[test]
fn start_without_overflow_is_a_no_op() {
    let g = guide(4, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig::default());
    engine.init();

    assert!(!engine.start());
    assert!(!engine.is_scrolling());
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert!(approx(scroll_top(&engine, g.outer), 0.0));
}

// --- Interaction ---

#[test]
fn pointerdown_inside_target_stops_synchronously() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.start();
    engine.advance(Duration::from_millis(100));

    let cell = engine.dom().query(Some(g.rows[2]), ".chan-name")[0];
    engine.on_interaction(InteractionEvent::new(InteractionKind::PointerDown, cell));

    assert!(!engine.is_scrolling());
    assert_eq!(engine.state().last_stop_reason, Some(StopReason::UserInteraction));
}

#[test]
fn pointerdown_outside_target_is_ignored() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    engine.start();
    engine.advance(Duration::from_millis(100));
    let before = engine.state().last_activity;

    let body = engine.dom().body();
    engine.on_interaction(InteractionEvent::new(InteractionKind::PointerDown, g.outside));
    engine.on_interaction(InteractionEvent::new(InteractionKind::FocusIn, body));

    assert!(engine.is_scrolling());
    assert_eq!(engine.state().last_activity, before);
}

// --- Looping ---

#[test]
fn wrap_writes_prepended_block_height() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, EngineConfig { speed: 4.0, ..EngineConfig::default() });
    engine.init();
    let prepended = measure_prepended_height(engine.dom(), g.outer);
    assert!(approx(prepended, 240.0));
    engine.start();

    let events = run_until(&mut engine, Duration::from_secs(10), |e| {
        matches!(e, EngineEvent::Wrapped { .. })
    });
    let offset = events.iter().find_map(|e| match e {
        EngineEvent::Wrapped { offset } => Some(*offset),
        _ => None,
    });
    assert_eq!(offset, Some(prepended));
    assert!(approx(scroll_top(&engine, g.outer), prepended));
}

#[test]
fn cloning_twice_keeps_clone_count() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine(g.dom, no_loop());
    assert!(engine.clone_now());
    let once = clone_count(&engine, g.outer);
    assert!(!engine.clone_now());

    assert_eq!(once, 12);
    assert_eq!(clone_count(&engine, g.outer), once);
}

// --- Preference ---

#[test]
fn disable_then_enable_round_trips_through_store() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());

    engine.disable();
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));
    assert!(!engine.status().enabled);

    engine.enable();
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
    assert!(engine.is_scrolling());
}

#[test]
fn disabled_preference_survives_reload() {
    let store = MemoryStore::new();
    let g = guide(10, 40.0, 200.0);
    let mut first = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    first.disable();
    drop(first);

    let g = guide(10, 40.0, 200.0);
    let mut reloaded = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    reloaded.init();
    assert!(!reloaded.start());
    reloaded.advance(Duration::from_secs(7));
    assert!(!reloaded.is_scrolling());

    reloaded.enable();
    let g = guide(10, 40.0, 200.0);
    let mut again = engine_with_store(g.dom, store, EngineConfig::default());
    assert!(again.start());
}

#[test]
fn toggle_flips_persisted_value() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());

    assert!(!engine.toggle());
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));
    assert!(engine.toggle());
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
    assert!(engine.is_scrolling());
}
