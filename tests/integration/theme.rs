// =====
// TESTS: 6
// =====
//
// Classic-theme lock: body-class observation, saved theme at init, and how
// preference writes behave while the lock holds.

use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::scroll::prefs::{AUTO_SCROLL_PREF_KEY, REMEMBERED_PREF_KEY, THEME_PREF_KEY};
use guide_autoscroll::scroll::{MemoryStore, PreferenceStore as _, StopReason};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{clone_count, engine_with_store, guide};

#[test]
fn body_class_mutation_toggles_the_lock() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();
    engine.start();

    engine.dom_mut().set_body_classes("tvguide1990 zoom-2");
    engine.on_body_class_mutation();
    assert!(!engine.is_scrolling());
    assert_eq!(engine.state().last_stop_reason, Some(StopReason::Theme));
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));

    engine.dom_mut().set_body_classes("zoom-2");
    engine.on_body_class_mutation();
    assert!(!engine.status().theme_locked);
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
}

#[test]
fn init_honours_saved_classic_theme() {
    let g = guide(10, 40.0, 200.0);
    let mut store = MemoryStore::new();
    store.set(THEME_PREF_KEY, "tvguide1990").unwrap();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();

    assert!(engine.status().theme_locked);
    assert_eq!(clone_count(&engine, g.outer), 0);
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));
    assert!(!engine.start());
}

#[test]
fn enable_during_lock_only_updates_remembered_value() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();
    engine.disable();
    engine.on_theme_applied("tvguide1990");
    assert_eq!(engine.debug().remembered_preference, Some(false));

    engine.enable();
    assert!(!engine.is_scrolling());
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("false"));
    assert_eq!(engine.debug().remembered_preference, Some(true));

    engine.on_theme_applied("default");
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
}

#[test]
fn repeated_theme_signals_keep_first_remembered_value() {
    let g = guide(10, 40.0, 200.0);
    let store = MemoryStore::new();
    let mut engine = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    engine.init();

    engine.on_theme_applied("tvguide1990");
    engine.dom_mut().set_body_classes("tvguide1990");
    engine.on_body_class_mutation();
    engine.on_theme_applied("tvguide1990");

    assert_eq!(engine.debug().remembered_preference, Some(true));
    engine.on_theme_applied("midnight");
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
}

#[test]
fn idle_checks_do_not_start_while_locked() {
    let g = guide(10, 40.0, 200.0);
    let mut engine = engine_with_store(g.dom, MemoryStore::new(), EngineConfig::default());
    engine.init();
    engine.on_theme_applied("tvguide1990");

    engine.advance(Duration::from_secs(12));
    assert!(!engine.is_scrolling());
    assert!(engine.status().theme_locked);
}

#[test]
fn reload_under_classic_theme_still_restores_choice_on_leave() {
    let mut store = MemoryStore::new();
    let g = guide(10, 40.0, 200.0);
    let mut first = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    first.init();
    store.set(THEME_PREF_KEY, "tvguide1990").unwrap();
    first.on_theme_applied("tvguide1990");
    assert_eq!(store.raw(REMEMBERED_PREF_KEY).as_deref(), Some("true"));
    drop(first);

    let g = guide(10, 40.0, 200.0);
    let mut reloaded = engine_with_store(g.dom, store.clone(), EngineConfig::default());
    reloaded.init();
    assert!(reloaded.status().theme_locked);
    assert_eq!(reloaded.debug().remembered_preference, Some(true));

    reloaded.on_theme_applied("default");
    assert_eq!(store.raw(AUTO_SCROLL_PREF_KEY).as_deref(), Some("true"));
    assert_eq!(store.raw(REMEMBERED_PREF_KEY), None);
    assert!(reloaded.start());
}
