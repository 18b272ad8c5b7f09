// guide-autoscroll - Drifting auto-scroll engine for retro channel guides
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The auto-scroll state machine.
//!
//! Drift advances the target's scroll offset once per animation frame. A
//! watchdog interval covers frames the host stops delivering, an idle-check
//! interval resumes drift after inactivity, and a readiness poll delays row
//! cloning until the guide has content. All of it runs on one cooperative
//! loop, so every callback re-checks [`DriftPhase`] before acting.

use super::dom::{GuideDom, NodeId, max_scroll_top};
use super::looping::{
    self, CloneOutcome, clone_boundary_rows, clone_rows, clones_per_side, measure_prepended_height,
    measure_row_height, original_rows, refresh_row, top_visible_row,
};
use super::prefs::{PreferenceStore, REMEMBERED_PREF_KEY, ScrollPreference, THEME_PREF_KEY};
use super::readiness::{Readiness, ReadinessGate};
use super::scheduler::{ManualClock, Scheduler, Task, TimerQueue, TimerToken};
use super::target::{ScrollTarget, resolve_target};
use crate::config::EngineConfig;
use crate::error::ScrollError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Distance from the bottom that already counts as "reached the end".
const END_TOLERANCE_PX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriftPhase {
    Idle,
    /// Frame loop scheduled.
    Running,
    /// Just wrapped; the frame loop resumes after a short settle delay.
    SettlingAfterWrap,
    /// Hit the bottom before clones existed; waiting on the readiness gate.
    AwaitingClones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    Manual,
    UserInteraction,
    EndReached,
    Disabled,
    Theme,
    TargetLost,
    Teardown,
}

impl StopReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::UserInteraction => "user-interaction",
            Self::EndReached => "end-reached",
            Self::Disabled => "disabled",
            Self::Theme => "theme",
            Self::TargetLost => "target-lost",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    PointerDown,
    TouchStart,
    FocusIn,
    Click,
    PointerEnter,
    PointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub target: NodeId,
}

impl InteractionEvent {
    #[must_use]
    pub fn new(kind: InteractionKind, target: NodeId) -> Self {
        Self { kind, target }
    }
}

/// Observable side effects, drained by the host or by tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    Started,
    Stopped(StopReason),
    Wrapped { offset: f64 },
    Cloned(CloneOutcome),
    ClonesRemoved(usize),
    WatchdogNudge { scroll_top: f64 },
    PreferenceChanged(bool),
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftState {
    pub phase: DriftPhase,
    pub last_activity: Duration,
    pub end_reached_at: Option<Duration>,
    pub loop_mode: bool,
    /// Pixels per frame.
    pub speed: f64,
    pub last_frame_at: Option<Duration>,
    pub last_stop_reason: Option<StopReason>,
    pub wraps: u64,
    pub watchdog_nudges: u64,
}

impl DriftState {
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.phase != DriftPhase::Idle
    }
}

#[derive(Debug, Default)]
struct Timers {
    frame: Option<TimerToken>,
    watchdog: Option<TimerToken>,
    idle_check: Option<TimerToken>,
    initial_start: Option<TimerToken>,
    wrap_resume: Option<TimerToken>,
    readiness: Option<TimerToken>,
}

#[derive(Debug, Default)]
struct ThemeLock {
    active: bool,
    /// Preference in force before the classic theme switched it off.
    remembered: Option<bool>,
}

/// Read-only summary for settings UIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollStatus {
    pub scrolling: bool,
    pub phase: DriftPhase,
    pub enabled: bool,
    pub loop_mode: bool,
    pub speed: f64,
    pub target: Option<NodeId>,
    pub cloned: bool,
    pub theme_locked: bool,
    pub end_reached: bool,
    pub last_stop_reason: Option<StopReason>,
}

/// Full diagnostic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub status: ScrollStatus,
    pub selector: Option<String>,
    pub now_ms: u128,
    pub last_activity_ms: u128,
    pub idle_for_ms: u128,
    pub idle_delay_ms: u64,
    pub last_frame_ms: Option<u128>,
    pub end_reached_ms: Option<u128>,
    pub scroll_top: Option<f64>,
    pub scroll_height: Option<f64>,
    pub client_height: Option<f64>,
    pub prepended_height: Option<f64>,
    pub clone_count: usize,
    pub readiness_pending: bool,
    pub remembered_preference: Option<bool>,
    pub wraps: u64,
    pub watchdog_nudges: u64,
    pub pending_tasks: Vec<Task>,
}

/// Auto-scroll engine over a document, a scheduler and a preference store.
pub struct AutoScrollEngine<D, S, P> {
    dom: D,
    scheduler: S,
    prefs: P,
    config: EngineConfig,
    target: Option<ScrollTarget>,
    state: DriftState,
    timers: Timers,
    readiness: Option<ReadinessGate>,
    theme: ThemeLock,
    events: Vec<EngineEvent>,
    initialized: bool,
}

impl<D: GuideDom, S: Scheduler, P: PreferenceStore> AutoScrollEngine<D, S, P> {
    pub fn new(dom: D, scheduler: S, prefs: P, config: EngineConfig) -> Self {
        let state = DriftState {
            phase: DriftPhase::Idle,
            last_activity: scheduler.now(),
            end_reached_at: None,
            loop_mode: config.loop_mode,
            speed: config.speed,
            last_frame_at: None,
            last_stop_reason: None,
            wraps: 0,
            watchdog_nudges: 0,
        };
        Self {
            dom,
            scheduler,
            prefs,
            config,
            target: None,
            state,
            timers: Timers::default(),
            readiness: None,
            theme: ThemeLock::default(),
            events: Vec::new(),
            initialized: false,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Mutable document access for the host (row updates, resizes).
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Store access for layers that share it (the theming layer writes `theme`).
    pub fn prefs_mut(&mut self) -> &mut P {
        &mut self.prefs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &DriftState {
        &self.state
    }

    pub fn target(&self) -> Option<&ScrollTarget> {
        self.target.as_ref()
    }

    pub fn is_scrolling(&self) -> bool {
        self.state.is_scrolling()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Page-ready hook: honour a saved classic theme, find the target, arm
    /// the idle timers and start preparing clones.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.state.last_activity = self.scheduler.now();

        let saved_theme = match self.prefs.get(THEME_PREF_KEY) {
            Ok(theme) => theme,
            Err(err) => {
                tracing::debug!("theme preference unreadable: {err}");
                None
            }
        };
        if saved_theme.as_deref() == Some(self.config.classic_theme.as_str())
            || self.dom.body_has_class(&self.config.classic_theme)
        {
            self.enter_classic_theme();
        }

        if let Err(err) = self.ensure_target() {
            tracing::debug!("no scroll target at init, will retry on idle checks: {err}");
        }

        self.timers.idle_check =
            Some(self.scheduler.schedule_every(self.config.idle_check(), Task::IdleCheck));
        self.timers.initial_start =
            Some(self.scheduler.schedule_after(self.config.idle_delay(), Task::InitialStart));

        if self.state.loop_mode && !self.theme.active && self.preference_enabled() {
            self.begin_readiness();
        }
        tracing::debug!(target = ?self.target, "auto-scroll initialised");
    }

    /// Stop and cancel every timer.
    pub fn teardown(&mut self) {
        self.stop(StopReason::Teardown);
        for token in [
            self.timers.idle_check.take(),
            self.timers.initial_start.take(),
            self.timers.readiness.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(token);
        }
        self.readiness = None;
        self.initialized = false;
    }

    // -----------------------------------------------------------------------
    // Control surface
    // -----------------------------------------------------------------------

    /// Begin or resume drift. Returns whether drift is running afterwards.
    pub fn start(&mut self) -> bool {
        if self.state.is_scrolling() {
            return true;
        }
        if self.theme.active {
            tracing::debug!("start refused: classic theme active");
            return false;
        }
        if !self.preference_enabled() {
            tracing::debug!("start refused: auto-scroll disabled by preference");
            return false;
        }
        let target = match self.ensure_target() {
            Ok(target) => target,
            Err(err) => {
                tracing::debug!("start skipped: {err}");
                return false;
            }
        };

        self.rewind_if_parked(&target);
        self.state.end_reached_at = None;
        self.state.phase = DriftPhase::Running;
        self.state.last_frame_at = Some(self.scheduler.now());
        self.request_frame();
        if self.timers.watchdog.is_none() {
            self.timers.watchdog =
                Some(self.scheduler.schedule_every(self.config.watchdog_interval(), Task::Watchdog));
        }
        self.events.push(EngineEvent::Started);
        tracing::info!(speed = self.state.speed, element = ?target.element, "auto-scroll started");

        if self.state.loop_mode && !target.is_cloned(&self.dom) {
            self.begin_readiness();
        }
        true
    }

    /// Halt drift immediately. Calling it while stopped does nothing.
    pub fn stop(&mut self, reason: StopReason) {
        if !self.state.is_scrolling() {
            return;
        }
        for token in [
            self.timers.frame.take(),
            self.timers.watchdog.take(),
            self.timers.wrap_resume.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(token);
        }
        self.state.phase = DriftPhase::Idle;
        self.state.last_stop_reason = Some(reason);
        self.events.push(EngineEvent::Stopped(reason));
        tracing::info!(%reason, "auto-scroll stopped");
    }

    pub fn enable(&mut self) {
        if self.theme.active {
            // Applied when the classic theme is left.
            self.remember_preference(true);
            tracing::debug!("enable deferred until classic theme is left");
            return;
        }
        self.write_preference(true);
        self.start();
    }

    /// Persist "off", stop drift and drop any loop clones.
    pub fn disable(&mut self) {
        if self.theme.active {
            self.remember_preference(false);
        }
        self.write_preference(false);
        self.stop(StopReason::Disabled);
        self.cancel_readiness();
        self.remove_clones();
    }

    /// Flip the persisted preference. Returns the new value.
    pub fn toggle(&mut self) -> bool {
        let enabled = if self.theme.active {
            self.theme.remembered.unwrap_or(self.config.enabled_by_default)
        } else {
            self.preference_enabled()
        };
        if enabled {
            self.disable();
        } else {
            self.enable();
        }
        !enabled
    }

    /// Set the drift step in pixels per frame. Non-finite or non-positive
    /// values are rejected.
    pub fn set_speed(&mut self, px_per_frame: f64) -> bool {
        if !px_per_frame.is_finite() || px_per_frame <= 0.0 {
            tracing::warn!("{}", ScrollError::InvalidSpeed(px_per_frame));
            return false;
        }
        self.state.speed = px_per_frame;
        tracing::debug!(speed = px_per_frame, "scroll speed updated");
        true
    }

    pub fn set_loop_mode(&mut self, enabled: bool) {
        self.state.loop_mode = enabled;
        tracing::debug!(loop_mode = enabled, "loop mode updated");
    }

    /// Clone rows right away, skipping the readiness gate.
    pub fn clone_now(&mut self) -> bool {
        let fallback = self.config.fallback_row_height;
        let result = self
            .ensure_target()
            .and_then(|target| clone_boundary_rows(&mut self.dom, &target, fallback));
        match result {
            Ok(outcome) => {
                self.cancel_readiness();
                self.events.push(EngineEvent::Cloned(outcome));
                if self.state.phase == DriftPhase::AwaitingClones {
                    self.state.phase = DriftPhase::Running;
                    self.request_frame();
                }
                true
            }
            Err(err) => {
                tracing::warn!("clone request ignored: {err}");
                false
            }
        }
    }

    /// Remove every loop clone from the target. Returns how many were removed.
    pub fn remove_clones(&mut self) -> usize {
        let Some(target) = self.target.clone() else {
            return 0;
        };
        let removed = looping::remove_clones(&mut self.dom, &target);
        if removed > 0 {
            self.events.push(EngineEvent::ClonesRemoved(removed));
        }
        removed
    }

    /// Forget the current target; the next start resolves it again.
    pub fn recompute(&mut self) {
        self.cancel_readiness();
        if let Some(old) = self.target.take() {
            tracing::debug!(element = ?old.element, "scroll target invalidated");
        }
    }

    pub fn status(&self) -> ScrollStatus {
        ScrollStatus {
            scrolling: self.state.is_scrolling(),
            phase: self.state.phase,
            enabled: self.preference_enabled(),
            loop_mode: self.state.loop_mode,
            speed: self.state.speed,
            target: self.target.as_ref().map(|t| t.element),
            cloned: self.target.as_ref().is_some_and(|t| t.is_cloned(&self.dom)),
            theme_locked: self.theme.active,
            end_reached: self.state.end_reached_at.is_some(),
            last_stop_reason: self.state.last_stop_reason,
        }
    }

    pub fn debug(&self) -> DebugSnapshot {
        let now = self.scheduler.now();
        let el = self.target.as_ref().map(|t| t.element);
        let pending_tasks = [
            (self.timers.frame, Task::Frame),
            (self.timers.watchdog, Task::Watchdog),
            (self.timers.idle_check, Task::IdleCheck),
            (self.timers.initial_start, Task::InitialStart),
            (self.timers.wrap_resume, Task::WrapResume),
            (self.timers.readiness, Task::ReadinessPoll),
        ]
        .into_iter()
        .filter_map(|(token, task)| token.filter(|t| self.scheduler.is_pending(*t)).map(|_| task))
        .collect();
        DebugSnapshot {
            status: self.status(),
            selector: self.target.as_ref().map(|t| t.selector.clone()),
            now_ms: now.as_millis(),
            last_activity_ms: self.state.last_activity.as_millis(),
            idle_for_ms: now.saturating_sub(self.state.last_activity).as_millis(),
            idle_delay_ms: self.config.idle_delay_ms,
            last_frame_ms: self.state.last_frame_at.map(|t| t.as_millis()),
            end_reached_ms: self.state.end_reached_at.map(|t| t.as_millis()),
            scroll_top: el.map(|e| self.dom.scroll_top(e)),
            scroll_height: el.map(|e| self.dom.scroll_height(e)),
            client_height: el.map(|e| self.dom.client_height(e)),
            prepended_height: self.target.as_ref().and_then(|t| t.prepended_height(&self.dom)),
            clone_count: el.map_or(0, |e| clone_rows(&self.dom, e).len()),
            readiness_pending: self.readiness.is_some(),
            remembered_preference: self.theme.remembered,
            wraps: self.state.wraps,
            watchdog_nudges: self.state.watchdog_nudges,
            pending_tasks,
        }
    }

    // -----------------------------------------------------------------------
    // External signals
    // -----------------------------------------------------------------------

    /// Interaction inside the target pauses drift; anything else is ignored.
    pub fn on_interaction(&mut self, event: InteractionEvent) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        if !self.dom.contains(target.element, event.target) {
            return;
        }
        self.state.last_activity = self.scheduler.now();
        tracing::trace!(kind = ?event.kind, "user activity inside scroll target");
        self.stop(StopReason::UserInteraction);
    }

    /// Document became visible or hidden; visible runs the idle check now.
    pub fn on_visibility_change(&mut self) {
        if self.dom.is_hidden() {
            return;
        }
        self.idle_check();
    }

    /// `theme:applied` notification.
    pub fn on_theme_applied(&mut self, theme: &str) {
        if theme == self.config.classic_theme {
            self.enter_classic_theme();
        } else {
            self.leave_classic_theme();
        }
    }

    /// Body class attribute changed.
    pub fn on_body_class_mutation(&mut self) {
        if self.dom.body_has_class(&self.config.classic_theme) {
            self.enter_classic_theme();
        } else {
            self.leave_classic_theme();
        }
    }

    /// Layout changed. Clones are rebuilt when a different number is needed
    /// to cover the viewport, otherwise the wrap offset is re-measured.
    pub fn on_resize(&mut self) {
        let Some(target) = self.target.clone() else {
            return;
        };
        if !target.is_cloned(&self.dom) {
            return;
        }
        let el = target.element;
        let rows = original_rows(&self.dom, el);
        let row_height = measure_row_height(&self.dom, &rows, self.config.fallback_row_height);
        let needed = clones_per_side(rows.len(), row_height, self.dom.client_height(el));
        let current = clone_rows(&self.dom, el).len() / 2;
        if needed == current {
            let height = measure_prepended_height(&self.dom, el);
            target.record_clones(&mut self.dom, height);
            tracing::debug!(prepended_height = height, "wrap offset re-measured");
            return;
        }
        self.remove_clones();
        match clone_boundary_rows(&mut self.dom, &target, self.config.fallback_row_height) {
            Ok(outcome) => self.events.push(EngineEvent::Cloned(outcome)),
            Err(err) => tracing::warn!("re-cloning after resize failed: {err}"),
        }
    }

    /// Run every task whose deadline has passed.
    pub fn run_due(&mut self) {
        while let Some(task) = self.scheduler.pop_due() {
            self.dispatch(task);
        }
    }

    fn dispatch(&mut self, task: Task) {
        match task {
            Task::Frame => {
                self.timers.frame = None;
                self.on_frame();
            }
            Task::Watchdog => self.on_watchdog(),
            Task::IdleCheck => self.idle_check(),
            Task::InitialStart => {
                self.timers.initial_start = None;
                self.idle_check();
            }
            Task::WrapResume => {
                self.timers.wrap_resume = None;
                if self.state.phase == DriftPhase::SettlingAfterWrap {
                    self.state.phase = DriftPhase::Running;
                    self.request_frame();
                }
            }
            Task::ReadinessPoll => {
                self.timers.readiness = None;
                self.poll_readiness();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Drift
    // -----------------------------------------------------------------------

    fn on_frame(&mut self) {
        if self.state.phase != DriftPhase::Running {
            return;
        }
        self.state.last_frame_at = Some(self.scheduler.now());
        if !self.dom.is_hidden() {
            self.step();
        }
        if self.state.phase == DriftPhase::Running {
            self.request_frame();
        }
    }

    fn on_watchdog(&mut self) {
        if self.state.phase != DriftPhase::Running || self.dom.is_hidden() {
            return;
        }
        let now = self.scheduler.now();
        let silent_for = self.state.last_frame_at.map_or(Duration::MAX, |t| now.saturating_sub(t));
        if silent_for <= self.config.watchdog_threshold() {
            return;
        }
        self.step();
        self.state.watchdog_nudges += 1;
        let scroll_top = self.target.as_ref().map_or(0.0, |t| self.dom.scroll_top(t.element));
        self.events.push(EngineEvent::WatchdogNudge { scroll_top });
        tracing::debug!(?silent_for, scroll_top, "watchdog nudged stalled drift");
    }

    /// One drift increment, including the end-of-content decision.
    fn step(&mut self) {
        let Some(target) = self.target.clone() else {
            self.stop(StopReason::TargetLost);
            return;
        };
        let el = target.element;
        let max = max_scroll_top(&self.dom, el);
        if max <= 0.0 {
            tracing::debug!(element = ?el, "scroll target no longer overflows");
            self.target = None;
            self.stop(StopReason::TargetLost);
            return;
        }
        let next = self.dom.scroll_top(el) + self.state.speed;
        self.dom.set_scroll_top(el, next);
        if self.dom.scroll_top(el) < max - END_TOLERANCE_PX {
            return;
        }

        if target.is_cloned(&self.dom) {
            self.wrap(&target);
        } else if self.state.loop_mode {
            tracing::debug!("reached end before clones existed, waiting for content");
            self.state.phase = DriftPhase::AwaitingClones;
            self.begin_readiness();
        } else {
            self.park_at_end(el, max);
        }
    }

    fn wrap(&mut self, target: &ScrollTarget) {
        let el = target.element;
        let offset = target
            .prepended_height(&self.dom)
            .unwrap_or_else(|| measure_prepended_height(&self.dom, el));
        self.dom.set_scroll_top(el, offset);
        self.state.wraps += 1;
        self.events.push(EngineEvent::Wrapped { offset });
        if let Some(row) = top_visible_row(&self.dom, el) {
            refresh_row(&mut self.dom, row);
        }
        self.state.phase = DriftPhase::SettlingAfterWrap;
        self.timers.wrap_resume =
            Some(self.scheduler.schedule_after(self.config.wrap_settle(), Task::WrapResume));
        tracing::trace!(offset, "wrapped to loop origin");
    }

    fn park_at_end(&mut self, el: NodeId, max: f64) {
        self.dom.set_scroll_top(el, max);
        self.state.end_reached_at = Some(self.scheduler.now());
        self.stop(StopReason::EndReached);
    }

    /// After an end-of-content stop, move back to where the loop begins.
    fn rewind_if_parked(&mut self, target: &ScrollTarget) {
        let el = target.element;
        let at_end = self.dom.scroll_top(el) >= max_scroll_top(&self.dom, el) - END_TOLERANCE_PX;
        if self.state.end_reached_at.is_some() || (at_end && !self.state.loop_mode) {
            let origin = target.prepended_height(&self.dom).unwrap_or(0.0);
            self.dom.set_scroll_top(el, origin);
            tracing::debug!(origin, "rewound parked drift");
        }
    }

    fn request_frame(&mut self) {
        if self.timers.frame.is_some_and(|t| self.scheduler.is_pending(t)) {
            return;
        }
        self.timers.frame = Some(self.scheduler.schedule_frame(Task::Frame));
    }

    // -----------------------------------------------------------------------
    // Idle resume
    // -----------------------------------------------------------------------

    fn idle_check(&mut self) {
        if self.state.is_scrolling() || self.theme.active || !self.preference_enabled() {
            return;
        }
        let now = self.scheduler.now();
        if let Some(at) = self.state.end_reached_at {
            match self.config.auto_restart_delay() {
                Some(delay) if now.saturating_sub(at) >= delay => {
                    tracing::debug!("auto-restart delay elapsed after end of content");
                }
                _ => return,
            }
        }
        if now.saturating_sub(self.state.last_activity) < self.config.idle_delay() {
            return;
        }
        self.start();
    }

    // -----------------------------------------------------------------------
    // Cloning readiness
    // -----------------------------------------------------------------------

    fn begin_readiness(&mut self) {
        if self.readiness.is_some() || self.target.is_none() {
            return;
        }
        self.readiness =
            Some(ReadinessGate::new(self.scheduler.now(), self.config.readiness_timeout()));
        self.poll_readiness();
    }

    fn cancel_readiness(&mut self) {
        self.readiness = None;
        if let Some(token) = self.timers.readiness.take() {
            self.scheduler.cancel(token);
        }
    }

    fn poll_readiness(&mut self) {
        let Some(gate) = self.readiness else {
            return;
        };
        let Some(target) = self.target.clone() else {
            self.readiness = None;
            return;
        };
        match gate.poll(&self.dom, &target, self.config.readiness_candidates, self.scheduler.now()) {
            Readiness::Pending => {
                self.timers.readiness =
                    Some(self.scheduler.schedule_after(self.config.readiness_poll(), Task::ReadinessPoll));
                return;
            }
            Readiness::Ready => tracing::debug!("guide rows populated"),
            Readiness::TimedOut => tracing::warn!("guide rows still empty, cloning anyway"),
        }
        self.readiness = None;
        self.finish_cloning(&target);
    }

    /// Readiness resolved. State may have moved on since the gate started.
    fn finish_cloning(&mut self, target: &ScrollTarget) {
        let mut failed = false;
        if self.state.loop_mode && !self.theme.active && !target.is_cloned(&self.dom) {
            match clone_boundary_rows(&mut self.dom, target, self.config.fallback_row_height) {
                Ok(outcome) => self.events.push(EngineEvent::Cloned(outcome)),
                Err(err) => {
                    tracing::warn!("row cloning failed: {err}");
                    failed = true;
                }
            }
        }
        if self.state.phase != DriftPhase::AwaitingClones {
            return;
        }
        if failed {
            let el = target.element;
            let max = max_scroll_top(&self.dom, el);
            self.park_at_end(el, max);
        } else {
            self.state.phase = DriftPhase::Running;
            self.request_frame();
        }
    }

    // -----------------------------------------------------------------------
    // Theme
    // -----------------------------------------------------------------------

    /// The choice in force before the lock is kept under its own key, so a
    /// reload with the classic theme saved still restores it on leave.
    fn enter_classic_theme(&mut self) {
        if !self.theme.active {
            let previous = self.stored_remembered().unwrap_or_else(|| self.preference_enabled());
            self.remember_preference(previous);
            self.theme.active = true;
            tracing::info!(theme = %self.config.classic_theme, "classic theme active, auto-scroll off");
        }
        self.write_preference(false);
        self.stop(StopReason::Theme);
        self.cancel_readiness();
        self.remove_clones();
    }

    fn leave_classic_theme(&mut self) {
        if !self.theme.active {
            return;
        }
        self.theme.active = false;
        if let Some(previous) = self.theme.remembered.take() {
            self.write_preference(previous);
        }
        if let Err(err) = self.prefs.remove(REMEMBERED_PREF_KEY) {
            tracing::warn!("could not clear remembered auto-scroll preference: {err}");
        }
        tracing::info!("classic theme left, preference restored");
    }

    fn remember_preference(&mut self, enabled: bool) {
        self.theme.remembered = Some(enabled);
        if let Err(err) = self.prefs.set(REMEMBERED_PREF_KEY, ScrollPreference(enabled).as_str()) {
            tracing::warn!("could not persist remembered auto-scroll preference: {err}");
        }
    }

    fn stored_remembered(&self) -> Option<bool> {
        let raw = self.prefs.get(REMEMBERED_PREF_KEY).ok()??;
        ScrollPreference::parse(&raw).ok().map(|pref| pref.0)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn ensure_target(&mut self) -> Result<ScrollTarget, ScrollError> {
        if let Some(target) = &self.target {
            return Ok(target.clone());
        }
        let target = resolve_target(&self.dom, &self.config.selectors)?;
        self.target = Some(target.clone());
        Ok(target)
    }

    fn preference_enabled(&self) -> bool {
        match ScrollPreference::load(&self.prefs) {
            Ok(Some(pref)) => pref.0,
            Ok(None) => self.config.enabled_by_default,
            Err(err) => {
                tracing::warn!("using default auto-scroll preference: {err}");
                self.config.enabled_by_default
            }
        }
    }

    fn write_preference(&mut self, enabled: bool) {
        if let Err(err) = ScrollPreference(enabled).save(&mut self.prefs) {
            tracing::warn!("auto-scroll preference not persisted: {err}");
        }
        self.events.push(EngineEvent::PreferenceChanged(enabled));
    }
}

impl<D: GuideDom, P: PreferenceStore> AutoScrollEngine<D, TimerQueue<ManualClock>, P> {
    /// Move the manual clock forward by `by`, running every task that comes
    /// due on the way in deadline order.
    pub fn advance(&mut self, by: Duration) {
        let end = self.scheduler.now() + by;
        while let Some(next) = self.scheduler.next_deadline()
            && next <= end
        {
            self.scheduler.clock().set(next);
            self.run_due();
        }
        self.scheduler.clock().set(end);
        self.run_due();
    }
}
