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

use super::guide::{GuideDocument, GuideListing, lines_to_px};
use crate::config::EngineConfig;
use crate::error::ScrollError;
use crate::scroll::prefs::THEME_PREF_KEY;
use crate::scroll::{
    AutoScrollEngine, JsonFileStore, MemoryDom, MemoryStore, NodeId, PreferenceStore,
    Scheduler as _, SystemClock, TimerQueue,
};
use crate::ui::layout::{self, UiAreas};
use ratatui::layout::Rect;
use std::time::Duration;

/// Preference backing chosen at startup.
#[derive(Debug)]
pub enum HostPrefs {
    File(JsonFileStore),
    /// No config directory on this platform; choices last for the session.
    Memory(MemoryStore),
}

impl PreferenceStore for HostPrefs {
    fn get(&self, key: &str) -> Result<Option<String>, ScrollError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScrollError> {
        match self {
            Self::File(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), ScrollError> {
        match self {
            Self::File(store) => store.remove(key),
            Self::Memory(store) => store.remove(key),
        }
    }
}

pub type HostEngine = AutoScrollEngine<MemoryDom, TimerQueue<SystemClock>, HostPrefs>;

pub struct App {
    pub engine: HostEngine,
    /// The `#guideOuter` container.
    pub outer: NodeId,
    pub theme: String,
    pub show_debug: bool,
    pub should_quit: bool,
    /// Latest engine notification, shown in the footer.
    pub notice: Option<String>,
    pub areas: UiAreas,
}

impl App {
    #[must_use]
    pub fn new(listing: &GuideListing, prefs: HostPrefs, config: EngineConfig, screen: Rect) -> Self {
        let areas = layout::compute(screen, false);
        let GuideDocument { dom, outer } = GuideDocument::build(listing, areas.guide.height);
        let queue = TimerQueue::new(SystemClock::new(), config.frame_interval());
        let theme = match prefs.get(THEME_PREF_KEY) {
            Ok(Some(theme)) => theme,
            Ok(None) => crate::ui::theme::DEFAULT_THEME.to_owned(),
            Err(err) => {
                tracing::warn!("saved theme unreadable: {err}");
                crate::ui::theme::DEFAULT_THEME.to_owned()
            }
        };
        let mut engine = AutoScrollEngine::new(dom, queue, prefs, config);
        engine.dom_mut().set_body_classes(&theme);
        Self {
            engine,
            outer,
            theme,
            show_debug: false,
            should_quit: false,
            notice: None,
            areas,
        }
    }

    /// Re-layout for a new screen size and tell the engine when the guide
    /// viewport changed.
    pub fn sync_viewport(&mut self, screen: Rect) {
        let areas = layout::compute(screen, self.show_debug);
        let changed = areas.guide.height != self.areas.guide.height;
        self.areas = areas;
        if !changed {
            return;
        }
        let outer = self.outer;
        let viewport = lines_to_px(self.areas.guide.height);
        self.engine.dom_mut().set_viewport(outer, viewport);
        tracing::debug!(viewport, "guide viewport resized");
        self.engine.on_resize();
    }

    /// Switch the active theme the way the page's theming layer does: update
    /// the body class, persist the choice, then announce it.
    pub fn apply_theme(&mut self, theme: &str) {
        theme.clone_into(&mut self.theme);
        self.engine.dom_mut().set_body_classes(theme);
        if let Err(err) = self.engine.prefs_mut().set(THEME_PREF_KEY, theme) {
            tracing::warn!("theme not persisted: {err}");
        }
        self.engine.on_theme_applied(theme);
    }

    /// Time until the engine's next scheduled task, if any.
    #[must_use]
    pub fn time_to_next_task(&self) -> Option<Duration> {
        let scheduler = self.engine.scheduler();
        scheduler.next_deadline().map(|at| at.saturating_sub(scheduler.now()))
    }
}
