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

use super::App;
use super::guide::PX_PER_LINE;
use crate::scroll::{
    EngineEvent, GuideDom as _, InteractionEvent, InteractionKind, NodeId, StopReason,
};
use crate::ui::theme;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

const SPEED_STEP: f64 = 0.2;
/// Lines moved per wheel notch when the user scrolls the grid by hand.
const WHEEL_LINES: f64 = 3.0;

pub fn handle_terminal_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Mouse(mouse) => handle_mouse(app, mouse),
        Event::FocusLost => set_hidden(app, true),
        Event::FocusGained => set_hidden(app, false),
        Event::Resize(width, height) => app.sync_viewport(Rect::new(0, 0, width, height)),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q') | KeyCode::Esc, _) => {
            app.should_quit = true;
        }
        (KeyCode::Char(' '), _) => {
            app.engine.toggle();
        }
        (KeyCode::Char('+' | '='), _) => {
            let speed = app.engine.state().speed + SPEED_STEP;
            app.engine.set_speed(speed);
        }
        (KeyCode::Char('-'), _) => {
            let speed = app.engine.state().speed - SPEED_STEP;
            if !app.engine.set_speed(speed) {
                app.notice = Some("speed already at minimum".to_owned());
            }
        }
        (KeyCode::Char('l'), _) => {
            let loop_mode = !app.engine.state().loop_mode;
            app.engine.set_loop_mode(loop_mode);
            app.notice = Some(format!("loop mode {}", on_off(loop_mode)));
        }
        (KeyCode::Char('c'), _) => {
            if !app.engine.clone_now() {
                app.notice = Some("nothing to clone".to_owned());
            }
        }
        (KeyCode::Char('x'), _) => {
            app.engine.remove_clones();
        }
        (KeyCode::Char('r'), _) => {
            app.engine.recompute();
            app.notice = Some("scroll target re-resolves on next start".to_owned());
        }
        (KeyCode::Char('t'), _) => {
            let next = theme::next_theme(&app.theme);
            app.apply_theme(next);
        }
        (KeyCode::Char('d'), _) => {
            app.show_debug = !app.show_debug;
            let screen = app.areas.screen;
            app.sync_viewport(screen);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let kind = match mouse.kind {
        MouseEventKind::Down(_) => InteractionKind::PointerDown,
        MouseEventKind::Up(_) => InteractionKind::Click,
        MouseEventKind::Moved | MouseEventKind::Drag(_) => InteractionKind::PointerMove,
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => InteractionKind::PointerDown,
        _ => return,
    };
    let target = node_at(app, Position::new(mouse.column, mouse.row));
    app.engine.on_interaction(InteractionEvent::new(kind, target));

    let delta = match mouse.kind {
        MouseEventKind::ScrollUp => -WHEEL_LINES * PX_PER_LINE,
        MouseEventKind::ScrollDown => WHEEL_LINES * PX_PER_LINE,
        _ => return,
    };
    if target != app.engine.dom().body() {
        let outer = app.outer;
        let top = app.engine.dom().scroll_top(outer);
        app.engine.dom_mut().set_scroll_top(outer, top + delta);
    }
}

/// Document node under a screen cell: the guide row when there is one, the
/// guide container for its empty space, the body everywhere else.
fn node_at(app: &App, pos: Position) -> NodeId {
    let area = app.areas.guide;
    if !area.contains(pos) {
        return app.engine.dom().body();
    }
    crate::ui::guide::row_at_line(app.engine.dom(), app.outer, pos.y - area.y).unwrap_or(app.outer)
}

fn set_hidden(app: &mut App, hidden: bool) {
    app.engine.dom_mut().set_hidden(hidden);
    app.engine.on_visibility_change();
}

/// Move engine notifications into the footer and the log.
pub(super) fn drain_engine_events(app: &mut App) {
    for event in app.engine.drain_events() {
        tracing::trace!(?event, "engine event");
        if let Some(text) = describe_event(&event) {
            app.notice = Some(text);
        }
    }
}

/// Footer text for an engine notification; frequent ones are skipped.
#[must_use]
pub fn describe_event(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::Started => Some("drifting".to_owned()),
        EngineEvent::Stopped(StopReason::UserInteraction) => {
            Some("paused, resumes when idle".to_owned())
        }
        EngineEvent::Stopped(reason) => Some(format!("stopped: {reason}")),
        EngineEvent::Cloned(outcome) => {
            Some(format!("looping with {} rows per side", outcome.clones_per_side))
        }
        EngineEvent::ClonesRemoved(count) => Some(format!("removed {count} loop rows")),
        EngineEvent::PreferenceChanged(enabled) => {
            Some(format!("auto-scroll {}", on_off(*enabled)))
        }
        EngineEvent::Wrapped { .. } | EngineEvent::WatchdogNudge { .. } => None,
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
