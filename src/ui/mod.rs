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

pub mod guide;
pub mod layout;
pub mod theme;

use crate::app::App;
use crate::scroll::{DebugSnapshot, DriftPhase, ScrollStatus};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

const FOOTER_PAD: u16 = 1;
const FOOTER_HINT: &str = "space on/off  +/- speed  l loop  t theme  d debug  q quit";

pub fn render(frame: &mut Frame, app: &mut App) {
    let screen = frame.area();
    if screen != app.areas.screen {
        app.sync_viewport(screen);
    }
    let areas = app.areas;

    guide::render_header(frame, areas.header, app);
    if areas.header_sep.height > 0 {
        render_separator(frame, areas.header_sep, app);
    }
    guide::render(frame, areas.guide, app);
    if let Some(debug_area) = areas.debug {
        let line = debug_line(&app.engine.debug());
        frame.render_widget(Paragraph::new(line).style(Style::default().fg(theme::DIM)), debug_area);
    }
    render_footer(frame, areas.footer, app);
}

fn render_separator(frame: &mut Frame, area: Rect, app: &App) {
    let palette = theme::palette(&app.theme);
    let line = theme::SEPARATOR_CHAR.repeat(usize::from(area.width));
    frame.render_widget(
        Paragraph::new(Span::styled(line, Style::default().fg(palette.grid_line)))
            .style(Style::default().bg(palette.background)),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let padded = Rect {
        x: area.x + FOOTER_PAD,
        y: area.y,
        width: area.width.saturating_sub(FOOTER_PAD * 2),
        height: area.height,
    };
    let palette = theme::palette(&app.theme);
    let status = app.engine.status();
    let (icon, color) = status_icon(&status, palette.accent);

    let mut left = vec![
        Span::styled(icon, Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(status_label(&status), Style::default().fg(color)),
        Span::styled(
            format!("  {:.1}px/f  loop {}", status.speed, if status.loop_mode { "on" } else { "off" }),
            Style::default().fg(theme::DIM),
        ),
    ];
    if let Some(notice) = &app.notice {
        left.push(Span::styled(format!("  {notice}"), Style::default().fg(Color::White)));
    }
    let left_line = Line::from(left);
    let left_width = left_line.width();

    frame.render_widget(Paragraph::new(left_line), padded);
    let hint_room = usize::from(padded.width).saturating_sub(left_width + 2);
    if UnicodeWidthStr::width(FOOTER_HINT) <= hint_room {
        frame.render_widget(
            Paragraph::new(Span::styled(FOOTER_HINT, Style::default().fg(theme::DIM)))
                .alignment(Alignment::Right),
            padded,
        );
    }
}

fn status_icon(status: &ScrollStatus, accent: Color) -> (&'static str, Color) {
    if status.theme_locked {
        (theme::ICON_LOCKED, Color::Yellow)
    } else if status.scrolling {
        (theme::ICON_DRIFTING, accent)
    } else {
        (theme::ICON_PAUSED, theme::DIM)
    }
}

fn status_label(status: &ScrollStatus) -> String {
    if status.theme_locked {
        return "classic theme".to_owned();
    }
    if !status.enabled {
        return "auto-scroll off".to_owned();
    }
    match status.phase {
        DriftPhase::Running | DriftPhase::SettlingAfterWrap => "drifting".to_owned(),
        DriftPhase::AwaitingClones => "waiting for rows".to_owned(),
        DriftPhase::Idle => match status.last_stop_reason {
            Some(reason) => format!("idle ({reason})"),
            None => "idle".to_owned(),
        },
    }
}

fn debug_line(snapshot: &DebugSnapshot) -> String {
    let fmt_px = |v: Option<f64>| v.map_or_else(|| "-".to_owned(), |v| format!("{v:.0}"));
    format!(
        "{:?} top={} height={} prepended={} clones={} wraps={} nudges={} idle={}ms",
        snapshot.status.phase,
        fmt_px(snapshot.scroll_top),
        fmt_px(snapshot.scroll_height),
        fmt_px(snapshot.prepended_height),
        snapshot.clone_count,
        snapshot.wraps,
        snapshot.watchdog_nudges,
        snapshot.idle_for_ms,
    )
}
