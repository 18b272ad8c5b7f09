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

//! The drifting channel grid.
//!
//! Rows are drawn from the document, clones included, at line granularity:
//! a row's first screen line is its offset from the scroll position divided
//! by [`PX_PER_LINE`]. Clones render exactly like their sources so the wrap
//! is invisible.

use super::theme::{self, Palette};
use crate::app::App;
use crate::app::guide::{CHANNEL_NAME_CLASS, PROGRAM_CLASS, PX_PER_LINE, ROW_LINES, lines_to_px};
use crate::scroll::looping::{CLONE_CLASS, all_rows};
use crate::scroll::{GuideDom, NodeId};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const CHANNEL_COL_WIDTH: usize = 12;
pub const TIME_SLOTS: &[&str] = &["8:00 PM", "8:30 PM", "9:00 PM"];

/// Rows overlapping a viewport of `lines` lines, with the screen line each
/// one starts on (negative when it begins above the viewport).
pub fn visible_rows<D: GuideDom + ?Sized>(dom: &D, outer: NodeId, lines: u16) -> Vec<(NodeId, i32)> {
    let top = dom.scroll_top(outer);
    let bottom = top + lines_to_px(lines);
    all_rows(dom, outer)
        .into_iter()
        .filter_map(|row| {
            let y = dom.offset_top(row);
            let h = dom.offset_height(row);
            (y + h > top && y < bottom).then(|| (row, ((y - top) / PX_PER_LINE).floor() as i32))
        })
        .collect()
}

/// Row drawn on screen line `line` of the grid.
pub fn row_at_line<D: GuideDom + ?Sized>(dom: &D, outer: NodeId, line: u16) -> Option<NodeId> {
    let line = i32::from(line);
    visible_rows(dom, outer, u16::try_from(line + 1).unwrap_or(u16::MAX))
        .into_iter()
        .find(|&(_, first)| first <= line && line < first + i32::from(ROW_LINES))
        .map(|(row, _)| row)
}

fn cell_texts<D: GuideDom + ?Sized>(dom: &D, row: NodeId) -> (String, Vec<String>) {
    let channel = dom
        .query(Some(row), &format!(".{CHANNEL_NAME_CLASS}"))
        .first()
        .map(|&cell| dom.text(cell))
        .unwrap_or_default();
    let programs = dom
        .query(Some(row), &format!(".{PROGRAM_CLASS}"))
        .into_iter()
        .map(|cell| dom.text(cell))
        .collect();
    (channel, programs)
}

/// Truncate to `width` columns with a trailing ellipsis, then pad.
pub fn fit_cell(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let text = text.trim();
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        return format!("{text}{}", " ".repeat(width - text_width));
    }
    let mut fitted = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        fitted.push(ch);
        used += ch_width;
    }
    fitted.push('…');
    used += 1;
    fitted.push_str(&" ".repeat(width.saturating_sub(used)));
    fitted
}

fn program_cells(width: usize, programs: &[String], palette: Palette) -> Vec<Span<'static>> {
    let slot_width = width / TIME_SLOTS.len();
    let mut spans = Vec::with_capacity(TIME_SLOTS.len() * 2);
    for slot in 0..TIME_SLOTS.len() {
        let title = programs.get(slot).map_or("", String::as_str);
        spans.push(Span::styled(theme::CELL_SEPARATOR, Style::default().fg(palette.grid_line)));
        spans.push(Span::styled(
            format!(" {}", fit_cell(title, slot_width.saturating_sub(2))),
            Style::default().fg(palette.program_fg),
        ));
    }
    spans
}

fn row_line(app: &App, row: NodeId, width: usize, palette: Palette) -> Line<'static> {
    let dom = app.engine.dom();
    let (channel, programs) = cell_texts(dom, row);
    let mut channel_cell = fit_cell(&format!(" {channel}"), CHANNEL_COL_WIDTH);
    if app.show_debug && dom.has_class(row, CLONE_CLASS) {
        channel_cell = fit_cell(&format!(" {channel}"), CHANNEL_COL_WIDTH - 1);
        channel_cell.push('↺');
    }
    let mut spans = vec![Span::styled(
        channel_cell,
        Style::default().fg(palette.channel_fg).bg(palette.channel_bg).add_modifier(Modifier::BOLD),
    )];
    spans.extend(program_cells(width.saturating_sub(CHANNEL_COL_WIDTH), &programs, palette));
    Line::from(spans)
}

fn separator_line(width: usize, palette: Palette) -> Line<'static> {
    Line::from(Span::styled(theme::SEPARATOR_CHAR.repeat(width), Style::default().fg(palette.grid_line)))
}

pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }
    let palette = theme::palette(&app.theme);
    let width = usize::from(area.width);
    let slot_width = width.saturating_sub(CHANNEL_COL_WIDTH) / TIME_SLOTS.len();
    let mut spans = vec![Span::styled(
        fit_cell(" CH", CHANNEL_COL_WIDTH),
        Style::default().fg(palette.header_fg).add_modifier(Modifier::BOLD),
    )];
    for slot in TIME_SLOTS {
        spans.push(Span::styled(theme::CELL_SEPARATOR, Style::default().fg(palette.grid_line)));
        spans.push(Span::styled(
            format!(" {}", fit_cell(slot, slot_width.saturating_sub(2))),
            Style::default().fg(palette.header_fg),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.background)),
        area,
    );
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let palette = theme::palette(&app.theme);
    let width = usize::from(area.width);
    let height = i32::from(area.height);
    let mut lines = vec![Line::default(); usize::from(area.height)];

    for (row, first) in visible_rows(app.engine.dom(), app.outer, area.height) {
        for k in 0..i32::from(ROW_LINES) {
            let Ok(idx) = usize::try_from(first + k) else {
                continue;
            };
            if first + k >= height {
                break;
            }
            lines[idx] = if k == 0 {
                row_line(app, row, width, palette)
            } else {
                separator_line(width, palette)
            };
        }
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(palette.background)),
        area,
    );
}
