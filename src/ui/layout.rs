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

use ratatui::layout::{Constraint, Layout, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiAreas {
    pub screen: Rect,
    /// Time-slot header above the grid (zero-height on tiny screens).
    pub header: Rect,
    pub header_sep: Rect,
    /// The scrolling guide grid; its height is the engine's viewport.
    pub guide: Rect,
    pub debug: Option<Rect>,
    pub footer: Rect,
}

pub fn compute(area: Rect, show_debug: bool) -> UiAreas {
    let zero = Rect::new(area.x, area.y, area.width, 0);
    let debug_height = u16::from(show_debug);

    if area.height < 6 {
        // Ultra-compact: grid and footer only
        let [guide, footer] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        return UiAreas { screen: area, header: zero, header_sep: zero, guide, debug: None, footer };
    }

    let [header, header_sep, guide, debug, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(2),
        Constraint::Length(debug_height),
        Constraint::Length(1),
    ])
    .areas(area);
    UiAreas {
        screen: area,
        header,
        header_sep,
        guide,
        debug: show_debug.then_some(debug),
        footer,
    }
}
