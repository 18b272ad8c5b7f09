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

use ratatui::style::Color;

pub const DEFAULT_THEME: &str = "default";
pub const CLASSIC_THEME: &str = "tvguide1990";
/// Cycle order for the theme key.
pub const THEMES: &[&str] = &[DEFAULT_THEME, CLASSIC_THEME, "midnight"];

pub const DIM: Color = Color::DarkGray;
pub const SEPARATOR_CHAR: &str = "─";
pub const CELL_SEPARATOR: &str = "│";

pub const ICON_DRIFTING: &str = "▼";
pub const ICON_PAUSED: &str = "■";
pub const ICON_LOCKED: &str = "⊘";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub channel_fg: Color,
    pub channel_bg: Color,
    pub program_fg: Color,
    pub grid_line: Color,
    pub header_fg: Color,
    pub accent: Color,
}

const DEFAULT_PALETTE: Palette = Palette {
    background: Color::Reset,
    channel_fg: Color::White,
    channel_bg: Color::Rgb(40, 44, 52),
    program_fg: Color::Gray,
    grid_line: DIM,
    header_fg: Color::Cyan,
    accent: Color::Rgb(244, 118, 0),
};

/// Blue grid with yellow channel tiles, like the early-90s cable guide.
const CLASSIC_PALETTE: Palette = Palette {
    background: Color::Rgb(0, 0, 150),
    channel_fg: Color::Rgb(255, 255, 85),
    channel_bg: Color::Rgb(0, 0, 110),
    program_fg: Color::White,
    grid_line: Color::Rgb(85, 85, 255),
    header_fg: Color::Rgb(255, 255, 85),
    accent: Color::Rgb(255, 255, 85),
};

const MIDNIGHT_PALETTE: Palette = Palette {
    background: Color::Rgb(10, 10, 24),
    channel_fg: Color::Rgb(180, 200, 255),
    channel_bg: Color::Rgb(24, 24, 48),
    program_fg: Color::Rgb(160, 160, 190),
    grid_line: Color::Rgb(50, 50, 80),
    header_fg: Color::Magenta,
    accent: Color::Magenta,
};

#[must_use]
pub fn palette(theme: &str) -> Palette {
    match theme {
        CLASSIC_THEME => CLASSIC_PALETTE,
        "midnight" => MIDNIGHT_PALETTE,
        _ => DEFAULT_PALETTE,
    }
}

/// Theme after `current` in [`THEMES`]; unknown names restart the cycle.
#[must_use]
pub fn next_theme(current: &str) -> &'static str {
    let next = THEMES.iter().position(|t| *t == current).map_or(0, |i| (i + 1) % THEMES.len());
    THEMES[next]
}
