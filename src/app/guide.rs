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

//! Guide listings and the document built from them.
//!
//! The terminal host lays the grid out in "pixels" so the engine sees the
//! same geometry a browser page would: one terminal line is
//! [`PX_PER_LINE`] pixels and every channel row spans [`ROW_LINES`] lines.

use crate::error::AppError;
use crate::scroll::looping::{CHANNEL_MARKER_CLASS, ROW_WRAPPER_CLASS};
use crate::scroll::{Element, MemoryDom, NodeId};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PX_PER_LINE: f64 = 16.0;
pub const ROW_LINES: u16 = 2;
pub const ROW_HEIGHT_PX: f64 = PX_PER_LINE * ROW_LINES as f64;

pub const GUIDE_OUTER_ID: &str = "guideOuter";
pub const GUIDE_OUTER_CLASS: &str = "guide-outer";
pub const CHANNEL_NAME_CLASS: &str = "chan-name";
pub const PROGRAM_CLASS: &str = "program-title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub programs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideListing {
    pub channels: Vec<Channel>,
}

impl GuideListing {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read guide {}: {e}", path.display()))?;
        Self::from_json(&content).map_err(|e| {
            tracing::error!("invalid guide listing {}: {e}", path.display());
            anyhow::Error::new(AppError::GuideInvalid)
        })
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let listing: Self = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if listing.channels.is_empty() {
            return Err("guide listing has no channels".to_owned());
        }
        Ok(listing)
    }

    /// Built-in lineup for running without a listing file.
    #[must_use]
    pub fn demo() -> Self {
        const LINEUP: &[(&str, &str)] = &[
            ("2", "KTVU"),
            ("3", "WGN"),
            ("4", "KRON"),
            ("5", "KPIX"),
            ("7", "KGO"),
            ("9", "KQED"),
            ("11", "KNTV"),
            ("13", "TBS"),
            ("20", "KOFY"),
            ("24", "ESPN"),
            ("25", "CNN"),
            ("26", "MTV"),
            ("27", "NICK"),
            ("28", "DISC"),
            ("29", "A&E"),
            ("30", "USA"),
            ("31", "TNT"),
            ("32", "WTHR"),
            ("33", "HBO"),
            ("34", "SHOW"),
            ("35", "PREV"),
            ("36", "QVC"),
        ];
        const SHOWS: &[&str] = &[
            "Evening News",
            "Wheel of Fortune",
            "Movie: Back to the Future",
            "Sports Center",
            "Nature Hour",
            "Cartoon Block",
            "Weather Now",
            "Late Show",
            "Music Videos",
            "Game Show Marathon",
            "Home Shopping",
            "Documentary",
        ];
        let channels = LINEUP
            .iter()
            .enumerate()
            .map(|(i, (number, name))| Channel {
                number: (*number).to_owned(),
                name: (*name).to_owned(),
                programs: (0..3).map(|slot| SHOWS[(i * 5 + slot * 7) % SHOWS.len()].to_owned()).collect(),
            })
            .collect();
        Self { channels }
    }
}

/// A guide grid as a document: `body > #guideOuter.guide-outer > .guide-row*`.
#[derive(Debug)]
pub struct GuideDocument {
    pub dom: MemoryDom,
    pub outer: NodeId,
}

impl GuideDocument {
    #[must_use]
    pub fn build(listing: &GuideListing, viewport_lines: u16) -> Self {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let outer = dom.append(
            body,
            Element::new()
                .id(GUIDE_OUTER_ID)
                .class(GUIDE_OUTER_CLASS)
                .viewport(lines_to_px(viewport_lines)),
        );
        for channel in &listing.channels {
            let row = dom.append(outer, Element::new().class(ROW_WRAPPER_CLASS).height(ROW_HEIGHT_PX));
            let col = dom.append(row, Element::new().class(CHANNEL_MARKER_CLASS));
            dom.append(
                col,
                Element::new()
                    .class(CHANNEL_NAME_CLASS)
                    .text(&format!("{} {}", channel.number, channel.name)),
            );
            for program in &channel.programs {
                dom.append(row, Element::new().class(PROGRAM_CLASS).text(program));
            }
        }
        tracing::debug!(channels = listing.channels.len(), viewport_lines, "built guide document");
        Self { dom, outer }
    }
}

#[must_use]
pub fn lines_to_px(lines: u16) -> f64 {
    f64::from(lines) * PX_PER_LINE
}
