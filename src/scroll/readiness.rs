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

//! Content-readiness gate.
//!
//! Guide rows are filled in asynchronously after the container exists.
//! Cloning placeholder rows would bake empty clones into the loop, so
//! cloning waits (bounded) until one of the leading rows shows real text.

use super::dom::{GuideDom, NodeId};
use super::looping::original_rows;
use super::target::ScrollTarget;
use serde::Serialize;
use std::time::Duration;

pub const CHANNEL_NAME_CLASSES: &[&str] = &["chan-name", "channel-name"];
pub const PROGRAM_CELL_CLASSES: &[&str] =
    &["program-title", "prog-title", "grid-program", "program-cell", "program"];

const PLACEHOLDERS: &[&str] = &["…", "...", "loading", "loading…", "loading..."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    Ready,
    Pending,
    /// Deadline passed without content; callers clone anyway.
    TimedOut,
}

fn is_meaningful(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Whether a row carries a channel name or a program cell with real text.
pub fn row_has_content<D: GuideDom + ?Sized>(dom: &D, row: NodeId) -> bool {
    CHANNEL_NAME_CLASSES.iter().chain(PROGRAM_CELL_CLASSES).any(|class| {
        let selector = format!(".{class}");
        let own = dom.has_class(row, class) && is_meaningful(&dom.text(row));
        own || dom.query(Some(row), &selector).into_iter().any(|cell| is_meaningful(&dom.text(cell)))
    })
}

/// Bounded wait started at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessGate {
    started_at: Duration,
    timeout: Duration,
}

impl ReadinessGate {
    #[must_use]
    pub fn new(now: Duration, timeout: Duration) -> Self {
        Self { started_at: now, timeout }
    }

    pub fn poll<D: GuideDom + ?Sized>(
        &self,
        dom: &D,
        target: &ScrollTarget,
        candidates: usize,
        now: Duration,
    ) -> Readiness {
        let rows = original_rows(dom, target.element);
        if rows.iter().take(candidates.max(1)).any(|&row| row_has_content(dom, row)) {
            return Readiness::Ready;
        }
        if now.saturating_sub(self.started_at) >= self.timeout {
            Readiness::TimedOut
        } else {
            Readiness::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::memory_dom::{Element, MemoryDom};

    fn empty_guide(rows: usize) -> (MemoryDom, ScrollTarget, Vec<NodeId>) {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let outer = dom.append(body, Element::new().id("guideOuter").viewport(100.0));
        let mut names = Vec::new();
        for _ in 0..rows {
            let row = dom.append(outer, Element::new().class("guide-row").height(40.0));
            names.push(dom.append(row, Element::new().class("chan-name").text("Loading…")));
        }
        (dom, ScrollTarget { element: outer, selector: "#guideOuter".to_owned() }, names)
    }

    #[test]
    fn placeholder_text_is_not_content() {
        let (dom, target, _) = empty_guide(3);
        let gate = ReadinessGate::new(Duration::ZERO, Duration::from_secs(2));
        assert_eq!(gate.poll(&dom, &target, 5, Duration::from_millis(100)), Readiness::Pending);
    }

    #[test]
    fn channel_name_makes_row_ready() {
        let (mut dom, target, names) = empty_guide(3);
        dom.set_text(names[1], "KXTV 10");
        let gate = ReadinessGate::new(Duration::ZERO, Duration::from_secs(2));
        assert_eq!(gate.poll(&dom, &target, 5, Duration::ZERO), Readiness::Ready);
    }

    #[test]
    fn program_cell_counts_as_content() {
        let (mut dom, target, _) = empty_guide(2);
        let rows = original_rows(&dom, target.element);
        dom.append(rows[0], Element::new().class("program-title").text("Evening News"));
        assert!(row_has_content(&dom, rows[0]));
        assert!(!row_has_content(&dom, rows[1]));
    }

    #[test]
    fn content_beyond_candidate_window_is_ignored() {
        let (mut dom, target, names) = empty_guide(8);
        dom.set_text(names[7], "Late Channel");
        let gate = ReadinessGate::new(Duration::ZERO, Duration::from_secs(2));
        assert_eq!(gate.poll(&dom, &target, 5, Duration::ZERO), Readiness::Pending);
    }

    #[test]
    fn times_out_after_deadline() {
        let (dom, target, _) = empty_guide(3);
        let gate = ReadinessGate::new(Duration::from_secs(1), Duration::from_secs(2));
        assert_eq!(gate.poll(&dom, &target, 5, Duration::from_secs(3)), Readiness::TimedOut);
    }
}
