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

use super::dom::{GuideDom, NodeId};
use crate::error::ScrollError;
use serde::Serialize;

/// Marks a target whose rows were already cloned.
pub const CLONED_ATTR: &str = "data-auto-scroll-cloned";
/// Height of the prepended clone block, the wrap-reset offset.
pub const PREPENDED_ATTR: &str = "data-auto-scroll-prepended";

/// The element being auto-scrolled. Shared with whatever renders its rows;
/// the clone bookkeeping lives on the element itself so it survives
/// re-resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollTarget {
    pub element: NodeId,
    /// Selector that matched, for diagnostics.
    pub selector: String,
}

impl ScrollTarget {
    pub fn is_cloned<D: GuideDom + ?Sized>(&self, dom: &D) -> bool {
        dom.attribute(self.element, CLONED_ATTR).is_some()
    }

    /// Recorded wrap offset, `None` before cloning or when the attribute is unreadable.
    pub fn prepended_height<D: GuideDom + ?Sized>(&self, dom: &D) -> Option<f64> {
        dom.attribute(self.element, PREPENDED_ATTR)?.parse::<f64>().ok().filter(|h| h.is_finite())
    }

    pub fn record_clones<D: GuideDom + ?Sized>(&self, dom: &mut D, prepended_height: f64) {
        dom.set_attribute(self.element, CLONED_ATTR, "1");
        dom.set_attribute(self.element, PREPENDED_ATTR, &format!("{prepended_height}"));
    }

    pub fn clear_clones<D: GuideDom + ?Sized>(&self, dom: &mut D) {
        dom.remove_attribute(self.element, CLONED_ATTR);
        dom.remove_attribute(self.element, PREPENDED_ATTR);
    }

    pub fn overflow<D: GuideDom + ?Sized>(&self, dom: &D) -> f64 {
        dom.scroll_height(self.element) - dom.client_height(self.element)
    }
}

/// Pick the most scrollable element among everything the selectors match.
///
/// Candidates are gathered across the whole priority list and deduplicated.
/// The largest `scroll_height - client_height` wins; on a tie the earlier
/// selector (more specific) keeps its place.
pub fn resolve_target<D: GuideDom + ?Sized>(
    dom: &D,
    selectors: &[String],
) -> Result<ScrollTarget, ScrollError> {
    let mut seen = Vec::new();
    let mut best: Option<(ScrollTarget, f64)> = None;
    for selector in selectors {
        for element in dom.query(None, selector) {
            if seen.contains(&element) {
                continue;
            }
            seen.push(element);
            let delta = dom.scroll_height(element) - dom.client_height(element);
            if delta <= 0.0 {
                continue;
            }
            if best.as_ref().is_none_or(|(_, d)| delta > *d) {
                best = Some((ScrollTarget { element, selector: selector.clone() }, delta));
            }
        }
    }
    tracing::debug!(
        candidates = seen.len(),
        picked = ?best.as_ref().map(|(t, d)| (t.element, *d)),
        "resolved scroll target"
    );
    best.map(|(target, _)| target)
        .ok_or_else(|| ScrollError::NoScrollTarget { selectors: selectors.to_vec() })
}
