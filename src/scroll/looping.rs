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

//! Seamless-loop row cloning.
//!
//! One screen of rows (plus a margin row) is cloned on each side of the
//! originals: the tail goes above the first row, the head goes below the
//! last. Wrapping then becomes a jump back to the end of the prepended block,
//! which shows the same content that was on screen at the bottom.

use super::dom::{GuideDom, InsertPosition, NodeId};
use super::target::ScrollTarget;
use crate::error::ScrollError;
use serde::Serialize;

pub const ROW_WRAPPER_CLASS: &str = "guide-row";
pub const CHANNEL_MARKER_CLASS: &str = "chan-col";
pub const CLONE_CLASS: &str = "__auto_scroll_clone";
pub const CLONE_OF_ATTR: &str = "data-clone-of";

/// Result of a successful cloning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloneOutcome {
    pub clones_per_side: usize,
    pub row_height: f64,
    pub prepended_height: f64,
    /// Scroll offset written after the prepend.
    pub scroll_top: f64,
}

/// Every row under `container`, clones included, in document order.
pub fn all_rows<D: GuideDom + ?Sized>(dom: &D, container: NodeId) -> Vec<NodeId> {
    let wrapped = dom.query(Some(container), &format!(".{ROW_WRAPPER_CLASS}"));
    if wrapped.is_empty() {
        dom.query(Some(container), &format!(".{CHANNEL_MARKER_CLASS}"))
    } else {
        wrapped
    }
}

/// Rows that are not clones.
pub fn original_rows<D: GuideDom + ?Sized>(dom: &D, container: NodeId) -> Vec<NodeId> {
    let mut rows = all_rows(dom, container);
    rows.retain(|&row| !dom.has_class(row, CLONE_CLASS));
    rows
}

pub fn clone_rows<D: GuideDom + ?Sized>(dom: &D, container: NodeId) -> Vec<NodeId> {
    dom.query(Some(container), &format!(".{CLONE_CLASS}"))
}

/// Rows needed to cover one viewport plus a margin row, bounded by the
/// number of rows available.
#[must_use]
pub fn clones_per_side(row_count: usize, row_height: f64, viewport: f64) -> usize {
    if row_count == 0 || row_height <= 0.0 {
        return 0;
    }
    let visible = (viewport.max(0.0) / row_height).ceil() as usize;
    (visible + 1).min(row_count)
}

/// Height of the first row, or `fallback` when it cannot be measured.
pub fn measure_row_height<D: GuideDom + ?Sized>(dom: &D, rows: &[NodeId], fallback: f64) -> f64 {
    rows.first()
        .map(|&row| dom.offset_height(row))
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or(fallback)
}

fn mark_clone<D: GuideDom + ?Sized>(dom: &mut D, clone: NodeId, source: NodeId) {
    dom.add_class(clone, CLONE_CLASS);
    dom.set_attribute(clone, "aria-hidden", "true");
    dom.set_attribute(clone, "tabindex", "-1");
    dom.set_attribute(clone, CLONE_OF_ATTR, &source.0.to_string());
}

/// The row a clone was copied from.
pub fn source_of<D: GuideDom + ?Sized>(dom: &D, clone: NodeId) -> Option<NodeId> {
    dom.attribute(clone, CLONE_OF_ATTR)?.parse().ok().map(NodeId)
}

fn insert_clones<D: GuideDom + ?Sized>(
    dom: &mut D,
    rows: &[NodeId],
    per_side: usize,
    inserted: &mut Vec<NodeId>,
) -> Result<f64, ScrollError> {
    let (Some(&first), Some(&last)) = (rows.first(), rows.last()) else {
        return Err(ScrollError::NoRows);
    };
    let mut prepended_height = 0.0;
    // Tail rows go above the first original. Walking backwards and inserting
    // before the previous clone keeps their visual order.
    let mut anchor = first;
    for &source in rows[rows.len() - per_side..].iter().rev() {
        let copy = dom.clone_node(source, anchor, InsertPosition::Before)?;
        inserted.push(copy);
        mark_clone(dom, copy, source);
        prepended_height += dom.offset_height(copy);
        anchor = copy;
    }
    let mut anchor = last;
    for &source in &rows[..per_side] {
        let copy = dom.clone_node(source, anchor, InsertPosition::After)?;
        inserted.push(copy);
        mark_clone(dom, copy, source);
        anchor = copy;
    }
    Ok(prepended_height)
}

/// Clone boundary rows around the originals and prime the scroll offset.
///
/// Errors leave the document as it was: clones inserted before a failure are
/// removed again.
pub fn clone_boundary_rows<D: GuideDom + ?Sized>(
    dom: &mut D,
    target: &ScrollTarget,
    fallback_row_height: f64,
) -> Result<CloneOutcome, ScrollError> {
    if target.is_cloned(dom) {
        return Err(ScrollError::AlreadyCloned);
    }
    let el = target.element;
    let rows = original_rows(dom, el);
    if rows.is_empty() {
        return Err(ScrollError::NoRows);
    }
    let row_height = measure_row_height(dom, &rows, fallback_row_height);
    let per_side = clones_per_side(rows.len(), row_height, dom.client_height(el));
    let previous = dom.scroll_top(el);

    let mut inserted = Vec::with_capacity(per_side * 2);
    let prepended_height = match insert_clones(dom, &rows, per_side, &mut inserted) {
        Ok(height) => height,
        Err(err) => {
            for copy in inserted {
                dom.remove(copy);
            }
            return Err(err);
        }
    };

    target.record_clones(dom, prepended_height);
    dom.set_scroll_top(el, previous + prepended_height);
    let outcome = CloneOutcome {
        clones_per_side: per_side,
        row_height,
        prepended_height,
        scroll_top: dom.scroll_top(el),
    };
    tracing::debug!(?outcome, element = ?el, "cloned boundary rows");
    Ok(outcome)
}

/// Remove every clone under the target and clear its markers. The scroll
/// offset is shifted back so the same originals stay on screen.
pub fn remove_clones<D: GuideDom + ?Sized>(dom: &mut D, target: &ScrollTarget) -> usize {
    let el = target.element;
    let prepended = target.prepended_height(dom).unwrap_or(0.0);
    let previous = dom.scroll_top(el);
    let clones = clone_rows(dom, el);
    for &clone in &clones {
        dom.remove(clone);
    }
    target.clear_clones(dom);
    dom.set_scroll_top(el, previous - prepended);
    if !clones.is_empty() {
        tracing::debug!(removed = clones.len(), element = ?el, "removed loop clones");
    }
    clones.len()
}

/// Current height of the clone block above the first original row.
pub fn measure_prepended_height<D: GuideDom + ?Sized>(dom: &D, container: NodeId) -> f64 {
    let Some(&first) = original_rows(dom, container).first() else {
        return 0.0;
    };
    let boundary = dom.offset_top(first);
    clone_rows(dom, container)
        .into_iter()
        .filter(|&clone| dom.offset_top(clone) < boundary)
        .map(|clone| dom.offset_height(clone))
        .sum()
}

/// Row at the top edge of the viewport.
pub fn top_visible_row<D: GuideDom + ?Sized>(dom: &D, container: NodeId) -> Option<NodeId> {
    let top = dom.scroll_top(container);
    all_rows(dom, container)
        .into_iter()
        .find(|&row| dom.offset_top(row) + dom.offset_height(row) > top)
}

/// Nudge lazily refreshed content on `row`; clones also refresh their source.
pub fn refresh_row<D: GuideDom + ?Sized>(dom: &mut D, row: NodeId) {
    dom.dispatch_hover(row);
    if let Some(source) = source_of(dom, row) {
        dom.dispatch_hover(source);
    }
}
