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

//! Minimal document capability the engine needs.
//!
//! The engine never touches a concrete tree. Everything it reads or mutates
//! goes through [`GuideDom`], so a browser binding, the in-memory grid used by
//! the terminal host, or a test double can all sit behind it.

use crate::error::ScrollError;
use serde::Serialize;

/// Opaque handle to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Where a cloned node is inserted relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

/// Element queries and mutations used by the auto-scroll engine.
///
/// Selectors are limited to the two forms the guide markup uses:
/// `#id` and `.class`.
pub trait GuideDom {
    /// All elements matching `selector` in document order. With `scope`, only
    /// strict descendants of that element are considered.
    fn query(&self, scope: Option<NodeId>, selector: &str) -> Vec<NodeId>;

    /// Whether `node` is `ancestor` itself or lives inside it.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn scroll_top(&self, el: NodeId) -> f64;

    /// Writes are clamped to `[0, scroll_height - client_height]`.
    fn set_scroll_top(&mut self, el: NodeId, value: f64);

    fn scroll_height(&self, el: NodeId) -> f64;

    fn client_height(&self, el: NodeId) -> f64;

    /// Rendered height of an element, `0.0` when unmeasurable.
    fn offset_height(&self, node: NodeId) -> f64;

    /// Offset of `node` from the top of its scroll container's content.
    fn offset_top(&self, node: NodeId) -> f64;

    /// Concatenated text of the element and its descendants.
    fn text(&self, node: NodeId) -> String;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Deep-clone `source` and insert the copy next to `anchor`.
    fn clone_node(
        &mut self,
        source: NodeId,
        anchor: NodeId,
        position: InsertPosition,
    ) -> Result<NodeId, ScrollError>;

    /// Detach `node` (and its subtree) from the document.
    fn remove(&mut self, node: NodeId);

    /// Document visibility (`document.hidden`).
    fn is_hidden(&self) -> bool;

    fn body_has_class(&self, class: &str) -> bool;

    /// Synthetic hover/focus notification so lazily refreshed content updates.
    fn dispatch_hover(&mut self, node: NodeId);
}

/// Maximum scroll offset of `el`.
pub fn max_scroll_top<D: GuideDom + ?Sized>(dom: &D, el: NodeId) -> f64 {
    (dom.scroll_height(el) - dom.client_height(el)).max(0.0)
}
