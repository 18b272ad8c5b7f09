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

//! In-memory element tree implementing [`GuideDom`].
//!
//! Layout is deliberately simple: block elements stack vertically, an element
//! with an explicit height reports that height, anything else is the sum of
//! its children. Elements created with a viewport are scroll containers.

use super::dom::{GuideDom, InsertPosition, NodeId};
use crate::error::ScrollError;
use std::collections::BTreeMap;

/// Builder describing one element to insert.
#[derive(Debug, Clone, Default)]
pub struct Element {
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    height: Option<f64>,
    viewport: Option<f64>,
}

impl Element {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_owned());
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        text.clone_into(&mut self.text);
        self
    }

    #[must_use]
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Make this element a scroll container with the given client height.
    #[must_use]
    pub fn viewport(mut self, client_height: f64) -> Self {
        self.viewport = Some(client_height);
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_owned(), value.to_owned());
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    el: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scroll_top: f64,
    attached: bool,
    hover_count: u32,
}

/// Element tree rooted at a body node.
///
/// Slots of removed subtrees are reused by later inserts, so a handle kept
/// past `remove` may come to name a different node.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    hidden: bool,
    body_classes: Vec<String>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    #[must_use]
    pub fn new() -> Self {
        let body = Node {
            el: Element::new(),
            parent: None,
            children: Vec::new(),
            scroll_top: 0.0,
            attached: true,
            hover_count: 0,
        };
        Self { nodes: vec![body], free: Vec::new(), hidden: false, body_classes: Vec::new() }
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Append `el` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, el: Element) -> NodeId {
        let attached = self.is_attached(parent);
        let id = self.alloc(Node {
            el,
            parent: Some(parent),
            children: Vec::new(),
            scroll_top: 0.0,
            attached,
            hover_count: 0,
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Attached children of `node`, in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn set_viewport(&mut self, el: NodeId, client_height: f64) {
        if let Some(n) = self.nodes.get_mut(el.0) {
            n.el.viewport = Some(client_height.max(0.0));
        }
        let clamped = self.scroll_top(el);
        self.set_scroll_top(el, clamped);
    }

    pub fn set_height(&mut self, node: NodeId, height: f64) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.el.height = Some(height.max(0.0));
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            text.clone_into(&mut n.el.text);
        }
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_body_classes(&mut self, classes: &str) {
        self.body_classes = classes.split_whitespace().map(str::to_owned).collect();
    }

    #[must_use]
    pub fn hover_count(&self, node: NodeId) -> u32 {
        self.node(node).map_or(0, |n| n.hover_count)
    }

    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.attached)
    }

    /// Own text of a single element, without descendants.
    #[must_use]
    pub fn own_text(&self, node: NodeId) -> &str {
        self.node(node).map_or("", |n| n.el.text.as_str())
    }

    /// Number of node slots ever allocated, live or free.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|n| n.attached)
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if let Some(wanted) = selector.strip_prefix('#') {
            node.el.id.as_deref() == Some(wanted)
        } else if let Some(wanted) = selector.strip_prefix('.') {
            node.el.classes.iter().any(|c| c == wanted)
        } else {
            false
        }
    }

    fn collect_descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.node(root) else {
            return;
        };
        for &child in &node.children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    fn is_container(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.el.viewport.is_some())
    }

    fn content_height(&self, id: NodeId) -> f64 {
        self.node(id).map_or(0.0, |n| n.children.iter().map(|&c| self.offset_height(c)).sum())
    }

    fn deep_copy(&mut self, source: NodeId, parent: NodeId) -> Option<NodeId> {
        let src = self.node(source)?.clone();
        let mut el = src.el;
        // Element ids stay unique; clones are addressed by class.
        el.id = None;
        let id = self.alloc(Node {
            el,
            parent: Some(parent),
            children: Vec::new(),
            scroll_top: 0.0,
            attached: true,
            hover_count: 0,
        });
        for child in src.children {
            if let Some(copy) = self.deep_copy(child, id)
                && let Some(n) = self.nodes.get_mut(id.0)
            {
                n.children.push(copy);
            }
        }
        Some(id)
    }

    fn detach_subtree(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0) {
            Some(n) => {
                n.attached = false;
                std::mem::take(&mut n.children)
            }
            None => return,
        };
        self.free.push(id);
        for child in children {
            self.detach_subtree(child);
        }
    }
}

impl GuideDom for MemoryDom {
    fn query(&self, scope: Option<NodeId>, selector: &str) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.collect_descendants(scope.unwrap_or_else(|| self.body()), &mut all);
        all.retain(|&id| self.matches(id, selector));
        all
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Some(n) = self.node(id) else {
                return false;
            };
            if id == ancestor {
                return true;
            }
            cursor = n.parent;
        }
        false
    }

    fn scroll_top(&self, el: NodeId) -> f64 {
        self.node(el).map_or(0.0, |n| n.scroll_top)
    }

    fn set_scroll_top(&mut self, el: NodeId, value: f64) {
        if !self.is_container(el) {
            return;
        }
        let max = (self.scroll_height(el) - self.client_height(el)).max(0.0);
        let clamped = if value.is_finite() { value.clamp(0.0, max) } else { 0.0 };
        if let Some(n) = self.nodes.get_mut(el.0) {
            n.scroll_top = clamped;
        }
    }

    fn scroll_height(&self, el: NodeId) -> f64 {
        if self.is_container(el) {
            self.content_height(el).max(self.client_height(el))
        } else {
            self.offset_height(el)
        }
    }

    fn client_height(&self, el: NodeId) -> f64 {
        self.node(el).and_then(|n| n.el.viewport).unwrap_or_else(|| self.offset_height(el))
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        let Some(n) = self.node(node) else {
            return 0.0;
        };
        n.el.viewport.or(n.el.height).unwrap_or_else(|| self.content_height(node))
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        let mut top = 0.0;
        let mut cursor = node;
        while let Some(parent) = self.node(cursor).and_then(|n| n.parent) {
            let Some(p) = self.node(parent) else {
                break;
            };
            top += p
                .children
                .iter()
                .take_while(|&&c| c != cursor)
                .map(|&c| self.offset_height(c))
                .sum::<f64>();
            if p.el.viewport.is_some() {
                break;
            }
            cursor = parent;
        }
        top
    }

    fn text(&self, node: NodeId) -> String {
        let Some(n) = self.node(node) else {
            return String::new();
        };
        let mut parts = Vec::new();
        if !n.el.text.trim().is_empty() {
            parts.push(n.el.text.trim().to_owned());
        }
        for &child in &n.children {
            let t = self.text(child);
            if !t.is_empty() {
                parts.push(t);
            }
        }
        parts.join(" ")
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).is_some_and(|n| n.el.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.el.classes.push(class.to_owned());
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?.el.attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.el.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.el.attrs.remove(name);
        }
    }

    fn clone_node(
        &mut self,
        source: NodeId,
        anchor: NodeId,
        position: InsertPosition,
    ) -> Result<NodeId, ScrollError> {
        if self.node(source).is_none() {
            return Err(ScrollError::UnknownNode(source));
        }
        let parent =
            self.node(anchor).and_then(|n| n.parent).ok_or(ScrollError::UnknownNode(anchor))?;
        let copy = self.deep_copy(source, parent).ok_or(ScrollError::UnknownNode(source))?;
        let siblings = &mut self.nodes[parent.0].children;
        let idx = siblings.iter().position(|&c| c == anchor).unwrap_or(siblings.len());
        let at = match position {
            InsertPosition::Before => idx,
            InsertPosition::After => (idx + 1).min(siblings.len()),
        };
        siblings.insert(at, copy);
        Ok(copy)
    }

    fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.retain(|&c| c != node);
        }
        self.detach_subtree(node);
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.iter().any(|c| c == class)
    }

    fn dispatch_hover(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node.0)
            && n.attached
        {
            n.hover_count += 1;
        }
    }
}
