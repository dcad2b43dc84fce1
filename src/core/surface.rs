//! The layout host: a minimal document model the engine measures and
//! writes into.
//!
//! A [`Surface`] holds the *natural* geometry of a vertical run of items
//! (heights, gap, padding, an optional end sentinel), the scroll position,
//! the viewport extent, and the presentation transform currently applied to
//! each item.  Heights stay `None` until the renderer has laid the item out;
//! such an item counts as not mounted and cannot be measured yet.

use super::transform::ItemTransform;

/// Anything the engine can ask the host to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Item(usize),
    Sentinel,
}

#[derive(Debug, Clone, Default)]
struct Node {
    height: Option<f64>,
    presentation: Option<ItemTransform>,
}

/// DOM-like host for a stack of items.
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: Vec<Node>,
    gap: f64,
    /// Space above the first item.
    leading: f64,
    /// Space below the sentinel, so the last pin window can be scrolled through.
    trailing: f64,
    sentinel: bool,
    viewport: f64,
    scroll_top: f64,
}

impl Surface {
    /// An empty surface with `items` unmounted items.
    pub fn new(items: usize, gap: f64) -> Self {
        Self {
            nodes: vec![Node::default(); items],
            gap,
            leading: 0.0,
            trailing: 0.0,
            sentinel: true,
            viewport: 0.0,
            scroll_top: 0.0,
        }
    }

    pub fn with_sentinel(mut self, sentinel: bool) -> Self {
        self.sentinel = sentinel;
        self
    }

    // ── structure ───────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_sentinel(&self) -> bool {
        self.sentinel
    }

    /// Append an unmounted item and return its index.
    pub fn push_item(&mut self) -> usize {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }

    /// Lay out item `index` with its natural height.
    pub fn set_item_height(&mut self, index: usize, height: f64) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.height = Some(height.max(0.0));
        }
    }

    pub fn item_height(&self, index: usize) -> Option<f64> {
        self.nodes.get(index).and_then(|n| n.height)
    }

    pub fn set_padding(&mut self, leading: f64, trailing: f64) {
        self.leading = leading;
        self.trailing = trailing;
        self.clamp_scroll();
    }

    pub fn set_viewport(&mut self, extent: f64) {
        self.viewport = extent.max(0.0);
        self.clamp_scroll();
    }

    pub fn viewport(&self) -> f64 {
        self.viewport
    }

    // ── geometry ────────────────────────────────────────────────

    /// Natural distance from the content origin to the top of `element`,
    /// ignoring any presentation transform.  `None` while the element (or
    /// anything above it) has not been laid out.
    pub fn offset_top(&self, element: Element) -> Option<f64> {
        let upto = match element {
            Element::Item(i) if i < self.nodes.len() => {
                self.nodes[i].height?;
                i
            }
            Element::Item(_) => return None,
            Element::Sentinel if self.sentinel => self.nodes.len(),
            Element::Sentinel => return None,
        };
        let mut top = self.leading;
        for node in &self.nodes[..upto] {
            top += node.height? + self.gap;
        }
        // No gap after the last item.
        if matches!(element, Element::Sentinel) && upto > 0 {
            top -= self.gap;
        }
        Some(top)
    }

    /// Top edge relative to the viewport, as painted. Includes the applied
    /// translation.
    pub fn bounding_top(&self, element: Element) -> Option<f64> {
        let natural = self.offset_top(element)? - self.scroll_top;
        let shift = match element {
            Element::Item(i) => self.nodes[i].presentation.map_or(0.0, |t| t.translate_y),
            Element::Sentinel => 0.0,
        };
        Some(natural + shift)
    }

    /// Total scrollable height of the content.
    pub fn content_height(&self) -> f64 {
        let items: f64 = self.nodes.iter().map(|n| n.height.unwrap_or(0.0)).sum();
        let gaps = self.gap * self.nodes.len().saturating_sub(1) as f64;
        self.leading + items + gaps + self.trailing
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height() - self.viewport).max(0.0)
    }

    // ── scroll ──────────────────────────────────────────────────

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Set the scroll position, clamped to the scrollable range.  Returns
    /// the position actually applied.
    pub fn set_scroll_top(&mut self, offset: f64) -> f64 {
        self.scroll_top = offset.clamp(0.0, self.max_scroll());
        self.scroll_top
    }

    fn clamp_scroll(&mut self) {
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll());
    }

    // ── presentation ────────────────────────────────────────────

    pub fn presentation(&self, index: usize) -> Option<ItemTransform> {
        self.nodes.get(index).and_then(|n| n.presentation)
    }

    pub fn apply_transform(&mut self, index: usize, transform: ItemTransform) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.presentation = Some(transform);
        }
    }

    /// Remove the presentation transform of `index`, returning it so it can
    /// be put back with [`Surface::restore_presentation`].
    pub fn suspend_presentation(&mut self, index: usize) -> Option<ItemTransform> {
        self.nodes.get_mut(index).and_then(|n| n.presentation.take())
    }

    pub fn restore_presentation(&mut self, index: usize, saved: Option<ItemTransform>) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.presentation = saved;
        }
    }
}
