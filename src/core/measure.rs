//! Baseline measurement cache.
//!
//! Per-frame transform math needs every item's *natural* offset.  Reading
//! it from the host each frame would be wasteful and, worse, would read
//! back the transforms the engine itself painted.  The cache measures once
//! (with presentation suspended) and is invalidated on resize or when an
//! item shows up without a baseline.

use super::scroll_source::ScrollSource;
use super::surface::{Element, Surface};

/// Cached natural offsets, indexed by item.
#[derive(Debug, Default)]
pub struct LayoutCache {
    baselines: Vec<f64>,
    /// Whether each item was laid out when last measured.
    mounted: Vec<bool>,
    sentinel: Option<f64>,
    /// Set when the next frame must remeasure before computing.
    needs_remeasure: bool,
    /// Number of completed measurement passes.
    passes: u64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            needs_remeasure: true,
            ..Self::default()
        }
    }

    /// Measure every item and the sentinel.
    ///
    /// Each item's presentation transform is taken off before reading its
    /// geometry and put back right after, so a translated item never
    /// reports its painted position as its baseline.  Items that are not
    /// laid out yet read as 0 and keep the cache flagged for a retry.
    pub fn measure(&mut self, source: &dyn ScrollSource, surface: &mut Surface) {
        let count = surface.len();
        let mut unmounted = 0;

        self.baselines.clear();
        self.baselines.reserve(count);
        self.mounted.clear();
        self.mounted.reserve(count);
        for index in 0..count {
            let saved = surface.suspend_presentation(index);
            let mounted = surface.item_height(index).is_some();
            if !mounted {
                unmounted += 1;
            }
            self.mounted.push(mounted);
            let baseline = source.element_baseline(surface, Element::Item(index));
            surface.restore_presentation(index, saved);
            self.baselines.push(baseline);
        }

        self.sentinel = if surface.has_sentinel() {
            if surface.offset_top(Element::Sentinel).is_none() {
                unmounted += 1;
            }
            Some(source.element_baseline(surface, Element::Sentinel))
        } else {
            None
        };

        self.needs_remeasure = unmounted > 0;
        self.passes += 1;
        tracing::debug!(
            items = count,
            unmounted,
            sentinel = ?self.sentinel,
            "measured stack baselines"
        );
    }

    /// Force a remeasure on the next frame (viewport resize, relayout).
    pub fn invalidate(&mut self) {
        self.needs_remeasure = true;
    }

    /// Whether the cache must be refreshed before computing `item_count`
    /// transforms.  Newly added items have no baseline and trigger this.
    pub fn is_stale(&self, item_count: usize) -> bool {
        self.needs_remeasure || self.baselines.len() != item_count
    }

    pub fn baselines(&self) -> &[f64] {
        &self.baselines
    }

    /// `(index, baseline)` of every item that was laid out when measured.
    pub fn mounted_baselines(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.baselines
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, _)| self.mounted[i])
    }

    pub fn sentinel(&self) -> Option<f64> {
        self.sentinel
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }
}
