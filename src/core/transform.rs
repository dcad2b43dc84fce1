//! Per-item transform math.
//!
//! Every function here is pure: given the same baselines, scroll offset and
//! configuration the output is bit-identical.  The engine calls
//! [`compute_transform`] once per item per frame.

use std::fmt::Write as _;

use super::stack_config::StackConfig;

// ───────────────────────────────────────── transform ─────────

/// Visual transform applied to one stacked item.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemTransform {
    pub translate_y: f64,
    pub scale: f64,
    /// Degrees.
    pub rotation: f64,
    pub blur: f64,
}

impl ItemTransform {
    /// The untransformed state: natural position, full size.
    pub const IDENTITY: ItemTransform = ItemTransform {
        translate_y: 0.0,
        scale: 1.0,
        rotation: 0.0,
        blur: 0.0,
    };

    /// Snap components to a fixed precision so float jitter doesn't cause
    /// writes that change nothing visible.
    pub fn rounded(self) -> Self {
        Self {
            translate_y: round_to(self.translate_y, 2),
            scale: round_to(self.scale, 3),
            rotation: round_to(self.rotation, 2),
            blur: round_to(self.blur, 2),
        }
    }

    /// Whether writing `self` over `previous` would change anything visible.
    pub fn differs_from(&self, previous: &ItemTransform) -> bool {
        (self.translate_y - previous.translate_y).abs() > 0.1
            || (self.scale - previous.scale).abs() > 0.001
            || (self.rotation - previous.rotation).abs() > 0.1
            || (self.blur - previous.blur).abs() > 0.1
    }

    /// Inline style for a web-style host:
    /// `transform: translate3d(0, Ypx, 0) scale(S) rotate(Rdeg); filter: blur(Bpx)`.
    pub fn to_inline_style(&self) -> String {
        let mut style = format!(
            "transform: translate3d(0, {}px, 0) scale({}) rotate({}deg)",
            self.translate_y, self.scale, self.rotation
        );
        if self.blur > 0.0 {
            let _ = write!(style, "; filter: blur({}px)", self.blur);
        }
        style
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Normalise -0.0 so equality checks against IDENTITY hold.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// ───────────────────────────────────────── frame inputs ──────

/// Everything about the current frame that is shared between items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackFrame {
    pub scroll_offset: f64,
    /// `stack_trigger_position` resolved against the viewport.
    pub stack_trigger: f64,
    /// `scale_end_position` resolved against the viewport.
    pub scale_end: f64,
    /// Scroll offset past which pinned items are released.  `+inf` when the
    /// layout has no sentinel.
    pub pin_end: f64,
    /// Highest index whose trigger has been crossed, if any.
    pub top_of_stack: Option<usize>,
}

impl StackFrame {
    /// Resolve per-frame values from the scroll state, the sentinel baseline
    /// and the `(index, baseline)` pairs of the items that can head the
    /// stack.  Unmounted items are left out of `candidates`.
    pub fn new(
        config: &StackConfig,
        scroll_offset: f64,
        viewport_extent: f64,
        sentinel_baseline: Option<f64>,
        candidates: impl IntoIterator<Item = (usize, f64)>,
    ) -> Self {
        let stack_trigger = config.stack_trigger_position.resolve(viewport_extent);
        let scale_end = config.scale_end_position.resolve(viewport_extent);
        let pin_end = match sentinel_baseline {
            Some(b) => b - viewport_extent / 2.0,
            None => f64::INFINITY,
        };

        let mut frame = Self {
            scroll_offset,
            stack_trigger,
            scale_end,
            pin_end,
            top_of_stack: None,
        };
        frame.top_of_stack = top_of_stack(&frame, config, candidates);
        frame
    }

    /// Scroll offset at which item `index` starts scaling and pinning.
    pub fn trigger_start(&self, config: &StackConfig, index: usize, baseline: f64) -> f64 {
        baseline - self.stack_trigger - config.item_stack_offset * index as f64
    }

    /// Scroll offset at which item `index` finishes scaling.
    pub fn trigger_end(&self, baseline: f64) -> f64 {
        baseline - self.scale_end
    }

    /// Whether item `index` sits inside its pin window at this offset.
    pub fn is_pinned(&self, config: &StackConfig, index: usize, baseline: f64) -> bool {
        let pin_start = self.trigger_start(config, index, baseline);
        self.scroll_offset >= pin_start && self.scroll_offset <= self.pin_end
    }
}

/// Highest index whose trigger start has already been crossed.  Items below
/// it are "behind" the current top of the stack.
pub fn top_of_stack(
    frame: &StackFrame,
    config: &StackConfig,
    candidates: impl IntoIterator<Item = (usize, f64)>,
) -> Option<usize> {
    candidates
        .into_iter()
        .filter(|&(i, b)| frame.scroll_offset >= frame.trigger_start(config, i, b))
        .map(|(i, _)| i)
        .max()
}

/// Progress through the trigger zone, clamped to `[0, 1]`.
///
/// A zero or negative span counts as fully progressed once the offset has
/// reached the start.
pub fn scale_progress(scroll_offset: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 {
        return if scroll_offset >= start { 1.0 } else { 0.0 };
    }
    ((scroll_offset - start) / span).clamp(0.0, 1.0)
}

/// Compute the transform of item `index` with natural offset `baseline`.
pub fn compute_transform(
    index: usize,
    baseline: f64,
    frame: &StackFrame,
    config: &StackConfig,
) -> ItemTransform {
    let i = index as f64;
    let s = frame.scroll_offset;
    let trigger_start = frame.trigger_start(config, index, baseline);
    let trigger_end = frame.trigger_end(baseline);

    let progress = scale_progress(s, trigger_start, trigger_end);
    let scale = 1.0 - progress * (1.0 - config.target_scale(index));
    let rotation = if config.rotation_step == 0.0 {
        0.0
    } else {
        config.rotation_step * i * progress
    };

    // Offset that keeps the item at its pin slot for a given scroll offset.
    let pinned_at =
        |offset: f64| offset - baseline + frame.stack_trigger + config.item_stack_offset * i;
    let pin_start = trigger_start;
    let translate_y = if s >= pin_start && s <= frame.pin_end {
        pinned_at(s)
    } else if s > frame.pin_end {
        pinned_at(frame.pin_end)
    } else {
        0.0
    };

    let blur = match frame.top_of_stack {
        Some(top) if index < top => (config.blur_step * (top - index) as f64).max(0.0),
        _ => 0.0,
    };

    ItemTransform {
        translate_y,
        scale,
        rotation,
        blur,
    }
    .rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack_config::StackPosition;

    fn config() -> StackConfig {
        StackConfig {
            item_gap: 100.0,
            item_scale_step: 0.03,
            item_stack_offset: 30.0,
            stack_trigger_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: 0.85,
            ..StackConfig::default()
        }
    }

    fn frame_at(
        cfg: &StackConfig,
        scroll: f64,
        sentinel: Option<f64>,
        baselines: &[f64],
    ) -> StackFrame {
        StackFrame::new(cfg, scroll, 800.0, sentinel, baselines.iter().copied().enumerate())
    }

    #[test]
    fn idle_items_are_identity() {
        let cfg = config();
        let baselines = [400.0, 900.0, 1400.0];
        let frame = frame_at(&cfg, 0.0, Some(1800.0), &baselines);
        for (i, &b) in baselines.iter().enumerate() {
            assert_eq!(compute_transform(i, b, &frame, &cfg), ItemTransform::IDENTITY);
        }
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let cfg = StackConfig {
            rotation_step: 1.5,
            blur_step: 2.0,
            ..config()
        };
        let baselines = [400.0, 900.0, 1400.0];
        let frame = frame_at(&cfg, 733.3, Some(1800.0), &baselines);
        for (i, &b) in baselines.iter().enumerate() {
            let a = compute_transform(i, b, &frame, &cfg);
            let again = compute_transform(i, b, &frame, &cfg);
            assert_eq!(a.translate_y.to_bits(), again.translate_y.to_bits());
            assert_eq!(a.scale.to_bits(), again.scale.to_bits());
            assert_eq!(a.rotation.to_bits(), again.rotation.to_bits());
            assert_eq!(a.blur.to_bits(), again.blur.to_bits());
        }
    }

    #[test]
    fn scale_is_non_increasing_through_the_trigger_zone() {
        let cfg = config();
        let b = 1000.0;
        let baselines = [b];
        // trigger_start = 1000 - 160 = 840, trigger_end = 1000 - 80 = 920
        let mut last = f64::INFINITY;
        let mut s = 800.0;
        while s <= 960.0 {
            let frame = frame_at(&cfg, s, None, &baselines);
            let t = compute_transform(0, b, &frame, &cfg);
            assert!(t.scale <= last, "scale grew at offset {s}");
            last = t.scale;
            s += 5.0;
        }
        assert_eq!(last, 0.85);
    }

    #[test]
    fn pin_boundary_is_continuous() {
        let cfg = config();
        let b = 1000.0;
        let baselines = [b];
        let pin_start = 840.0;
        let at = |s: f64| compute_transform(0, b, &frame_at(&cfg, s, None, &baselines), &cfg);
        let before = at(pin_start - 0.001);
        let after = at(pin_start + 0.001);
        assert!(before.translate_y.abs() < 0.01);
        assert!(after.translate_y.abs() < 0.01);
    }

    #[test]
    fn pinned_item_follows_scroll() {
        let cfg = config();
        let baselines = [1000.0, 1500.0];
        let frame = frame_at(&cfg, 1100.0, None, &baselines);
        // 1100 - 1000 + 160 + 0
        assert_eq!(compute_transform(0, 1000.0, &frame, &cfg).translate_y, 260.0);
        // item 1: trigger_start = 1500 - 160 - 30 = 1310 → not yet engaged
        assert_eq!(compute_transform(1, 1500.0, &frame, &cfg).translate_y, 0.0);
    }

    #[test]
    fn released_items_freeze_at_pin_end() {
        let cfg = config();
        let baselines = [1000.0, 1500.0];
        let sentinel = Some(2400.0); // pin_end = 2000
        let at = |s: f64| {
            compute_transform(1, 1500.0, &frame_at(&cfg, s, sentinel, &baselines), &cfg)
        };
        let at_end = at(2000.0);
        for s in [2000.5, 2100.0, 5000.0] {
            let t = at(s);
            assert_eq!(t.translate_y, at_end.translate_y);
        }
        // 2000 - 1500 + 160 + 30
        assert_eq!(at_end.translate_y, 690.0);
    }

    #[test]
    fn missing_sentinel_never_releases() {
        let cfg = config();
        let baselines = [1000.0];
        let frame = frame_at(&cfg, 1_000_000.0, None, &baselines);
        assert_eq!(frame.pin_end, f64::INFINITY);
        let t = compute_transform(0, 1000.0, &frame, &cfg);
        assert_eq!(t.translate_y, 1_000_000.0 - 1000.0 + 160.0);
    }

    #[test]
    fn blur_grows_with_depth_behind_top() {
        let cfg = StackConfig {
            blur_step: 2.0,
            ..config()
        };
        let baselines = [400.0, 900.0, 1400.0, 1900.0];
        // trigger starts: 240, 710, 1180, 1650 → offset 1200 puts item 2 on top
        let frame = frame_at(&cfg, 1200.0, None, &baselines);
        assert_eq!(frame.top_of_stack, Some(2));
        let blurs: Vec<f64> = baselines
            .iter()
            .enumerate()
            .map(|(i, &b)| compute_transform(i, b, &frame, &cfg).blur)
            .collect();
        assert_eq!(blurs, vec![4.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn only_candidates_can_head_the_stack() {
        let cfg = config();
        // Item 2 is not laid out yet: left out even though its zero
        // baseline would count as crossed.
        let frame = StackFrame::new(&cfg, 300.0, 800.0, None, [(0, 400.0), (1, 900.0)]);
        assert_eq!(frame.top_of_stack, Some(0));
        let frame = StackFrame::new(&cfg, 0.0, 800.0, None, [(0, 400.0), (1, 900.0)]);
        assert_eq!(frame.top_of_stack, None);
    }

    #[test]
    fn rotation_scales_with_progress_and_index() {
        let cfg = StackConfig {
            rotation_step: 2.0,
            ..config()
        };
        let baselines = [1000.0, 1000.0];
        // Both fully progressed at 1000.
        let frame = frame_at(&cfg, 1000.0, None, &baselines);
        assert_eq!(compute_transform(0, 1000.0, &frame, &cfg).rotation, 0.0);
        assert_eq!(compute_transform(1, 1000.0, &frame, &cfg).rotation, 2.0);
    }

    #[test]
    fn degenerate_span_jumps_to_full_progress() {
        assert_eq!(scale_progress(99.0, 100.0, 100.0), 0.0);
        assert_eq!(scale_progress(100.0, 100.0, 100.0), 1.0);
        assert_eq!(scale_progress(150.0, 100.0, 50.0), 1.0);
        assert_eq!(scale_progress(150.0, 100.0, 200.0), 0.5);

        let cfg = StackConfig {
            stack_trigger_position: StackPosition::Px(50.0),
            scale_end_position: StackPosition::Px(50.0),
            ..config()
        };
        let frame = frame_at(&cfg, 950.0, None, &[1000.0]);
        let t = compute_transform(0, 1000.0, &frame, &cfg);
        assert!(t.scale.is_finite());
        assert_eq!(t.scale, 0.85);
    }

    #[test]
    fn three_item_scenario() {
        let cfg = config();
        // 300-unit cards with a 100 gap, starting at 500.
        let baselines = [500.0, 900.0, 1300.0];
        let frame = frame_at(&cfg, 0.0, Some(1600.0), &baselines);
        for (i, &b) in baselines.iter().enumerate() {
            let t = compute_transform(i, b, &frame, &cfg);
            assert_eq!(t.scale, 1.0);
            assert_eq!(t.translate_y, 0.0);
        }

        let start = baselines[0] - 160.0;
        let at = |s: f64| {
            compute_transform(0, 500.0, &frame_at(&cfg, s, Some(1600.0), &baselines), &cfg)
        };
        let at_start = at(start);
        assert_eq!(at_start.scale, 1.0);
        let past = at(start + 40.0);
        assert!(past.scale < 1.0 && past.scale > 0.85);
        assert_eq!(past.scale, 0.925);
    }

    #[test]
    fn rounding_and_change_thresholds() {
        let t = ItemTransform {
            translate_y: 10.126,
            scale: 0.98765,
            rotation: -0.001,
            blur: 1.005,
        }
        .rounded();
        assert_eq!(t.translate_y, 10.13);
        assert_eq!(t.scale, 0.988);
        assert_eq!(t.rotation, 0.0);

        let nudged = ItemTransform {
            translate_y: t.translate_y + 0.05,
            ..t
        };
        assert!(!nudged.differs_from(&t));
        let moved = ItemTransform {
            translate_y: t.translate_y + 0.5,
            ..t
        };
        assert!(moved.differs_from(&t));
        let shrunk = ItemTransform {
            scale: t.scale - 0.002,
            ..t
        };
        assert!(shrunk.differs_from(&t));
    }

    #[test]
    fn inline_style_omits_zero_blur() {
        let t = ItemTransform {
            translate_y: 12.5,
            scale: 0.9,
            rotation: 1.0,
            blur: 0.0,
        };
        assert_eq!(
            t.to_inline_style(),
            "transform: translate3d(0, 12.5px, 0) scale(0.9) rotate(1deg)"
        );
        let blurred = ItemTransform { blur: 4.0, ..t };
        assert!(blurred.to_inline_style().ends_with("; filter: blur(4px)"));
    }
}
