//! The stacking engine: owns the scroll source, baseline cache, frame
//! scheduler and completion state for one stack.
//!
//! Lifecycle: [`StackEngine::create`] → any number of [`StackEngine::frame`]
//! calls (one per repaint) → [`StackEngine::teardown`] (also run on drop).
//! Within a frame the order is fixed: inertial advance, then, if an update
//! was scheduled, measure (when stale), compute, write changed
//! transforms, check completion.

use std::time::Duration;

use super::completion::CompletionNotifier;
use super::inertia::{InertiaConfig, InputKind};
use super::measure::LayoutCache;
use super::scheduler::{FrameScheduler, SchedulerStats};
use super::scroll_source::{self, ListenerId, ScrollSource, ScrollState};
use super::stack_config::{ConfigError, ScrollMode, StackConfig};
use super::surface::Surface;
use super::transform::{compute_transform, ItemTransform, StackFrame};

/// What happened during one [`StackEngine::frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The scroll source moved the scroll position this frame.
    pub scrolled: bool,
    /// A recomputation pass ran.
    pub recomputed: bool,
    /// Number of item transforms written to the surface.
    pub writes: usize,
    /// The stack-complete callback fired.
    pub completed: bool,
}

pub struct StackEngine {
    config: StackConfig,
    source: Box<dyn ScrollSource>,
    cache: LayoutCache,
    /// Last transform written per item, to skip no-op writes.
    applied: Vec<Option<ItemTransform>>,
    completion: CompletionNotifier,
    scheduler: FrameScheduler,
    listener: Option<ListenerId>,
    on_complete: Option<Box<dyn FnMut()>>,
    top_of_stack: Option<usize>,
    torn_down: bool,
}

impl std::fmt::Debug for StackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackEngine")
            .field("config", &self.config)
            .field("source", &self.source)
            .field("cache", &self.cache)
            .field("top_of_stack", &self.top_of_stack)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl StackEngine {
    /// Validate `config`, attach to `surface`, take the first measurement
    /// and schedule the first pass.
    pub fn create(
        config: StackConfig,
        inertia: InertiaConfig,
        surface: &mut Surface,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut source = scroll_source::for_mode(config.scroll_mode, inertia, surface);
        let scheduler = FrameScheduler::new();
        let handle = scheduler.handle();
        let listener = source.on_scroll(Box::new(move |_| handle.schedule_update()));

        let mut cache = LayoutCache::new();
        cache.measure(source.as_ref(), surface);
        scheduler.schedule_update();

        tracing::debug!(
            mode = config.scroll_mode.label(),
            items = surface.len(),
            "stack engine created"
        );

        Ok(Self {
            config,
            source,
            cache,
            applied: Vec::new(),
            completion: CompletionNotifier::default(),
            scheduler,
            listener: Some(listener),
            on_complete: None,
            top_of_stack: None,
            torn_down: false,
        })
    }

    /// Register the callback fired when the last item becomes pinned.
    pub fn on_stack_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn mode(&self) -> ScrollMode {
        self.source.mode()
    }

    pub fn scroll_state(&self, surface: &Surface) -> ScrollState {
        self.source.scroll_state(surface)
    }

    // ── input ───────────────────────────────────────────────────

    pub fn scroll_by(&mut self, surface: &mut Surface, delta: f64, kind: InputKind) {
        if !self.torn_down {
            self.source.scroll_by(surface, delta, kind);
        }
    }

    pub fn scroll_to(&mut self, surface: &mut Surface, offset: f64) {
        if !self.torn_down {
            self.source.scroll_to(surface, offset);
        }
    }

    /// The viewport changed size: baselines are stale.
    pub fn handle_resize(&mut self, surface: &Surface) {
        tracing::debug!(viewport = surface.viewport(), "stack resize");
        self.notify_layout_changed();
    }

    /// Item geometry changed without a resize (content edit, relayout).
    pub fn notify_layout_changed(&mut self) {
        self.cache.invalidate();
        self.scheduler.schedule_update();
    }

    // ── frame ───────────────────────────────────────────────────

    /// Drive one repaint.
    pub fn frame(&mut self, surface: &mut Surface, dt: Duration) -> FrameOutcome {
        if self.torn_down {
            return FrameOutcome::default();
        }

        let scrolled = self.source.advance(surface, dt);
        // Items added since the last measurement have no baseline yet.
        if self.cache.is_stale(surface.len()) && !self.scheduler.is_pending() {
            self.scheduler.schedule_update();
        }

        let Self {
            config,
            source,
            cache,
            applied,
            completion,
            scheduler,
            ..
        } = self;
        let pass = scheduler.run_frame(|| {
            update_pass(config, source.as_ref(), cache, applied, completion, surface)
        });

        let Some(pass) = pass else {
            return FrameOutcome {
                scrolled,
                ..FrameOutcome::default()
            };
        };

        self.top_of_stack = pass.top_of_stack;
        if pass.entered_complete {
            tracing::info!(items = surface.len(), "stack complete");
            if let Some(callback) = self.on_complete.as_mut() {
                callback();
            }
        }
        tracing::trace!(writes = pass.writes, scrolled, "stack frame");

        FrameOutcome {
            scrolled,
            recomputed: true,
            writes: pass.writes,
            completed: pass.entered_complete,
        }
    }

    /// Transforms for the current scroll state, without writing anything.
    pub fn compute_transforms(&self, surface: &Surface) -> Vec<ItemTransform> {
        let state = self.source.scroll_state(surface);
        let frame = stack_frame(&self.config, &self.cache, state);
        compute_all(&self.config, &self.cache, &frame)
    }

    // ── teardown ────────────────────────────────────────────────

    /// Cancel pending frames, remove listeners and stop the inertial
    /// driver.  Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel();
        if let Some(id) = self.listener.take() {
            self.source.remove_listener(id);
        }
        self.source.teardown();
        self.completion.reset();
        self.on_complete = None;
        self.torn_down = true;
        tracing::debug!(mode = self.source.mode().label(), "stack engine torn down");
    }

    // ── queries ─────────────────────────────────────────────────

    pub fn top_of_stack(&self) -> Option<usize> {
        self.top_of_stack
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn measure_passes(&self) -> u64 {
        self.cache.passes()
    }
}

impl Drop for StackEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ───────────────────────────────────────── update pass ───────

struct PassResult {
    writes: usize,
    top_of_stack: Option<usize>,
    entered_complete: bool,
}

fn stack_frame(config: &StackConfig, cache: &LayoutCache, state: ScrollState) -> StackFrame {
    StackFrame::new(
        config,
        state.scroll_offset,
        state.viewport_extent,
        cache.sentinel(),
        cache.mounted_baselines(),
    )
}

/// Unmounted items get the transform for a zero baseline; they are
/// remeasured on the next frame and never head the stack meanwhile.
fn compute_all(
    config: &StackConfig,
    cache: &LayoutCache,
    frame: &StackFrame,
) -> Vec<ItemTransform> {
    cache
        .baselines()
        .iter()
        .enumerate()
        .map(|(i, &b)| compute_transform(i, b, frame, config))
        .collect()
}

/// Measure if needed, compute every transform, write the ones that changed.
fn update_pass(
    config: &StackConfig,
    source: &dyn ScrollSource,
    cache: &mut LayoutCache,
    applied: &mut Vec<Option<ItemTransform>>,
    completion: &mut CompletionNotifier,
    surface: &mut Surface,
) -> PassResult {
    if surface.is_empty() {
        applied.clear();
        return PassResult {
            writes: 0,
            top_of_stack: None,
            entered_complete: false,
        };
    }

    if cache.is_stale(surface.len()) {
        cache.measure(source, surface);
    }

    let state = source.scroll_state(surface);
    let frame = stack_frame(config, cache, state);
    let transforms = compute_all(config, cache, &frame);

    applied.resize(transforms.len(), None);
    let mut writes = 0;
    for (index, transform) in transforms.iter().enumerate() {
        let changed = applied[index].map_or(true, |prev| transform.differs_from(&prev));
        if changed {
            surface.apply_transform(index, *transform);
            applied[index] = Some(*transform);
            writes += 1;
        }
    }

    let last = transforms.len() - 1;
    let last_baseline = cache.baselines()[last];
    let entered_complete = completion.observe(frame.is_pinned(config, last, last_baseline));

    PassResult {
        writes,
        top_of_stack: frame.top_of_stack,
        entered_complete,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::core::stack_config::StackPosition;

    const FRAME: Duration = Duration::from_micros(16_667);

    /// Three 300-unit cards, 100 gap, starting 500 down; viewport 800.
    fn surface() -> Surface {
        let mut s = Surface::new(3, 100.0);
        s.set_padding(500.0, 1200.0);
        for i in 0..3 {
            s.set_item_height(i, 300.0);
        }
        s.set_viewport(800.0);
        s
    }

    fn config(mode: ScrollMode) -> StackConfig {
        StackConfig {
            item_gap: 100.0,
            item_scale_step: 0.03,
            item_stack_offset: 30.0,
            stack_trigger_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: 0.85,
            scroll_mode: mode,
            ..StackConfig::default()
        }
    }

    fn engine(mode: ScrollMode, s: &mut Surface) -> StackEngine {
        StackEngine::create(config(mode), InertiaConfig::default(), s).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut s = surface();
        let bad = StackConfig {
            base_scale: -1.0,
            ..config(ScrollMode::Window)
        };
        assert!(StackEngine::create(bad, InertiaConfig::default(), &mut s).is_err());
    }

    #[test]
    fn first_frame_writes_identity_transforms() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        let out = e.frame(&mut s, FRAME);
        assert!(out.recomputed);
        assert_eq!(out.writes, 3);
        for i in 0..3 {
            assert_eq!(s.presentation(i), Some(ItemTransform::IDENTITY));
        }
        // Nothing scheduled → nothing recomputed.
        assert!(!e.frame(&mut s, FRAME).recomputed);
    }

    #[test]
    fn scrolling_past_trigger_starts_scaling_first_item() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);

        // Item 0 baseline is 500; trigger starts at 500 - 160.
        e.scroll_to(&mut s, 340.0 + 40.0);
        e.frame(&mut s, FRAME);
        let first = s.presentation(0).unwrap_or_default();
        assert!(first.scale < 1.0 && first.scale > 0.85);
        assert_eq!(s.presentation(1), Some(ItemTransform::IDENTITY));
    }

    #[test]
    fn repeated_scroll_events_coalesce_into_one_pass() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);

        for step in 1..=5 {
            e.scroll_by(&mut s, 10.0 * step as f64, InputKind::Wheel);
        }
        let before = e.stats().executed;
        e.frame(&mut s, FRAME);
        assert_eq!(e.stats().executed, before + 1);
        assert!(e.stats().coalesced >= 4);
    }

    #[test]
    fn unchanged_transforms_are_not_rewritten() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);
        // Still before any trigger: nothing visible changes.
        e.scroll_by(&mut s, 5.0, InputKind::Wheel);
        let out = e.frame(&mut s, FRAME);
        assert!(out.recomputed);
        assert_eq!(out.writes, 0);
    }

    #[test]
    fn compute_transforms_is_idempotent() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.scroll_to(&mut s, 777.0);
        e.frame(&mut s, FRAME);
        assert_eq!(e.compute_transforms(&s), e.compute_transforms(&s));
    }

    #[test]
    fn completion_fires_once_per_dwell() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        e.on_stack_complete(move || sink.set(sink.get() + 1));

        // Last item: baseline 1300, pin_start = 1300 - 160 - 60 = 1080.
        // Sentinel at 1600 → pin_end = 1200.
        let visit = |offset: f64, e: &mut StackEngine, s: &mut Surface| {
            e.scroll_to(s, offset);
            e.frame(s, FRAME);
        };
        visit(1000.0, &mut e, &mut s);
        assert_eq!(hits.get(), 0);
        visit(1100.0, &mut e, &mut s);
        assert_eq!(hits.get(), 1);
        visit(1150.0, &mut e, &mut s);
        visit(1200.0, &mut e, &mut s);
        assert_eq!(hits.get(), 1);
        visit(1300.0, &mut e, &mut s);
        assert!(!e.is_complete());
        visit(1150.0, &mut e, &mut s);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn resize_remeasures_before_computing() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);
        let passes = e.measure_passes();

        // Narrower viewport → taller cards.
        for i in 0..3 {
            s.set_item_height(i, 500.0);
        }
        s.set_viewport(600.0);
        e.handle_resize(&s);
        s.set_scroll_top(1000.0);
        e.frame(&mut s, FRAME);
        assert_eq!(e.measure_passes(), passes + 1);

        // Item 1 now sits at 500 + 600 = 1100 and pins from 1100 - 120 - 30.
        // The stale baseline (900) would put it 200 further down.
        assert_eq!(s.presentation(1).map(|t| t.translate_y), Some(50.0));
        let expected = {
            let mut fresh = surface();
            for i in 0..3 {
                fresh.set_item_height(i, 500.0);
            }
            fresh.set_viewport(600.0);
            fresh.set_scroll_top(1000.0);
            let mut other = engine(ScrollMode::Window, &mut fresh);
            other.frame(&mut fresh, FRAME);
            other.compute_transforms(&fresh)
        };
        assert_eq!(e.compute_transforms(&s), expected);
    }

    #[test]
    fn new_items_are_measured_lazily() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);
        let passes = e.measure_passes();

        let idx = s.push_item();
        s.set_item_height(idx, 300.0);
        let out = e.frame(&mut s, FRAME);
        assert!(out.recomputed);
        assert_eq!(e.measure_passes(), passes + 1);
        assert_eq!(s.presentation(idx), Some(ItemTransform::IDENTITY));
    }

    #[test]
    fn unmounted_items_do_not_head_the_stack() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Window, &mut s);
        e.frame(&mut s, FRAME);

        // Reads as baseline 0, which every offset has already crossed.
        let idx = s.push_item();
        e.notify_layout_changed();
        e.frame(&mut s, FRAME);
        assert_eq!(e.top_of_stack(), None);
        assert_eq!(s.presentation(0).map(|t| t.blur), Some(0.0));

        s.set_item_height(idx, 300.0);
        e.frame(&mut s, FRAME);
        assert_eq!(e.top_of_stack(), None);
        assert_eq!(s.presentation(idx), Some(ItemTransform::IDENTITY));
    }

    #[test]
    fn container_mode_recomputes_on_smoothed_motion() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Container, &mut s);
        e.frame(&mut s, FRAME);

        e.scroll_by(&mut s, 400.0, InputKind::Wheel);
        assert_eq!(s.scroll_top(), 0.0);
        assert!(!e.scheduler.is_pending());

        let out = e.frame(&mut s, FRAME);
        assert!(out.scrolled && out.recomputed);
        let mut frames = 1;
        while e.frame(&mut s, FRAME).scrolled {
            frames += 1;
        }
        assert!(frames > 10, "glide took only {frames} frames");
        assert_eq!(s.scroll_top(), 400.0);
    }

    #[test]
    fn zero_items_is_a_no_op() {
        let mut s = Surface::new(0, 10.0);
        s.set_viewport(100.0);
        let mut e = engine(ScrollMode::Window, &mut s);
        let out = e.frame(&mut s, FRAME);
        assert_eq!(out.writes, 0);
        assert!(!out.completed);
        assert!(e.compute_transforms(&s).is_empty());
    }

    #[test]
    fn missing_sentinel_pins_forever() {
        let mut s = surface().with_sentinel(false);
        let mut e = engine(ScrollMode::Window, &mut s);
        let bottom = s.max_scroll();
        e.scroll_to(&mut s, bottom);
        e.frame(&mut s, FRAME);
        let t = s.presentation(0).unwrap_or_default();
        assert_eq!(t.translate_y, s.scroll_top() - 500.0 + 160.0);
    }

    #[test]
    fn teardown_cancels_everything() {
        let mut s = surface();
        let mut e = engine(ScrollMode::Container, &mut s);
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        e.on_stack_complete(move || sink.set(sink.get() + 1));

        e.scroll_by(&mut s, 1100.0, InputKind::Wheel);
        e.teardown();
        assert!(!e.scheduler.is_pending());
        for _ in 0..200 {
            assert_eq!(e.frame(&mut s, FRAME), FrameOutcome::default());
        }
        assert_eq!(s.scroll_top(), 0.0);
        assert_eq!(hits.get(), 0);
        e.teardown();
    }
}
