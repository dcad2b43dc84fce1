//! Scroll source adapters.
//!
//! The engine doesn't care whether the stack scrolls with the host
//! ("window" mode) or owns an inertial scroll of its own ("container" mode).
//! Both expose the same [`ScrollSource`] surface: current scroll state,
//! element baselines, scroll listeners, and raw input entry points.

use std::time::Duration;

use super::inertia::{Inertia, InertiaConfig, InputKind};
use super::stack_config::ScrollMode;
use super::surface::{Element, Surface};

/// Scroll offset and viewport extent, as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub scroll_offset: f64,
    pub viewport_extent: f64,
}

/// Handle returned by [`ScrollSource::on_scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type ScrollListener = Box<dyn FnMut(ScrollState)>;

/// Registered scroll callbacks.
#[derive(Default)]
pub struct ScrollListeners {
    next_id: u64,
    entries: Vec<(ListenerId, ScrollListener)>,
}

impl ScrollListeners {
    pub fn add(&mut self, listener: ScrollListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn notify(&mut self, state: ScrollState) {
        for (_, listener) in &mut self.entries {
            listener(state);
        }
    }
}

impl std::fmt::Debug for ScrollListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollListeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Uniform view over a scroll model.
pub trait ScrollSource: std::fmt::Debug {
    fn mode(&self) -> ScrollMode;

    fn scroll_state(&self, surface: &Surface) -> ScrollState {
        ScrollState {
            scroll_offset: surface.scroll_top(),
            viewport_extent: surface.viewport(),
        }
    }

    /// Natural offset of `element` from the scrollable origin.  Returns 0
    /// when the element isn't laid out yet; callers retry later.
    fn element_baseline(&self, surface: &Surface, element: Element) -> f64;

    fn on_scroll(&mut self, listener: ScrollListener) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// Raw relative input (wheel notch, drag, arrow key).
    fn scroll_by(&mut self, surface: &mut Surface, delta: f64, kind: InputKind);

    /// Absolute jump request (Home / End).
    fn scroll_to(&mut self, surface: &mut Surface, offset: f64);

    /// Per-frame hook.  Returns `true` when the scroll position moved.
    fn advance(&mut self, surface: &mut Surface, dt: Duration) -> bool;

    /// Drop all listeners and stop any driver.
    fn teardown(&mut self);
}

/// Build the adapter for `mode`, starting from the surface's current
/// scroll position.
pub fn for_mode(
    mode: ScrollMode,
    inertia: InertiaConfig,
    surface: &Surface,
) -> Box<dyn ScrollSource> {
    match mode {
        ScrollMode::Window => Box::new(WindowScroll::default()),
        ScrollMode::Container => Box::new(ContainerScroll::new(inertia, surface)),
    }
}

// ───────────────────────────────────────── window ────────────

/// Native host scrolling: input moves the scroll position immediately.
#[derive(Debug, Default)]
pub struct WindowScroll {
    listeners: ScrollListeners,
}

impl WindowScroll {
    fn moved(&mut self, surface: &Surface, before: f64) {
        if surface.scroll_top() != before {
            let state = self.scroll_state(surface);
            self.listeners.notify(state);
        }
    }
}

impl ScrollSource for WindowScroll {
    fn mode(&self) -> ScrollMode {
        ScrollMode::Window
    }

    fn element_baseline(&self, surface: &Surface, element: Element) -> f64 {
        // Document-relative top: painted position plus current scroll.
        surface
            .bounding_top(element)
            .map_or(0.0, |top| top + surface.scroll_top())
    }

    fn on_scroll(&mut self, listener: ScrollListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn scroll_by(&mut self, surface: &mut Surface, delta: f64, _kind: InputKind) {
        let before = surface.scroll_top();
        surface.set_scroll_top(before + delta);
        self.moved(surface, before);
    }

    fn scroll_to(&mut self, surface: &mut Surface, offset: f64) {
        let before = surface.scroll_top();
        surface.set_scroll_top(offset);
        self.moved(surface, before);
    }

    fn advance(&mut self, _surface: &mut Surface, _dt: Duration) -> bool {
        false
    }

    fn teardown(&mut self) {
        self.listeners.clear();
    }
}

// ───────────────────────────────────────── container ─────────

/// Self-owned scrolling with an inertial driver.  Listeners hear about the
/// smoothed position, once per frame that actually moved.
#[derive(Debug)]
pub struct ContainerScroll {
    inertia: Inertia,
    listeners: ScrollListeners,
}

impl ContainerScroll {
    pub fn new(config: InertiaConfig, surface: &Surface) -> Self {
        let mut inertia = Inertia::new(config);
        inertia.set_limit(surface.max_scroll());
        inertia.jump_to(surface.scroll_top());
        Self {
            inertia,
            listeners: ScrollListeners::default(),
        }
    }
}

impl ScrollSource for ContainerScroll {
    fn mode(&self) -> ScrollMode {
        ScrollMode::Container
    }

    fn element_baseline(&self, surface: &Surface, element: Element) -> f64 {
        surface.offset_top(element).unwrap_or(0.0)
    }

    fn on_scroll(&mut self, listener: ScrollListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn scroll_by(&mut self, surface: &mut Surface, delta: f64, kind: InputKind) {
        self.inertia.set_limit(surface.max_scroll());
        self.inertia.push(delta, kind);
        tracing::trace!(delta, ?kind, goal = self.inertia.target(), "container scroll input");
    }

    fn scroll_to(&mut self, surface: &mut Surface, offset: f64) {
        self.inertia.set_limit(surface.max_scroll());
        self.inertia.set_target(offset);
    }

    fn advance(&mut self, surface: &mut Surface, dt: Duration) -> bool {
        // Layout may have changed under us (resize, new items).
        self.inertia.set_limit(surface.max_scroll());
        if (surface.scroll_top() - self.inertia.position()).abs() > f64::EPSILON
            && !self.inertia.is_animating()
        {
            self.inertia.jump_to(surface.scroll_top());
        }

        let Some(position) = self.inertia.tick(dt) else {
            return false;
        };
        surface.set_scroll_top(position);
        let state = self.scroll_state(surface);
        self.listeners.notify(state);
        true
    }

    fn teardown(&mut self) {
        self.inertia.stop();
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::transform::ItemTransform;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn surface() -> Surface {
        let mut s = Surface::new(3, 20.0);
        s.set_padding(40.0, 300.0);
        for i in 0..3 {
            s.set_item_height(i, 200.0);
        }
        s.set_viewport(300.0);
        s
    }

    fn recorder(source: &mut dyn ScrollSource) -> Rc<RefCell<Vec<f64>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        source.on_scroll(Box::new(move |state| sink.borrow_mut().push(state.scroll_offset)));
        seen
    }

    #[test]
    fn window_scroll_is_immediate() {
        let mut s = surface();
        let mut source = WindowScroll::default();
        let seen = recorder(&mut source);

        source.scroll_by(&mut s, 120.0, InputKind::Wheel);
        assert_eq!(s.scroll_top(), 120.0);
        assert_eq!(*seen.borrow(), vec![120.0]);

        // Clamped at the top: no movement, no notification.
        source.scroll_to(&mut s, 0.0);
        source.scroll_by(&mut s, -10.0, InputKind::Wheel);
        assert_eq!(*seen.borrow(), vec![120.0, 0.0]);
        assert!(!source.advance(&mut s, FRAME));
    }

    #[test]
    fn window_baseline_is_document_relative() {
        let mut s = surface();
        s.set_scroll_top(100.0);
        let source = WindowScroll::default();
        assert_eq!(source.element_baseline(&s, Element::Item(1)), 260.0);
        assert_eq!(source.element_baseline(&s, Element::Sentinel), 680.0);

        // A painted translation leaks into the reading.
        s.apply_transform(
            1,
            ItemTransform {
                translate_y: 50.0,
                ..ItemTransform::IDENTITY
            },
        );
        assert_eq!(source.element_baseline(&s, Element::Item(1)), 310.0);
    }

    #[test]
    fn container_baseline_ignores_presentation() {
        let mut s = surface();
        s.apply_transform(
            2,
            ItemTransform {
                translate_y: 80.0,
                ..ItemTransform::IDENTITY
            },
        );
        let source = ContainerScroll::new(InertiaConfig::default(), &s);
        assert_eq!(source.element_baseline(&s, Element::Item(2)), 480.0);
    }

    #[test]
    fn unmounted_baseline_reads_zero() {
        let s = Surface::new(2, 10.0);
        let source = ContainerScroll::new(InertiaConfig::default(), &s);
        assert_eq!(source.element_baseline(&s, Element::Item(1)), 0.0);
        assert_eq!(WindowScroll::default().element_baseline(&s, Element::Item(1)), 0.0);
    }

    #[test]
    fn container_notifies_with_smoothed_positions() {
        let mut s = surface();
        let mut source = ContainerScroll::new(InertiaConfig::default(), &s);
        let seen = recorder(&mut source);

        source.scroll_by(&mut s, 100.0, InputKind::Wheel);
        assert_eq!(s.scroll_top(), 0.0, "input alone must not move the container");
        assert!(seen.borrow().is_empty());

        assert!(source.advance(&mut s, FRAME));
        let first = seen.borrow()[0];
        assert!(first > 0.0 && first < 100.0);
        assert_eq!(s.scroll_top(), first);

        while source.advance(&mut s, FRAME) {}
        assert_eq!(s.scroll_top(), 100.0);
    }

    #[test]
    fn teardown_silences_listeners_and_stops_driver() {
        let mut s = surface();
        let mut source = ContainerScroll::new(InertiaConfig::default(), &s);
        let seen = recorder(&mut source);
        source.scroll_by(&mut s, 100.0, InputKind::Wheel);
        source.teardown();
        assert!(!source.advance(&mut s, FRAME));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn listeners_can_be_removed() {
        let mut s = surface();
        let mut source = WindowScroll::default();
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        let id = source.on_scroll(Box::new(move |_| *sink.borrow_mut() += 1));
        source.scroll_by(&mut s, 10.0, InputKind::Keyboard);
        assert!(source.remove_listener(id));
        assert!(!source.remove_listener(id));
        source.scroll_by(&mut s, 10.0, InputKind::Keyboard);
        assert_eq!(*hits.borrow(), 1);
    }
}
