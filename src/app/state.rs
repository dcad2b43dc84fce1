//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::engine::{FrameOutcome, StackEngine};
use crate::core::stack_config::{ConfigError, ScrollMode, StackConfig};
use crate::core::surface::Surface;
use crate::ui::layout::AppLayout;
use crate::ui::stack_view::StackView;

use super::deck::Deck;

/// Fraction of the viewport kept empty above the first card.
const LEADING_FRACTION: f64 = 0.2;
/// Cards are at least this fraction of the viewport tall, so the last one
/// has a pin window before the end marker releases the stack.
const MIN_CARD_FRACTION: f64 = 0.4;

/// Top-level application state.
pub struct AppState {
    /// Card content and wrapped text.
    pub deck: Deck,
    /// Natural geometry, scroll position and applied transforms.
    pub surface: Surface,
    pub engine: StackEngine,
    pub config: AppConfig,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Row of the last left-button drag position, for touch-style scrolling.
    pub drag_row: Option<u16>,
    /// Scrolling viewport inside the stack pane, from the last layout.
    pub viewport: Rect,
    /// Bumped by the stack-complete callback.
    completions: Rc<Cell<u64>>,
}

impl AppState {
    /// Lay the deck out for a terminal of size `area` and attach an engine.
    pub fn new(
        deck: Deck,
        config: AppConfig,
        sentinel: bool,
        area: Rect,
    ) -> Result<Self, ConfigError> {
        let mut deck = deck;
        let mut surface = Surface::new(deck.len(), config.stack.item_gap).with_sentinel(sentinel);
        let viewport = layout_surface(&mut deck, &mut surface, area);

        let completions = Rc::new(Cell::new(0));
        let engine = attach_engine(&config, config.stack.scroll_mode, &mut surface, &completions)?;

        Ok(Self {
            deck,
            surface,
            engine,
            config,
            should_quit: false,
            status_message: None,
            drag_row: None,
            viewport,
            completions,
        })
    }

    /// Terminal resized: rewrap cards, update the viewport and let the
    /// engine remeasure.
    pub fn relayout(&mut self, area: Rect) {
        self.viewport = layout_surface(&mut self.deck, &mut self.surface, area);
        self.engine.handle_resize(&self.surface);
    }

    /// Advance the engine by one repaint.
    pub fn frame(&mut self, dt: Duration) -> FrameOutcome {
        self.engine.frame(&mut self.surface, dt)
    }

    pub fn mode(&self) -> ScrollMode {
        self.engine.mode()
    }

    /// Replace the engine with one driven by the other scroll mode.  The
    /// scroll position carries over.
    pub fn toggle_mode(&mut self) -> Result<ScrollMode, ConfigError> {
        let next = self.engine.mode().toggled();
        let engine = attach_engine(&self.config, next, &mut self.surface, &self.completions)?;
        self.engine.teardown();
        self.engine = engine;
        tracing::info!(mode = next.label(), "scroll mode switched");
        Ok(next)
    }

    /// Append a sample card at the end of the deck.  The engine picks it up
    /// on the next frame.
    pub fn add_card(&mut self) -> usize {
        let card = Deck::sample_card(self.deck.len());
        let index = self.deck.push(card, &mut self.surface);
        self.engine.notify_layout_changed();
        index
    }

    /// How many times the stack has become complete.
    pub fn completions(&self) -> u64 {
        self.completions.get()
    }
}

fn attach_engine(
    config: &AppConfig,
    mode: ScrollMode,
    surface: &mut Surface,
    completions: &Rc<Cell<u64>>,
) -> Result<StackEngine, ConfigError> {
    let stack = StackConfig {
        scroll_mode: mode,
        ..config.stack.clone()
    };
    let mut engine = StackEngine::create(stack, config.inertia, surface)?;
    let counter = Rc::clone(completions);
    engine.on_stack_complete(move || counter.set(counter.get() + 1));
    Ok(engine)
}

/// Wrap cards to the pane width and size the surface to the pane.  Returns
/// the scrolling viewport.
fn layout_surface(deck: &mut Deck, surface: &mut Surface, area: Rect) -> Rect {
    let viewport = StackView::viewport(AppLayout::from_area(area).stack_area);
    let extent = f64::from(viewport.height);

    let min_height = (extent * MIN_CARD_FRACTION).round() as usize;
    deck.layout(surface, StackView::card_width(viewport), min_height);
    surface.set_viewport(extent);
    // Room below the end marker so the whole deck can scroll out of view.
    surface.set_padding((extent * LEADING_FRACTION).round(), extent);
    viewport
}
