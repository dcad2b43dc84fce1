//! Input handling: maps key/mouse events to scroll input and state mutations.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::config::Action;
use crate::core::inertia::InputKind;

use super::state::AppState;

/// Fraction of the viewport one page key moves.
const PAGE_FRACTION: f64 = 0.8;

/// Process a key event through the configurable bindings.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Only process Press events (ignore Release/Repeat on supported terminals).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Ctrl+c always quits, whatever the bindings say.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;

    let line = state.config.line_step;
    let page = (state.surface.viewport() * PAGE_FRACTION).round().max(1.0);

    match action {
        Action::ScrollUp => key_scroll(state, -line),
        Action::ScrollDown => key_scroll(state, line),
        Action::PageUp => key_scroll(state, -page),
        Action::PageDown => key_scroll(state, page),
        Action::Top => state.engine.scroll_to(&mut state.surface, 0.0),
        Action::Bottom => {
            let bottom = state.surface.max_scroll();
            state.engine.scroll_to(&mut state.surface, bottom);
        }
        Action::ToggleMode => {
            state.status_message = Some(match state.toggle_mode() {
                Ok(mode) => format!("Scroll mode: {}", mode.label()),
                Err(e) => format!("Mode switch failed: {e}"),
            });
        }
        Action::AddCard => {
            let index = state.add_card();
            state.status_message = Some(format!("Added card {}", index + 1));
        }
        Action::Quit => state.should_quit = true,
    }
}

fn key_scroll(state: &mut AppState, delta: f64) {
    state
        .engine
        .scroll_by(&mut state.surface, delta, InputKind::Keyboard);
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.  The wheel scrolls; dragging with the left button
/// scrolls like a touch screen, content following the pointer.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let wheel = state.config.wheel_step;

    match mouse.kind {
        MouseEventKind::ScrollDown if in_rect(state.viewport, mouse) => {
            state.engine.scroll_by(&mut state.surface, wheel, InputKind::Wheel);
        }
        MouseEventKind::ScrollUp if in_rect(state.viewport, mouse) => {
            state.engine.scroll_by(&mut state.surface, -wheel, InputKind::Wheel);
        }
        MouseEventKind::Down(MouseButton::Left) if in_rect(state.viewport, mouse) => {
            state.drag_row = Some(mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(previous) = state.drag_row else {
                return;
            };
            let delta = f64::from(previous) - f64::from(mouse.row);
            if delta != 0.0 {
                state.engine.scroll_by(&mut state.surface, delta, InputKind::Touch);
            }
            state.drag_row = Some(mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => state.drag_row = None,
        _ => {}
    }
}

fn in_rect(rect: Rect, mouse: MouseEvent) -> bool {
    mouse.column >= rect.x
        && mouse.column < rect.x.saturating_add(rect.width)
        && mouse.row >= rect.y
        && mouse.row < rect.y.saturating_add(rect.height)
}
