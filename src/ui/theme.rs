//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme. Change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── cards ──────────────────────────────────────────────────
    pub fn card_border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn card_title_style() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn card_body_style() -> Style {
        Style::default().fg(Color::White)
    }

    /// The card currently on top of the stack.
    pub fn top_card_style() -> Style {
        Style::default().fg(Color::LightBlue)
    }

    /// The last card once the whole stack is pinned.
    pub fn completed_card_style() -> Style {
        Style::default().fg(Color::LightGreen)
    }

    /// Cards under the top of the stack, progressively defocused.
    pub fn blurred_style(blur: f64) -> Style {
        if blur < 1.0 {
            Style::default().fg(Color::Gray)
        } else if blur < 3.0 {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM)
        }
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn complete_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::LightGreen)
            .add_modifier(Modifier::BOLD)
    }
}
