//! The item container: one card, painted with its stack transform.
//!
//! Terminals can't scale or blur, so the transform is approximated:
//!
//! * `translate_y` moves the card by whole rows,
//! * `scale` shrinks width and height around the [`TransformOrigin`],
//! * `rotation` leans the card sideways, one column per degree,
//! * `blur` fades the card through progressively dimmer styles.
//!
//! Every card clears the cells it covers before drawing, so later cards
//! hide the ones under them.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::core::transform::ItemTransform;
use crate::ui::theme::Theme;

/// Anchor point scaling is applied around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformOrigin {
    /// Top edge stays put; the card shrinks toward the horizontal centre.
    #[default]
    TopCenter,
}

impl TransformOrigin {
    /// Horizontal and vertical anchor as fractions of the card size.
    fn anchor(self) -> (f64, f64) {
        match self {
            TransformOrigin::TopCenter => (0.5, 0.0),
        }
    }
}

/// A card before placement.
#[derive(Debug, Clone)]
pub struct StackItem<'a> {
    title: &'a str,
    lines: &'a [String],
    transform: ItemTransform,
    origin: TransformOrigin,
    style: Style,
    focused: bool,
}

/// Where a card lands in the pane, after transform and clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Visible part of the card.
    pub rect: Rect,
    pub top_clipped: bool,
    pub bottom_clipped: bool,
    /// Body rows hidden above the pane.
    pub content_skip: u16,
}

impl<'a> StackItem<'a> {
    pub fn new(title: &'a str, lines: &'a [String], transform: ItemTransform) -> Self {
        Self {
            title,
            lines,
            transform,
            origin: TransformOrigin::default(),
            style: Style::default(),
            focused: false,
        }
    }

    /// Extra style patched over the border; the caller's styling hook.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Mark the card as the top of the stack.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Resolve on-screen geometry.
    ///
    /// `natural_top` is the card's untransformed top edge in rows relative
    /// to `pane.y` (scroll already subtracted), `height` its natural height
    /// and `width` its natural width, centred in `pane`.  Returns `None`
    /// when fewer than two rows would be visible.
    pub fn place(
        self,
        natural_top: f64,
        height: f64,
        width: u16,
        pane: Rect,
    ) -> Option<PlacedItem<'a>> {
        let placement = placement(&self.transform, self.origin, natural_top, height, width, pane)?;
        Some(PlacedItem {
            item: self,
            placement,
        })
    }
}

fn placement(
    t: &ItemTransform,
    origin: TransformOrigin,
    natural_top: f64,
    height: f64,
    width: u16,
    pane: Rect,
) -> Option<Placement> {
    let (ax, ay) = origin.anchor();
    let scale = t.scale.max(0.0);
    let full_w = f64::from(width.min(pane.width));

    let w = (full_w * scale).round();
    let h = (height * scale).round();
    // Anchored point keeps its position; the rest moves toward it.
    let left = (f64::from(pane.width) - full_w) / 2.0 + (full_w - w) * ax + t.rotation;
    let top = natural_top + t.translate_y + (height - h) * ay;

    let w = w as i32;
    let max_x = i32::from(pane.width) - w;
    if w < 4 || max_x < 0 {
        return None;
    }
    let x = i32::from(pane.x) + (left.round() as i32).clamp(0, max_x);

    let pane_top = i32::from(pane.y);
    let pane_bottom = pane_top + i32::from(pane.height);
    let abs_y = pane_top + top.round() as i32;
    let abs_bottom = abs_y + h as i32;
    if abs_bottom <= pane_top || abs_y >= pane_bottom {
        return None;
    }

    let vis_y = abs_y.max(pane_top);
    let vis_h = abs_bottom.min(pane_bottom) - vis_y;
    if vis_h < 2 {
        return None;
    }

    let top_clipped = abs_y < pane_top;
    // The hidden border row isn't body content.
    let content_skip = if top_clipped {
        (pane_top - abs_y - 1).max(0) as u16
    } else {
        0
    };

    Some(Placement {
        rect: Rect::new(x as u16, vis_y as u16, w as u16, vis_h as u16),
        top_clipped,
        bottom_clipped: abs_bottom > pane_bottom,
        content_skip,
    })
}

/// A card with resolved geometry, ready to draw.
#[derive(Debug, Clone)]
pub struct PlacedItem<'a> {
    item: StackItem<'a>,
    placement: Placement,
}

impl Widget for PlacedItem<'_> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let Placement {
            rect,
            top_clipped,
            bottom_clipped,
            content_skip,
        } = self.placement;
        let item = self.item;
        let blur = item.transform.blur;

        let (border_style, title_style, body_style) = if item.focused {
            (
                Theme::top_card_style(),
                Theme::top_card_style().add_modifier(Modifier::BOLD),
                Theme::card_body_style(),
            )
        } else if blur > 0.0 {
            let faded = Theme::blurred_style(blur);
            (faded, faded, faded)
        } else {
            (
                Theme::card_border_style(),
                Theme::card_title_style(),
                Theme::card_body_style(),
            )
        };

        Clear.render(rect, buf);

        // Omit top/bottom borders on clipped edges.
        let borders = match (top_clipped, bottom_clipped) {
            (true, true) => Borders::LEFT | Borders::RIGHT,
            (true, false) => Borders::LEFT | Borders::RIGHT | Borders::BOTTOM,
            (false, true) => Borders::LEFT | Borders::RIGHT | Borders::TOP,
            (false, false) => Borders::ALL,
        };
        let mut block = Block::default()
            .borders(borders)
            .border_style(border_style.patch(item.style));
        if !top_clipped {
            block = block.title(Span::styled(format!(" {} ", item.title), title_style));
        }
        block.render(rect, buf);

        let top_inset: u16 = if top_clipped { 0 } else { 1 };
        let bot_inset: u16 = if bottom_clipped { 0 } else { 1 };
        let content = Rect::new(
            rect.x.saturating_add(2),
            rect.y.saturating_add(top_inset),
            rect.width.saturating_sub(4),
            rect.height.saturating_sub(top_inset + bot_inset),
        );
        if content.width == 0 || content.height == 0 {
            return;
        }

        let body: Vec<Line> = item
            .lines
            .iter()
            .map(|l| Line::from(Span::styled(l.as_str(), body_style)))
            .collect();
        Paragraph::new(body)
            .scroll((content_skip, 0))
            .render(content, buf);
    }
}
