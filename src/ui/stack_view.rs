//! Stack pane: paints every card of the surface at its applied transform.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

use crate::app::deck::Deck;
use crate::core::surface::{Element, Surface};
use crate::core::transform::ItemTransform;
use crate::ui::stack_item::StackItem;
use crate::ui::theme::Theme;

/// Cards never grow wider than this, however wide the terminal.
const MAX_CARD_WIDTH: u16 = 72;

pub struct StackView<'a> {
    deck: &'a Deck,
    surface: &'a Surface,
    top_of_stack: Option<usize>,
    complete: bool,
    title: &'a str,
}

impl<'a> StackView<'a> {
    pub fn new(deck: &'a Deck, surface: &'a Surface, title: &'a str) -> Self {
        Self {
            deck,
            surface,
            top_of_stack: None,
            complete: false,
            title,
        }
    }

    pub fn top_of_stack(mut self, index: Option<usize>) -> Self {
        self.top_of_stack = index;
        self
    }

    /// Highlight the last card while the whole stack is pinned.
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    fn block(title: &str) -> Block<'_> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::card_border_style())
            .title(Span::styled(format!(" {title} "), Theme::title_style()))
    }

    /// The scrolling viewport inside the pane border.
    pub fn viewport(area: Rect) -> Rect {
        Self::block("").inner(area)
    }

    /// Natural card width for a viewport (scrollbar column excluded).
    pub fn card_width(viewport: Rect) -> u16 {
        viewport.width.saturating_sub(3).min(MAX_CARD_WIDTH)
    }
}

impl Widget for StackView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::block(self.title).render(area, buf);
        let viewport = Self::viewport(area);
        if viewport.width < 6 || viewport.height < 2 {
            return;
        }

        // Leave the last column to the scrollbar.
        let pane = Rect {
            width: viewport.width - 1,
            ..viewport
        };
        let width = Self::card_width(viewport);
        let scroll = self.surface.scroll_top();
        let last = self.surface.len().checked_sub(1);

        // Later cards paint over earlier ones.
        for index in 0..self.surface.len() {
            let (Some(top), Some(height), Some(card)) = (
                self.surface.offset_top(Element::Item(index)),
                self.surface.item_height(index),
                self.deck.card(index),
            ) else {
                continue;
            };
            let transform = self
                .surface
                .presentation(index)
                .unwrap_or(ItemTransform::IDENTITY);

            let mut item = StackItem::new(&card.title, self.deck.lines(index), transform)
                .focused(self.top_of_stack == Some(index));
            if self.complete && last == Some(index) {
                item = item.style(Theme::completed_card_style());
            }
            if let Some(placed) = item.place(top - scroll, height, width, pane) {
                placed.render(pane, buf);
            }
        }

        if let Some(sentinel) = self.surface.offset_top(Element::Sentinel) {
            render_end_marker(pane, (sentinel - scroll).round(), buf);
        }

        render_scrollbar(
            viewport,
            self.surface.content_height(),
            scroll,
            f64::from(viewport.height),
            buf,
        );
    }
}

/// The release line below the last card.
fn render_end_marker(pane: Rect, rel_y: f64, buf: &mut Buffer) {
    if rel_y < 0.0 || rel_y >= f64::from(pane.height) {
        return;
    }
    let y = pane.y + rel_y as u16;
    let label = "· end of stack ·";
    let pad = usize::from(pane.width).saturating_sub(label.chars().count()) / 2;
    Paragraph::new(format!("{}{label}", " ".repeat(pad)))
        .style(Style::default().fg(Color::DarkGray))
        .render(Rect::new(pane.x, y, pane.width, 1), buf);
}

fn render_scrollbar(area: Rect, total: f64, offset: f64, visible: f64, buf: &mut Buffer) {
    if total <= visible || area.height < 2 || area.width == 0 {
        return;
    }
    let x = area.x + area.width.saturating_sub(1);
    let h = f64::from(area.height);
    let thumb_sz = ((visible / total) * h).ceil().max(1.0) as u16;
    let max_off = total - visible;
    let thumb_pos = ((offset / max_off).clamp(0.0, 1.0) * (h - f64::from(thumb_sz))).round() as u16;

    for row in 0..area.height {
        let y = area.y + row;
        let is_thumb = row >= thumb_pos && row < thumb_pos + thumb_sz;
        let (ch, fg) = if is_thumb {
            ('█', Color::LightBlue)
        } else {
            ('│', Color::DarkGray)
        };
        if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
            cell.set_char(ch).set_fg(fg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::deck::Card;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn fixture() -> (Deck, Surface, Rect) {
        let area = Rect::new(0, 0, 40, 20);
        let viewport = StackView::viewport(area);
        let mut deck = Deck::new(vec![
            Card::new("First", "one"),
            Card::new("Second", "two"),
        ]);
        let mut surface = Surface::new(2, 1.0);
        surface.set_padding(2.0, 30.0);
        deck.layout(&mut surface, StackView::card_width(viewport), 0);
        surface.set_viewport(f64::from(viewport.height));
        (deck, surface, area)
    }

    #[test]
    fn paints_cards_at_natural_offsets() {
        let (deck, surface, area) = fixture();
        let mut buf = Buffer::empty(area);
        StackView::new(&deck, &surface, "stack").render(area, &mut buf);

        assert!(row(&buf, 0).contains(" stack "));
        // Pane starts at row 1; leading padding of 2 rows.
        assert!(row(&buf, 3).contains(" First "));
        assert!(row(&buf, 4).contains("one"));
        assert!(row(&buf, 7).contains(" Second "));
        // Sentinel directly under the last card.
        assert!(row(&buf, 10).contains("end of stack"));
    }

    #[test]
    fn applied_transforms_move_cards() {
        let (deck, mut surface, area) = fixture();
        surface.apply_transform(
            1,
            ItemTransform {
                translate_y: -2.0,
                ..ItemTransform::IDENTITY
            },
        );
        let mut buf = Buffer::empty(area);
        StackView::new(&deck, &surface, "stack")
            .top_of_stack(Some(1))
            .render(area, &mut buf);
        assert!(row(&buf, 5).contains(" Second "));
        assert_eq!(buf[(3, 5)].fg, Theme::top_card_style().fg.unwrap_or(Color::Reset));
    }

    #[test]
    fn complete_stack_highlights_the_last_card() {
        let (deck, surface, area) = fixture();
        let mut buf = Buffer::empty(area);
        StackView::new(&deck, &surface, "stack")
            .complete(true)
            .render(area, &mut buf);
        // Left border of the second card.
        assert_eq!(buf[(2, 8)].fg, Color::LightGreen);
        assert_ne!(buf[(2, 4)].fg, Color::LightGreen);
    }

    #[test]
    fn scrollbar_tracks_offset() {
        let (deck, mut surface, area) = fixture();
        let mut buf = Buffer::empty(area);
        StackView::new(&deck, &surface, "s").render(area, &mut buf);
        assert_eq!(buf[(38, 1)].symbol(), "█");

        let bottom = surface.max_scroll();
        surface.set_scroll_top(bottom);
        let mut buf = Buffer::empty(area);
        StackView::new(&deck, &surface, "s").render(area, &mut buf);
        assert_eq!(buf[(38, 18)].symbol(), "█");
        assert_eq!(buf[(38, 1)].symbol(), "│");
    }
}
