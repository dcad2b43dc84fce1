//! Card content: the items the stack is made of.
//!
//! A deck is either generated (`--cards N`) or read from a text file where
//! cards are separated by lines containing only `---`.  The first non-empty
//! line of each card is its title; the rest is the body.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::surface::Surface;

/// Rows taken by a card's top and bottom border.
const BORDER_ROWS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub body: String,
}

impl Card {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Body wrapped to `width` columns.  Paragraph breaks are kept; an
    /// empty body still occupies one row.
    pub fn wrap(&self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut lines: Vec<String> = self
            .body
            .lines()
            .flat_map(|paragraph| {
                if paragraph.trim().is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(paragraph, width)
                        .into_iter()
                        .map(|l| l.into_owned())
                        .collect()
                }
            })
            .collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

const SAMPLE_TEXT: &[(&str, &str)] = &[
    (
        "Pinning",
        "Each card scrolls normally until its top edge reaches the stack line, \
         then it stays put while the rest of the deck keeps moving.",
    ),
    (
        "Scaling",
        "Once pinned, a card shrinks a little as you keep scrolling, so the \
         cards below it peek out like the edges of a deck of cards.",
    ),
    (
        "Offsets",
        "Every card pins a few rows lower than the one before it.\n\nThat \
         stagger is what makes the stack readable.",
    ),
    (
        "Depth",
        "Cards buried under the top of the stack fade out, one step per card \
         of depth.",
    ),
    (
        "Release",
        "When the end marker scrolls into the stack zone every card is \
         released together and the whole deck scrolls away.",
    ),
    (
        "Inertia",
        "In container mode scrolling eases toward its target instead of \
         jumping.  Switch modes to compare.",
    ),
];

/// An ordered list of cards plus their wrapped bodies at the current width.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    lines: Vec<Vec<String>>,
    card_width: u16,
    min_height: usize,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    /// `count` sample cards.
    pub fn generated(count: usize) -> Self {
        Self::new((0..count).map(Self::sample_card).collect())
    }

    /// The sample card for position `index`.
    pub fn sample_card(index: usize) -> Card {
        let (title, body) = SAMPLE_TEXT[index % SAMPLE_TEXT.len()];
        Card::new(format!("{} · {}", index + 1, title), body)
    }

    /// Parse the `---`-separated text format.  Blank sections are skipped.
    pub fn parse(text: &str) -> Self {
        let mut cards = Vec::new();
        let mut section: Vec<&str> = Vec::new();

        let mut flush = |section: &mut Vec<&str>| {
            let mut lines = section.drain(..).skip_while(|l| l.trim().is_empty());
            if let Some(title) = lines.next() {
                let body: Vec<&str> = lines.collect();
                cards.push(Card::new(title.trim(), body.join("\n").trim_matches('\n')));
            }
        };

        for line in text.lines() {
            if line.trim() == "---" {
                flush(&mut section);
            } else {
                section.push(line);
            }
        }
        flush(&mut section);

        Self::new(cards)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading cards from {}", path.display()))?;
        let deck = Self::parse(&text);
        anyhow::ensure!(!deck.is_empty(), "{} contains no cards", path.display());
        Ok(deck)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Wrapped body of card `index` at the last laid-out width.
    pub fn lines(&self, index: usize) -> &[String] {
        self.lines.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a card and lay it out at the current width.
    pub fn push(&mut self, card: Card, surface: &mut Surface) -> usize {
        let index = surface.push_item();
        self.lines.push(card.wrap(inner_width(self.card_width)));
        surface.set_item_height(index, card_height(&self.lines[index], self.min_height));
        self.cards.push(card);
        index
    }

    /// Wrap every card to `card_width` columns (border included) and write
    /// the resulting heights, never less than `min_height` rows, into
    /// `surface`.
    pub fn layout(&mut self, surface: &mut Surface, card_width: u16, min_height: usize) {
        self.card_width = card_width;
        self.min_height = min_height;
        self.lines = self
            .cards
            .iter()
            .map(|c| c.wrap(inner_width(card_width)))
            .collect();
        for (index, lines) in self.lines.iter().enumerate() {
            surface.set_item_height(index, card_height(lines, min_height));
        }
    }
}

fn inner_width(card_width: u16) -> usize {
    usize::from(card_width.saturating_sub(4)).max(1)
}

fn card_height(lines: &[String], min_height: usize) -> f64 {
    (lines.len() + BORDER_ROWS).max(min_height) as f64
}
