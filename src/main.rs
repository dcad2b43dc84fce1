//! Scroll-driven card stacking in the terminal.
//!
//! Run the binary to scroll through a deck of cards that pin, shrink and
//! fade as they pile up.  Run with `--print-config` to dump the effective
//! configuration, or `--dump-at <ROWS>` to print the transforms computed
//! for a scroll offset without opening the TUI.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr, Stderr};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::time::MissedTickBehavior;

use crate::app::{
    deck::Deck,
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use crate::core::stack_config::ScrollMode;
use crate::ui::{layout::AppLayout, stack_view::StackView, theme::Theme};

/// Longest frame step fed to the engine; a stalled loop shouldn't teleport
/// the inertial scroll.
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

/// Terminal size assumed by `--dump-at`.
const DUMP_AREA: Rect = Rect {
    x: 0,
    y: 0,
    width: 80,
    height: 24,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Scroll-driven card stacking in the terminal")]
struct Cli {
    /// Scroll model: `container` (inertial) or `window` (immediate).
    /// Overrides the config file.
    #[arg(long)]
    mode: Option<ScrollMode>,

    /// Number of generated sample cards.
    #[arg(long, default_value_t = 6)]
    cards: usize,

    /// Read cards from a file instead; cards are separated by `---` lines.
    #[arg(long = "cards-file", value_name = "PATH")]
    cards_file: Option<PathBuf>,

    /// Leave out the end marker: cards stay pinned forever.
    #[arg(long = "no-sentinel")]
    no_sentinel: bool,

    /// Print the effective configuration and exit.
    #[arg(long = "print-config")]
    print_config: bool,

    /// Print the transform of every card at this scroll offset (rows) and exit.
    #[arg(long = "dump-at", value_name = "ROWS")]
    dump_at: Option<f64>,
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (only in debug builds / when RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    let mut user_config = config::AppConfig::load();
    if let Some(mode) = cli.mode {
        user_config.stack.scroll_mode = mode;
    }

    if cli.print_config {
        print!("{}", user_config.serialise());
        return Ok(());
    }

    let deck = match &cli.cards_file {
        Some(path) => Deck::load(path)?,
        None => Deck::generated(cli.cards),
    };
    let sentinel = !cli.no_sentinel;

    // ── headless dump ─────────────────────────────────────────
    if let Some(offset) = cli.dump_at {
        user_config.stack.scroll_mode = ScrollMode::Window;
        let mut state = AppState::new(deck, user_config, sentinel, DUMP_AREA)
            .context("invalid stack configuration")?;
        state.engine.scroll_to(&mut state.surface, offset);
        let applied = state.surface.scroll_top();
        println!("# scroll offset {applied} of {}", state.surface.max_scroll());
        let transforms = state.engine.compute_transforms(&state.surface);
        for (index, transform) in transforms.iter().enumerate() {
            println!("{index}: {}", transform.to_inline_style());
        }
        return Ok(());
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let area = Rect::new(0, 0, size.width, size.height);
    let result = match AppState::new(deck, user_config, sentinel, area) {
        Ok(mut state) => {
            let outcome = run(&mut terminal, &mut state).await;
            tracing::info!(
                stats = ?state.engine.stats(),
                measure_passes = state.engine.measure_passes(),
                completions = state.completions(),
                "exiting"
            );
            outcome
        }
        Err(e) => Err(anyhow::Error::new(e).context("invalid stack configuration")),
    };

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

// ───────────────────────────────────────── event loop ───────

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    state: &mut AppState,
) -> Result<()> {
    let mut events = spawn_event_reader(Duration::from_millis(100));
    let mut clock = tokio::time::interval(Duration::from_millis(state.config.frame_ms));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|frame| draw(frame, state))?;
            dirty = false;
        }

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(state, m),
                    // The terminal itself resizes on the next draw.
                    AppEvent::Resize(w, h) => state.relayout(Rect::new(0, 0, w, h)),
                }
                // Status line and mode may change without a frame.
                dirty = true;
            }

            _ = clock.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).min(MAX_FRAME_STEP);
                last_frame = now;

                let outcome = state.frame(dt);
                if outcome.completed {
                    state.status_message = Some("Stack complete".into());
                }
                dirty |= outcome.scrolled || outcome.writes > 0 || outcome.completed;
            }
        }

        if state.should_quit {
            break;
        }
    }

    state.engine.teardown();
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState) {
    let layout = AppLayout::from_area(frame.area());

    let title = format!("card-stack · {} cards", state.deck.len());
    let view = StackView::new(&state.deck, &state.surface, &title)
        .top_of_stack(state.engine.top_of_stack())
        .complete(state.engine.is_complete());
    frame.render_widget(view, layout.stack_area);

    // Hint / message on the left, scroll telemetry on the right.
    let metrics = status_metrics(state);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(metrics.chars().count() as u16),
        ])
        .split(layout.status_area);

    let hint = state.config.status_bar_hint();
    let message = state.status_message.as_deref().unwrap_or(&hint);
    frame.render_widget(
        Paragraph::new(message).style(Theme::status_bar_style()),
        chunks[0],
    );
    let metrics_style = if state.engine.is_complete() {
        Theme::complete_style()
    } else {
        Theme::status_bar_style()
    };
    frame.render_widget(Paragraph::new(metrics).style(metrics_style), chunks[1]);
}

fn status_metrics(state: &AppState) -> String {
    let scroll = state.engine.scroll_state(&state.surface);
    let top = state
        .engine
        .top_of_stack()
        .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
    let mut text = format!(
        " {} · {:.0}/{:.0} · top {} ",
        state.mode().label(),
        scroll.scroll_offset,
        state.surface.max_scroll(),
        top,
    );
    if state.engine.is_complete() {
        text.push_str("· ✓ complete ");
    }
    text
}
