//! Stack configuration: the knobs that shape the stacking effect.
//!
//! A [`StackConfig`] is plain data: it can be parsed from the config file,
//! printed back, and cloned freely.  It is validated once when an engine is
//! created; nothing re-checks it per frame.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ───────────────────────────────────────── errors ────────────

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("`base_scale` must be greater than zero, got {0}")]
    BaseScale(f64),

    #[error("invalid position `{0}` (expected a number or a percentage like `20%`)")]
    InvalidPosition(String),

    #[error("unknown scroll mode `{0}` (expected `container` or `window`)")]
    InvalidScrollMode(String),

    #[error("`{0}` is not a number")]
    NotANumber(String),

    #[error("`{0}` is not a whole number")]
    NotAWholeNumber(String),

    #[error("no valid key in binding list `{0}`")]
    EmptyBinding(String),
}

// ───────────────────────────────────────── position ──────────

/// A viewport-relative offset: either absolute units or a percentage of the
/// viewport extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StackPosition {
    Px(f64),
    Percent(f64),
}

impl StackPosition {
    /// Resolve against the current viewport extent.
    pub fn resolve(self, viewport_extent: f64) -> f64 {
        match self {
            StackPosition::Px(v) => v,
            StackPosition::Percent(p) => p / 100.0 * viewport_extent,
        }
    }

    fn raw(self) -> f64 {
        match self {
            StackPosition::Px(v) | StackPosition::Percent(v) => v,
        }
    }
}

impl FromStr for StackPosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_matches('"');
        let invalid = || ConfigError::InvalidPosition(s.to_string());
        let position = match s.strip_suffix('%') {
            Some(pct) => StackPosition::Percent(pct.trim().parse().map_err(|_| invalid())?),
            None => StackPosition::Px(s.trim_end_matches("px").parse().map_err(|_| invalid())?),
        };
        if !position.raw().is_finite() {
            return Err(invalid());
        }
        Ok(position)
    }
}

impl fmt::Display for StackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackPosition::Px(v) => write!(f, "{v}"),
            StackPosition::Percent(p) => write!(f, "{p}%"),
        }
    }
}

// ───────────────────────────────────────── scroll mode ───────

/// Which scroll model feeds the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollMode {
    /// The stack owns its scroll position and eases it with inertia.
    #[default]
    Container,
    /// The host's native scroll position is used as-is.
    Window,
}

impl ScrollMode {
    pub fn label(self) -> &'static str {
        match self {
            ScrollMode::Container => "container",
            ScrollMode::Window => "window",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ScrollMode::Container => ScrollMode::Window,
            ScrollMode::Window => ScrollMode::Container,
        }
    }
}

impl FromStr for ScrollMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"').to_lowercase().as_str() {
            "container" => Ok(ScrollMode::Container),
            "window" => Ok(ScrollMode::Window),
            other => Err(ConfigError::InvalidScrollMode(other.to_string())),
        }
    }
}

// ───────────────────────────────────────── config ────────────

/// Geometry and styling parameters of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// Space inserted after every item except the last.
    pub item_gap: f64,
    /// Scale increment per item index once fully stacked.
    pub item_scale_step: f64,
    /// Vertical offset stacked per item index.
    pub item_stack_offset: f64,
    /// Where an item starts pinning, relative to the viewport top.
    pub stack_trigger_position: StackPosition,
    /// Where an item finishes scaling, relative to the viewport top.
    pub scale_end_position: StackPosition,
    /// Scale of the frontmost item once fully stacked.
    pub base_scale: f64,
    /// Degrees of rotation per item index at full scale progress.
    pub rotation_step: f64,
    /// Blur per level of stacking depth.
    pub blur_step: f64,
    pub scroll_mode: ScrollMode,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            item_gap: 100.0,
            item_scale_step: 0.03,
            item_stack_offset: 30.0,
            stack_trigger_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: 0.85,
            rotation_step: 0.0,
            blur_step: 0.0,
            scroll_mode: ScrollMode::Container,
        }
    }
}

impl StackConfig {
    /// Check every field once, before any frame is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let numbers = [
            ("item_gap", self.item_gap),
            ("item_scale_step", self.item_scale_step),
            ("item_stack_offset", self.item_stack_offset),
            ("stack_trigger_position", self.stack_trigger_position.raw()),
            ("scale_end_position", self.scale_end_position.raw()),
            ("base_scale", self.base_scale),
            ("rotation_step", self.rotation_step),
            ("blur_step", self.blur_step),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        for (field, value) in [
            ("item_gap", self.item_gap),
            ("item_stack_offset", self.item_stack_offset),
            ("blur_step", self.blur_step),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.base_scale <= 0.0 {
            return Err(ConfigError::BaseScale(self.base_scale));
        }
        Ok(())
    }

    /// Target scale of item `index` once it is fully stacked.
    pub fn target_scale(&self, index: usize) -> f64 {
        self.base_scale + index as f64 * self.item_scale_step
    }
}
