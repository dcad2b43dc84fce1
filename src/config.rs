//! User configuration: stack geometry, scroll feel, keybindings.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/card-stack/config.toml` (default `~/.config/card-stack/config.toml`).
//! All distances are in terminal rows.

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::inertia::InertiaConfig;
use crate::core::stack_config::{ConfigError, ScrollMode, StackConfig, StackPosition};

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    ToggleMode,
    AddCard,
    Quit,
}

impl Action {
    /// Ordered list of all actions (config file order).
    pub const ALL: &[Action] = &[
        Action::ScrollUp,
        Action::ScrollDown,
        Action::PageUp,
        Action::PageDown,
        Action::Top,
        Action::Bottom,
        Action::ToggleMode,
        Action::AddCard,
        Action::Quit,
    ];

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::ToggleMode => "toggle_mode",
            Action::AddCard => "add_card",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code plus modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only CTRL/ALT/SHIFT are compared; platform modifiers are ignored.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Config-file form, e.g. `"Ctrl+d"`, `"PageDown"`, `"j"`.
    pub fn to_config_string(&self) -> String {
        let mut s = String::new();
        for (flag, prefix) in [
            (KeyModifiers::CONTROL, "Ctrl+"),
            (KeyModifiers::ALT, "Alt+"),
            (KeyModifiers::SHIFT, "Shift+"),
        ] {
            if self.modifiers.contains(flag) {
                s.push_str(prefix);
            }
        }
        let key = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::F(n) => format!("F{n}"),
            other => NAMED_KEYS
                .iter()
                .find(|(_, code)| *code == other)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("{other:?}")),
        };
        s.push_str(&key);
        s
    }

    /// Parse a key string like `"Ctrl+d"`, `"Up"`, `"g"`, `"Shift+G"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let (mods, key_part) = match s.rsplit_once('+') {
            // A bare "+" (or "Ctrl++") means the plus key itself.
            Some((m, "")) => (m.strip_suffix('+').unwrap_or(m), "+"),
            Some((m, k)) => (m, k),
            None => ("", s),
        };

        for part in mods.split('+').filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let lower = key_part.to_lowercase();
        let named = NAMED_KEYS
            .iter()
            .find(|(name, _)| name.to_lowercase() == lower);
        let code = if let Some((_, code)) = named {
            *code
        } else if lower == "space" {
            KeyCode::Char(' ')
        } else if let Some(n) = lower.strip_prefix('f').filter(|n| !n.is_empty()) {
            KeyCode::F(n.parse().ok()?)
        } else {
            let mut chars = key_part.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        };

        Some(KeyBind { code, modifiers })
    }
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("Backspace", KeyCode::Backspace),
    ("Delete", KeyCode::Delete),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
];

// ───────────────────────────────────────── config ────────────

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    pub stack: StackConfig,
    pub inertia: InertiaConfig,
    /// Rows per arrow-key press.
    pub line_step: f64,
    /// Rows per mouse-wheel notch.
    pub wheel_step: f64,
    /// Frame clock period.
    pub frame_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            stack: Self::default_stack(),
            inertia: InertiaConfig::default(),
            line_step: 2.0,
            wheel_step: 3.0,
            frame_ms: 16,
        }
    }
}

impl AppConfig {
    /// Stack geometry scaled down to terminal rows.
    pub fn default_stack() -> StackConfig {
        StackConfig {
            item_gap: 4.0,
            item_scale_step: 0.03,
            item_stack_offset: 2.0,
            stack_trigger_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: 0.85,
            rotation_step: 0.0,
            blur_step: 1.0,
            scroll_mode: ScrollMode::Container,
        }
    }

    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use KeyCode::{Char, Down, End, Esc, Home, Up};
        let n = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let mut m = HashMap::new();

        m.insert(
            Action::ScrollUp,
            vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)],
        );
        m.insert(
            Action::ScrollDown,
            vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)],
        );
        m.insert(
            Action::PageUp,
            vec![
                KeyBind::new(KeyCode::PageUp, n),
                KeyBind::new(Char('u'), ctrl),
            ],
        );
        m.insert(
            Action::PageDown,
            vec![
                KeyBind::new(KeyCode::PageDown, n),
                KeyBind::new(Char('d'), ctrl),
                KeyBind::new(Char(' '), n),
            ],
        );
        m.insert(
            Action::Top,
            vec![KeyBind::new(Home, n), KeyBind::new(Char('g'), n)],
        );
        m.insert(
            Action::Bottom,
            vec![
                KeyBind::new(End, n),
                KeyBind::new(Char('G'), KeyModifiers::SHIFT),
            ],
        );
        m.insert(Action::ToggleMode, vec![KeyBind::new(Char('m'), n)]);
        m.insert(Action::AddCard, vec![KeyBind::new(Char('a'), n)]);
        m.insert(
            Action::Quit,
            vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)],
        );

        m
    }

    /// Find the action bound to a key event.  The binding with the most
    /// modifiers wins when several match.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<(Action, u32)> = None;
        for (&action, binds) in &self.bindings {
            for bind in binds.iter().filter(|b| b.matches(event)) {
                let mc = bind.modifiers.bits().count_ones();
                if best.map_or(true, |(_, count)| mc > count) {
                    best = Some((action, mc));
                }
            }
        }
        best.map(|(action, _)| action)
    }

    /// Short display of the first binding (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].to_config_string(),
            _ => "?".into(),
        }
    }

    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: scroll | {}: mode | {}: add card | {}: quit",
            self.short_binding(Action::ScrollUp),
            self.short_binding(Action::ScrollDown),
            self.short_binding(Action::ToggleMode),
            self.short_binding(Action::AddCard),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Self::parse(&contents)
            }
            Err(_) => Self::default(),
        }
    }

    /// Parse the key-value format.  Unknown keys are ignored; malformed
    /// values keep their default and are reported.
    pub fn parse(s: &str) -> Self {
        let mut cfg = Self::default();

        for (lineno, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if let Err(reason) = cfg.apply_setting(key, value) {
                tracing::warn!(line = lineno + 1, key, value, %reason, "ignoring config value");
            }
        }

        cfg
    }

    fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        fn number(value: &str) -> Result<f64, ConfigError> {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConfigError::NotANumber(value.to_string()))
        }

        let stack = &mut self.stack;
        match key {
            "item_gap" => stack.item_gap = number(value)?,
            "item_scale_step" => stack.item_scale_step = number(value)?,
            "item_stack_offset" => stack.item_stack_offset = number(value)?,
            "stack_trigger_position" => stack.stack_trigger_position = value.parse()?,
            "scale_end_position" => stack.scale_end_position = value.parse()?,
            "base_scale" => stack.base_scale = number(value)?,
            "rotation_step" => stack.rotation_step = number(value)?,
            "blur_step" => stack.blur_step = number(value)?,
            "scroll_mode" => stack.scroll_mode = value.parse()?,
            "lerp" => self.inertia.lerp = number(value)?.clamp(0.01, 1.0),
            "wheel_multiplier" => self.inertia.wheel_multiplier = number(value)?,
            "touch_multiplier" => self.inertia.touch_multiplier = number(value)?,
            "line_step" => self.line_step = number(value)?.max(0.5),
            "wheel_step" => self.wheel_step = number(value)?.max(0.5),
            "frame_ms" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::NotAWholeNumber(value.to_string()))?;
                // Keep the clock between ~4 and ~250 fps.
                self.frame_ms = ms.clamp(4, 250);
            }
            _ => {
                let Some(action) = Action::from_config_key(key) else {
                    return Ok(());
                };
                let parsed: Vec<KeyBind> = value
                    .split(',')
                    .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                    .collect();
                if parsed.is_empty() {
                    return Err(ConfigError::EmptyBinding(value.to_string()));
                }
                self.bindings.insert(action, parsed);
            }
        }
        Ok(())
    }

    /// The file `--print-config` writes: every setting at its current value.
    pub fn serialise(&self) -> String {
        let stack = &self.stack;
        let mut lines = vec![
            "# card-stack configuration".to_string(),
            "# Distances are in terminal rows; positions accept rows or a".to_string(),
            "# percentage of the viewport height (e.g. \"20%\").".to_string(),
            String::new(),
            "[stack]".to_string(),
            format!("item_gap = {}", stack.item_gap),
            format!("item_scale_step = {}", stack.item_scale_step),
            format!("item_stack_offset = {}", stack.item_stack_offset),
            format!("stack_trigger_position = \"{}\"", stack.stack_trigger_position),
            format!("scale_end_position = \"{}\"", stack.scale_end_position),
            format!("base_scale = {}", stack.base_scale),
            format!("rotation_step = {}", stack.rotation_step),
            format!("blur_step = {}", stack.blur_step),
            format!("scroll_mode = \"{}\"", stack.scroll_mode.label()),
            String::new(),
            "[scroll]".to_string(),
            format!("lerp = {}", self.inertia.lerp),
            format!("wheel_multiplier = {}", self.inertia.wheel_multiplier),
            format!("touch_multiplier = {}", self.inertia.touch_multiplier),
            format!("line_step = {}", self.line_step),
            format!("wheel_step = {}", self.wheel_step),
            format!("frame_ms = {}", self.frame_ms),
            String::new(),
            "[keys]".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/card-stack/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("card-stack").join("config.toml")
}
