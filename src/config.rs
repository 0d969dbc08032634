//! User configuration: keybindings, gallery settings and persistence.
//!
//! Everything is stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/circular-gallery/config.toml`
//! (default `~/.config/circular-gallery/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::gallery::GalleryConfig;
use crate::core::scroll::ScrollTuning;

/// Texture width used in the terminal when none is configured.  Planes
/// rarely span more than a hundred cells, so anything larger only costs
/// decode time and memory.
pub const TERMINAL_TEXTURE_WIDTH: u32 = 256;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the gallery view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Next,
    Prev,
    First,
    Last,
    BendUp,
    BendDown,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used when serialising).
    pub const ALL: &[Action] = &[
        Action::Next,
        Action::Prev,
        Action::First,
        Action::Last,
        Action::BendUp,
        Action::BendDown,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::Next => "Next",
            Action::Prev => "Previous",
            Action::First => "First",
            Action::Last => "Last",
            Action::BendUp => "Bend +",
            Action::BendDown => "Bend -",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::Next => "next",
            Action::Prev => "prev",
            Action::First => "first",
            Action::Last => "last",
            Action::BendUp => "bend_up",
            Action::BendDown => "bend_down",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT);

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared.  SHIFT is ignored for character keys since terminals
    /// report `+` with or without it depending on layout.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mut mask = MODIFIER_MASK;
        if matches!(self.code, KeyCode::Char(_)) {
            mask.remove(KeyModifiers::SHIFT);
        }
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    fn modifier_prefix(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s
    }

    /// User-friendly display string (e.g. `"→"`, `"Ctrl+c"`, `"q"`).
    pub fn display(&self) -> String {
        let mut s = self.modifier_prefix();
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Serialise to config-file format (e.g. `"Right"`, `"Ctrl+c"`, `"q"`).
    fn to_config_string(&self) -> String {
        let mut s = self.modifier_prefix();
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char('+') => "Plus".into(),
            KeyCode::Char(',') => "Comma".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Left => "Left".into(),
            KeyCode::Right => "Right".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Backspace".into(),
            KeyCode::Delete => "Delete".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Right"`, `"q"`, `"Plus"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            "plus" => KeyCode::Char('+'),
            "comma" => KeyCode::Char(','),
            s if s.starts_with('f') && s.len() > 1 => {
                let n: u8 = s[1..].parse().ok()?;
                KeyCode::F(n)
            }
            // Single characters keep their case.
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── gallery ───────────

/// Gallery tuning as stored on disk.  Converted to a
/// [`GalleryConfig`] at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct GallerySettings {
    pub bend: f64,
    pub ease: f64,
    pub drag_sensitivity: f64,
    pub drag_sensitivity_compact: f64,
    pub wheel_sensitivity: f64,
    pub wheel_sensitivity_compact: f64,
    pub snap_debounce_ms: u64,
    pub border_radius: f64,
    pub text_color: String,
    pub font: String,
    /// 0 picks [`TERMINAL_TEXTURE_WIDTH`].
    pub texture_width: u32,
    pub compact_breakpoint: f64,
}

impl Default for GallerySettings {
    fn default() -> Self {
        let normal = ScrollTuning::default();
        let compact = ScrollTuning::compact();
        let base = GalleryConfig::default();
        Self {
            bend: base.bend,
            ease: normal.ease,
            drag_sensitivity: normal.drag_sensitivity,
            drag_sensitivity_compact: compact.drag_sensitivity,
            wheel_sensitivity: normal.wheel_sensitivity,
            wheel_sensitivity_compact: compact.wheel_sensitivity,
            snap_debounce_ms: normal.snap_debounce.as_millis() as u64,
            border_radius: base.border_radius,
            text_color: base.text_color,
            font: base.font,
            texture_width: 0,
            compact_breakpoint: base.sizing.compact_breakpoint,
        }
    }
}

impl GallerySettings {
    pub fn gallery_config(&self) -> GalleryConfig {
        let base = GalleryConfig::default();
        let debounce = Duration::from_millis(self.snap_debounce_ms);
        GalleryConfig {
            bend: self.bend,
            text_color: self.text_color.clone(),
            border_radius: self.border_radius,
            font: self.font.clone(),
            scroll: ScrollTuning {
                ease: self.ease,
                drag_sensitivity: self.drag_sensitivity,
                wheel_sensitivity: self.wheel_sensitivity,
                snap_debounce: debounce,
            },
            compact_scroll: ScrollTuning {
                ease: self.ease,
                drag_sensitivity: self.drag_sensitivity_compact,
                wheel_sensitivity: self.wheel_sensitivity_compact,
                snap_debounce: debounce,
            },
            sizing: crate::core::layout::Sizing {
                compact_breakpoint: self.compact_breakpoint,
                ..base.sizing
            },
            camera: base.camera,
            texture_width: Some(if self.texture_width > 0 {
                self.texture_width
            } else {
                TERMINAL_TEXTURE_WIDTH
            }),
        }
    }

    /// Apply one `key = value` pair.  Returns `false` for unknown keys.
    /// Numbers that fail to parse keep the previous value; the rest are
    /// clamped into range.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        fn float(value: &str, current: f64, lo: f64, hi: f64) -> f64 {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map_or(current, |v| v.clamp(lo, hi))
        }

        match key {
            "bend" => self.bend = float(value, self.bend, -50.0, 50.0),
            "ease" => self.ease = float(value, self.ease, 0.01, 0.99),
            "drag_sensitivity" => {
                self.drag_sensitivity = float(value, self.drag_sensitivity, 0.0, 10.0)
            }
            "drag_sensitivity_compact" => {
                self.drag_sensitivity_compact =
                    float(value, self.drag_sensitivity_compact, 0.0, 10.0)
            }
            "wheel_sensitivity" => {
                self.wheel_sensitivity = float(value, self.wheel_sensitivity, 0.0, 10.0)
            }
            "wheel_sensitivity_compact" => {
                self.wheel_sensitivity_compact =
                    float(value, self.wheel_sensitivity_compact, 0.0, 10.0)
            }
            "snap_debounce_ms" => {
                if let Ok(v) = value.parse::<u64>() {
                    // Keep this bounded for predictable UX.
                    self.snap_debounce_ms = v.clamp(10, 2000);
                }
            }
            "border_radius" => self.border_radius = float(value, self.border_radius, 0.0, 1.0),
            "text_color" => self.text_color = unquote(value).to_string(),
            "font" => self.font = unquote(value).to_string(),
            "texture_width" => {
                if let Ok(v) = value.parse::<u32>() {
                    self.texture_width = if v == 0 { 0 } else { v.clamp(16, 4096) };
                }
            }
            "compact_breakpoint" => {
                self.compact_breakpoint = float(value, self.compact_breakpoint, 0.0, 10_000.0)
            }
            _ => return false,
        }
        true
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: keybindings and gallery settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    pub gallery: GallerySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            gallery: GallerySettings::default(),
        }
    }
}

impl AppConfig {
    /// Hard-coded default bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(Next, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(Prev, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(First, vec![KeyBind::new(Home, n)]);
        m.insert(Last, vec![KeyBind::new(End, n)]);
        m.insert(BendUp, vec![KeyBind::new(Char('+'), n), KeyBind::new(Char('='), n)]);
        m.insert(BendDown, vec![KeyBind::new(Char('-'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: {}/{} | 1-9: jump | {}/{}: bend | {}: {}",
            self.short_binding(Action::Prev),
            self.short_binding(Action::Next),
            Action::Prev.label().to_lowercase(),
            Action::Next.label().to_lowercase(),
            self.short_binding(Action::BendDown),
            self.short_binding(Action::BendUp),
            self.short_binding(Action::Quit),
            Action::Quit.label().to_lowercase(),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                }
                Self::default()
            }
        }
    }

    /// Persist to the default location.  Returns the path written.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if config.gallery.apply(key, value) {
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::debug!(key, "ignoring unknown config key");
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                if let Some(bind) = KeyBind::parse(unquote(part)) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let g = &self.gallery;
        let mut lines = vec![
            "# circular-gallery configuration".to_string(),
            String::new(),
            "# Gallery".to_string(),
            format!("bend = {}", g.bend),
            format!("ease = {}", g.ease),
            format!("drag_sensitivity = {}", g.drag_sensitivity),
            format!("drag_sensitivity_compact = {}", g.drag_sensitivity_compact),
            format!("wheel_sensitivity = {}", g.wheel_sensitivity),
            format!("wheel_sensitivity_compact = {}", g.wheel_sensitivity_compact),
            format!("snap_debounce_ms = {}", g.snap_debounce_ms),
            format!("border_radius = {}", g.border_radius),
            format!("text_color = \"{}\"", g.text_color),
            format!("font = \"{}\"", g.font),
            format!("texture_width = {}", g.texture_width),
            format!("compact_breakpoint = {}", g.compact_breakpoint),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Home, End, PageUp, PageDown, Space, Plus, Comma, F1-F12".to_string(),
            String::new(),
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

/// Return the config file path (`$XDG_CONFIG_HOME/circular-gallery/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("circular-gallery").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_bindings_cover_navigation() {
        let c = AppConfig::default();
        assert_eq!(c.match_key(key(KeyCode::Right)), Some(Action::Next));
        assert_eq!(c.match_key(key(KeyCode::Char('h'))), Some(Action::Prev));
        assert_eq!(c.match_key(key(KeyCode::Home)), Some(Action::First));
        assert_eq!(c.match_key(key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(c.match_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn shifted_plus_still_matches() {
        let c = AppConfig::default();
        let ev = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT);
        assert_eq!(c.match_key(ev), Some(Action::BendUp));
    }

    #[test]
    fn key_strings_parse() {
        assert_eq!(
            KeyBind::parse("Ctrl+c"),
            Some(KeyBind::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        );
        assert_eq!(
            KeyBind::parse("Plus"),
            Some(KeyBind::new(KeyCode::Char('+'), KeyModifiers::NONE))
        );
        assert_eq!(
            KeyBind::parse("L"),
            Some(KeyBind::new(KeyCode::Char('L'), KeyModifiers::NONE))
        );
        assert_eq!(KeyBind::parse("Hyper+x"), None);
        assert_eq!(KeyBind::parse("nonsense"), None);
    }

    #[test]
    fn settings_are_clamped_and_unknown_keys_ignored() {
        let c = AppConfig::parse_config(
            "\
[gallery]
bend = 99
ease = 0
border_radius = 0.2
snap_debounce_ms = 5
text_color = \"#ff8800\"
texture_width = 3
frobnicate = yes
next = n, Right
",
        );
        assert_eq!(c.gallery.bend, 50.0);
        assert_eq!(c.gallery.ease, 0.01);
        assert_eq!(c.gallery.border_radius, 0.2);
        assert_eq!(c.gallery.snap_debounce_ms, 10);
        assert_eq!(c.gallery.text_color, "#ff8800");
        assert_eq!(c.gallery.texture_width, 16);
        assert_eq!(c.match_key(key(KeyCode::Char('n'))), Some(Action::Next));
        assert_eq!(c.match_key(key(KeyCode::Char('l'))), None);
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let c = AppConfig::parse_config("bend = lots\nease = NaN\n");
        assert_eq!(c.gallery, GallerySettings::default());
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut c = AppConfig::default();
        c.gallery.bend = -2.5;
        c.gallery.font = "italic 18px Inter".into();
        c.bindings
            .insert(Action::BendUp, vec![KeyBind::new(KeyCode::Char('+'), KeyModifiers::NONE)]);
        c.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.gallery, c.gallery);
        assert_eq!(loaded.bindings, c.bindings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let loaded = AppConfig::load_from(Path::new("/no/such/config.toml"));
        assert_eq!(loaded.gallery, GallerySettings::default());
    }

    #[test]
    fn settings_convert_to_gallery_config() {
        let defaults = GallerySettings::default().gallery_config();
        assert_eq!(
            defaults,
            GalleryConfig {
                texture_width: Some(TERMINAL_TEXTURE_WIDTH),
                ..GalleryConfig::default()
            }
        );

        let settings = GallerySettings {
            texture_width: 512,
            ease: 0.2,
            ..GallerySettings::default()
        };
        let config = settings.gallery_config();
        assert_eq!(config.texture_width, Some(512));
        assert_eq!(config.compact_scroll.ease, 0.2);
        assert_eq!(config.compact_scroll.drag_sensitivity, 0.03);
    }
}
