//! Editor configuration and keyboard shortcuts.

use crate::camera::{Camera, MAX_SCALE, MIN_SCALE};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::input::Modifiers;
use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing binding for action: {0}")]
    MissingBinding(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Invalid shortcut: {0:?}")]
    InvalidShortcut(String),
    #[error("Shortcut {shortcut} is bound to both {first} and {second}")]
    DuplicateShortcut {
        shortcut: String,
        first: String,
        second: String,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Editor commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    ToolSelect,
    ToolPan,
    ToolRectangle,
    ToolPolygon,
    Undo,
    Redo,
    DeleteSelected,
    SelectAll,
    Cancel,
    RemoveLastPoint,
    BringToFront,
    SendToBack,
    ToggleLock,
    ToggleVisibility,
}

impl EditorAction {
    pub const ALL: [EditorAction; 14] = [
        EditorAction::ToolSelect,
        EditorAction::ToolPan,
        EditorAction::ToolRectangle,
        EditorAction::ToolPolygon,
        EditorAction::Undo,
        EditorAction::Redo,
        EditorAction::DeleteSelected,
        EditorAction::SelectAll,
        EditorAction::Cancel,
        EditorAction::RemoveLastPoint,
        EditorAction::BringToFront,
        EditorAction::SendToBack,
        EditorAction::ToggleLock,
        EditorAction::ToggleVisibility,
    ];

    /// Key used in the keymap JSON.
    pub fn key(&self) -> &'static str {
        match self {
            EditorAction::ToolSelect => "tool_select",
            EditorAction::ToolPan => "tool_pan",
            EditorAction::ToolRectangle => "tool_rectangle",
            EditorAction::ToolPolygon => "tool_polygon",
            EditorAction::Undo => "undo",
            EditorAction::Redo => "redo",
            EditorAction::DeleteSelected => "delete_selected",
            EditorAction::SelectAll => "select_all",
            EditorAction::Cancel => "cancel",
            EditorAction::RemoveLastPoint => "remove_last_point",
            EditorAction::BringToFront => "bring_to_front",
            EditorAction::SendToBack => "send_to_back",
            EditorAction::ToggleLock => "toggle_lock",
            EditorAction::ToggleVisibility => "toggle_visibility",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }

    /// Tool selected by this action, if it is a tool switch.
    pub fn tool(&self) -> Option<ToolKind> {
        match self {
            EditorAction::ToolSelect => Some(ToolKind::Select),
            EditorAction::ToolPan => Some(ToolKind::Pan),
            EditorAction::ToolRectangle => Some(ToolKind::Rectangle),
            EditorAction::ToolPolygon => Some(ToolKind::Polygon),
            _ => None,
        }
    }
}

/// A key combination, written like `Ctrl+Shift+Z`.
///
/// `Ctrl` also matches Cmd on macOS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Shortcut {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Shortcut {
    pub fn new(key: &str) -> Self {
        Self {
            key: normalize_key(key),
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }

    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::new(key)
        }
    }

    /// Check a key press against this shortcut.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == modifiers.command()
            && self.shift == modifiers.shift
            && self.alt == modifiers.alt
    }
}

/// Single characters are upper-cased, named keys kept as written.
fn normalize_key(key: &str) -> String {
    if key.chars().count() == 1 {
        key.to_uppercase()
    } else {
        key.to_string()
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for Shortcut {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidShortcut(s.to_string());
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(invalid)?;

        let mut shortcut = Shortcut::new(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "cmd" | "command" | "meta" => shortcut.ctrl = true,
                "shift" => shortcut.shift = true,
                "alt" | "option" => shortcut.alt = true,
                _ => return Err(invalid()),
            }
        }
        Ok(shortcut)
    }
}

impl TryFrom<String> for Shortcut {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Shortcut> for String {
    fn from(shortcut: Shortcut) -> Self {
        shortcut.to_string()
    }
}

/// Action → shortcut map. Always complete and free of duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct KeyBindings {
    bindings: BTreeMap<EditorAction, Shortcut>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = EditorAction::ALL
            .into_iter()
            .map(|action| {
                let shortcut = match action {
                    EditorAction::ToolSelect => Shortcut::new("V"),
                    EditorAction::ToolPan => Shortcut::new("H"),
                    EditorAction::ToolRectangle => Shortcut::new("R"),
                    EditorAction::ToolPolygon => Shortcut::new("P"),
                    EditorAction::Undo => Shortcut::ctrl("Z"),
                    EditorAction::Redo => Shortcut::ctrl_shift("Z"),
                    EditorAction::DeleteSelected => Shortcut::new("Delete"),
                    EditorAction::SelectAll => Shortcut::ctrl("A"),
                    EditorAction::Cancel => Shortcut::new("Escape"),
                    EditorAction::RemoveLastPoint => Shortcut::new("Backspace"),
                    EditorAction::BringToFront => Shortcut::ctrl("]"),
                    EditorAction::SendToBack => Shortcut::ctrl("["),
                    EditorAction::ToggleLock => Shortcut::ctrl("L"),
                    EditorAction::ToggleVisibility => Shortcut::ctrl("H"),
                };
                (action, shortcut)
            })
            .collect();
        Self { bindings }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action bound to a key press, if any.
    pub fn action_for(&self, key: &str, modifiers: Modifiers) -> Option<EditorAction> {
        self.bindings
            .iter()
            .find(|(_, shortcut)| shortcut.matches(key, modifiers))
            .map(|(action, _)| *action)
    }

    pub fn shortcut(&self, action: EditorAction) -> Option<&Shortcut> {
        self.bindings.get(&action)
    }

    /// Rebind one action, refusing a shortcut already used elsewhere.
    pub fn set(&mut self, action: EditorAction, shortcut: Shortcut) -> ConfigResult<()> {
        if let Some((other, _)) = self.bindings.iter().find(|(a, s)| **a != action && **s == shortcut) {
            return Err(ConfigError::DuplicateShortcut {
                shortcut: shortcut.to_string(),
                first: other.key().to_string(),
                second: action.key().to_string(),
            });
        }
        self.bindings.insert(action, shortcut);
        Ok(())
    }

    /// Replace all bindings from keymap JSON. On any error the current
    /// bindings are left untouched.
    pub fn import_json(&mut self, json: &str) -> ConfigResult<()> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        match KeyBindings::try_from(raw) {
            Ok(imported) => {
                *self = imported;
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected keymap import: {}", e);
                Err(e)
            }
        }
    }

    pub fn export_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TryFrom<BTreeMap<String, String>> for KeyBindings {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if let Some(unknown) = raw.keys().find(|k| EditorAction::from_key(k).is_none()) {
            return Err(ConfigError::UnknownAction(unknown.clone()));
        }

        let mut bindings = BTreeMap::new();
        let mut seen: BTreeMap<String, EditorAction> = BTreeMap::new();
        for action in EditorAction::ALL {
            let text = raw
                .get(action.key())
                .ok_or_else(|| ConfigError::MissingBinding(action.key().to_string()))?;
            let shortcut: Shortcut = text.parse()?;
            let canonical = shortcut.to_string().to_ascii_uppercase();
            if let Some(first) = seen.insert(canonical, action) {
                return Err(ConfigError::DuplicateShortcut {
                    shortcut: shortcut.to_string(),
                    first: first.key().to_string(),
                    second: action.key().to_string(),
                });
            }
            bindings.insert(action, shortcut);
        }
        Ok(Self { bindings })
    }
}

impl From<KeyBindings> for BTreeMap<String, String> {
    fn from(bindings: KeyBindings) -> Self {
        bindings
            .bindings
            .into_iter()
            .map(|(action, shortcut)| (action.key().to_string(), shortcut.to_string()))
            .collect()
    }
}

/// Interaction settings. Distances ending in `_px` are screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Vertex and corner handle hit radius.
    pub vertex_hit_px: f64,
    /// Polygon edge hover distance.
    pub edge_hit_px: f64,
    /// Bounding box inflation for shape body hits.
    pub body_hit_px: f64,
    /// Distance to the first vertex that closes a pending polygon.
    pub close_polygon_px: f64,
    /// Rectangles must exceed this size (image units) on both axes.
    pub min_rect_extent: f64,
    /// Arrow-key nudge in screen pixels.
    pub nudge_step: f64,
    /// Nudge multiplier while Shift is held.
    pub nudge_multiplier: f64,
    /// Maximum undo depth.
    pub history_limit: usize,
    /// Border around the image, in image units.
    pub padding: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Relative scale change per wheel notch.
    pub zoom_step: f64,
    pub key_bindings: KeyBindings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            vertex_hit_px: 10.0,
            edge_hit_px: 8.0,
            body_hit_px: 5.0,
            close_polygon_px: 15.0,
            min_rect_extent: 1.0,
            nudge_step: 1.0,
            nudge_multiplier: 10.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            padding: 0.0,
            min_zoom: MIN_SCALE,
            max_zoom: MAX_SCALE,
            zoom_step: crate::camera::ZOOM_STEP,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl EditorConfig {
    /// Reject values the editor cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("vertex_hit_px", self.vertex_hit_px),
            ("edge_hit_px", self.edge_hit_px),
            ("close_polygon_px", self.close_polygon_px),
            ("nudge_step", self.nudge_step),
            ("nudge_multiplier", self.nudge_multiplier),
            ("min_zoom", self.min_zoom),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.body_hit_px < 0.0 || self.min_rect_extent < 0.0 || self.padding < 0.0 {
            return Err(ConfigError::Invalid("negative distance".to_string()));
        }
        if self.min_zoom < MIN_SCALE || self.max_zoom > MAX_SCALE {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} exceeds {MIN_SCALE}..{MAX_SCALE}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom < self.min_zoom {
            return Err(ConfigError::Invalid(format!(
                "max_zoom {} is below min_zoom {}",
                self.max_zoom, self.min_zoom
            )));
        }
        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            return Err(ConfigError::Invalid(format!("zoom_step must be in (0, 1), got {}", self.zoom_step)));
        }
        Ok(())
    }

    /// Camera configured with this padding and zoom range.
    pub fn camera(&self) -> Camera {
        Camera {
            padding: self.padding,
            min_scale: self.min_zoom,
            max_scale: self.max_zoom,
            zoom_step: self.zoom_step,
            ..Camera::default()
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// `<config dir>/defectmark/config.json`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("defectmark").join("config.json"))
    }
}
