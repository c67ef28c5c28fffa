//! Input event types for pointer and keyboard routing.
//!
//! Events carry their own modifier snapshot so the controller never has to
//! consult ambient state; the focus context travels alongside each event.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Key names used by the default keymap and the nudge handler.
pub mod keys {
    pub const ARROW_LEFT: &str = "ArrowLeft";
    pub const ARROW_RIGHT: &str = "ArrowRight";
    pub const ARROW_UP: &str = "ArrowUp";
    pub const ARROW_DOWN: &str = "ArrowDown";
    pub const ESCAPE: &str = "Escape";
    pub const BACKSPACE: &str = "Backspace";
    pub const DELETE: &str = "Delete";
    pub const SPACE: &str = "Space";
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel: negative `delta.y` zooms in.
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Keyboard event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyEvent {
    Pressed {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Released {
        key: String,
    },
}

impl KeyEvent {
    pub fn pressed(key: &str) -> Self {
        KeyEvent::Pressed {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pressed_with(key: &str, modifiers: Modifiers) -> Self {
        KeyEvent::Pressed {
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn released(key: &str) -> Self {
        KeyEvent::Released { key: key.to_string() }
    }
}

/// What currently holds keyboard focus outside the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusContext {
    /// The canvas (or nothing that consumes keys) has focus.
    #[default]
    Canvas,
    /// A text-entry field has focus; canvas shortcuts are ignored.
    TextInput,
}

impl FocusContext {
    pub fn accepts_shortcuts(&self) -> bool {
        *self == FocusContext::Canvas
    }
}

/// Any event the controller consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        InputEvent::Pointer(event)
    }
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}

/// Arrow key direction as a unit vector, `None` for any other key.
pub fn arrow_direction(key: &str) -> Option<Vec2> {
    match key {
        keys::ARROW_LEFT => Some(Vec2::new(-1.0, 0.0)),
        keys::ARROW_RIGHT => Some(Vec2::new(1.0, 0.0)),
        keys::ARROW_UP => Some(Vec2::new(0.0, -1.0)),
        keys::ARROW_DOWN => Some(Vec2::new(0.0, 1.0)),
        _ => None,
    }
}
