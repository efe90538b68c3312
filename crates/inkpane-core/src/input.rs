//! Pointer and keyboard events as delivered by the host.
//!
//! Positions are in screen coordinates; the stage maps them into world
//! space before they reach controllers.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub position: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }
}

/// Keyboard payload. `key` follows the DOM `KeyboardEvent.key` naming
/// (`"Escape"`, `"Backspace"`, `" "`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Case-insensitive comparison for single-letter keys.
    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

/// An input event routed to the active interaction state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseDown(PointerInput),
    MouseUp(PointerInput),
    MouseMove(PointerInput),
    MouseEnter(PointerInput),
    MouseLeave(PointerInput),
    MouseOver(PointerInput),
    MouseOut(PointerInput),
    Wheel { position: Point, delta: Vec2, modifiers: Modifiers },
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    KeyPress(KeyInput),
}

/// Event name discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseOver,
    MouseOut,
    Wheel,
    KeyDown,
    KeyUp,
    KeyPress,
}

impl InputKind {
    /// DOM event name.
    pub fn name(self) -> &'static str {
        match self {
            InputKind::MouseDown => "mousedown",
            InputKind::MouseUp => "mouseup",
            InputKind::MouseMove => "mousemove",
            InputKind::MouseEnter => "mouseenter",
            InputKind::MouseLeave => "mouseleave",
            InputKind::MouseOver => "mouseover",
            InputKind::MouseOut => "mouseout",
            InputKind::Wheel => "wheel",
            InputKind::KeyDown => "keydown",
            InputKind::KeyUp => "keyup",
            InputKind::KeyPress => "keypress",
        }
    }
}

impl InputEvent {
    pub fn kind(&self) -> InputKind {
        match self {
            InputEvent::MouseDown(_) => InputKind::MouseDown,
            InputEvent::MouseUp(_) => InputKind::MouseUp,
            InputEvent::MouseMove(_) => InputKind::MouseMove,
            InputEvent::MouseEnter(_) => InputKind::MouseEnter,
            InputEvent::MouseLeave(_) => InputKind::MouseLeave,
            InputEvent::MouseOver(_) => InputKind::MouseOver,
            InputEvent::MouseOut(_) => InputKind::MouseOut,
            InputEvent::Wheel { .. } => InputKind::Wheel,
            InputEvent::KeyDown(_) => InputKind::KeyDown,
            InputEvent::KeyUp(_) => InputKind::KeyUp,
            InputEvent::KeyPress(_) => InputKind::KeyPress,
        }
    }

    /// Pointer position for pointer events.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::MouseDown(p)
            | InputEvent::MouseUp(p)
            | InputEvent::MouseMove(p)
            | InputEvent::MouseEnter(p)
            | InputEvent::MouseLeave(p)
            | InputEvent::MouseOver(p)
            | InputEvent::MouseOut(p) => Some(p.position),
            InputEvent::Wheel { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            InputEvent::MouseDown(p)
            | InputEvent::MouseUp(p)
            | InputEvent::MouseMove(p)
            | InputEvent::MouseEnter(p)
            | InputEvent::MouseLeave(p)
            | InputEvent::MouseOver(p)
            | InputEvent::MouseOut(p) => p.modifiers,
            InputEvent::Wheel { modifiers, .. } => *modifiers,
            InputEvent::KeyDown(k) | InputEvent::KeyUp(k) | InputEvent::KeyPress(k) => k.modifiers,
        }
    }
}
