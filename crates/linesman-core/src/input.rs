//! Input events fed to the editor.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// Editing commands bound to keys or toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    /// Split the edge between the two selected nodes. Bound to `s`.
    Subdivide,
}

impl Key {
    /// Map a DOM/winit style key name. Unbound keys give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Escape" | "Esc" => Some(Key::Escape),
            "Enter" | "Return" => Some(Key::Enter),
            "Delete" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            "s" | "S" => Some(Key::Subdivide),
            _ => None,
        }
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Move { position: Point },
    Click { position: Point, modifiers: Modifiers },
    DragStart { position: Point },
    Drag { position: Point },
    DragEnd,
}
