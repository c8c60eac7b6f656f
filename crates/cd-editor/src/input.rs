//! Input abstraction layer.
//!
//! Hosts translate their native mouse / keyboard events into `InputEvent`s.
//! Pointer coordinates are in screen pixels; the session converts them to
//! world space through the camera.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// ⌘ on macOS.
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Ctrl or ⌘, whichever the platform uses for commands.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether a click should add/remove from the selection instead of
    /// replacing it.
    pub fn toggles_selection(self) -> bool {
        self.ctrl || self.meta || self.shift
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    PointerMove { x: f64, y: f64, modifiers: Modifiers },
    PointerUp { x: f64, y: f64, modifiers: Modifiers },
    /// Mouse wheel at `(x, y)`. `delta` is in notches; positive zooms in.
    Wheel { x: f64, y: f64, delta: f64 },
    /// `key` is the `KeyboardEvent.key`-style name (`"z"`, `"Delete"`, ...).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn key(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.into(),
            modifiers,
        }
    }
}
