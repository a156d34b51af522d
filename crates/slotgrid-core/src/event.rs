#![forbid(unsafe_code)]

//! Canonical keyboard event types.
//!
//! Hosts translate their native key events (DOM `keydown`, terminal input,
//! ...) into [`KeyEvent`] before handing them to the engine. Only the keys the
//! engine reacts to have dedicated variants; everything else is
//! [`KeyCode::Char`] or [`KeyCode::Other`].
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host cannot tell.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the event is a press or auto-repeat (not a release).
    #[must_use]
    pub const fn is_actuation(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// Whether a shortcut modifier (Ctrl, Alt, Super) is held.
    ///
    /// Shift alone does not count; it never changes arrow semantics.
    #[must_use]
    pub const fn has_shortcut_modifier(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::SUPER))
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key. Space arrives as `Char(' ')`.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Tab key.
    Tab,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Any key the engine has no binding for.
    Other,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_plain_press() {
        let event = KeyEvent::new(KeyCode::Left);
        assert_eq!(event.kind, KeyEventKind::Press);
        assert_eq!(event.modifiers, Modifiers::NONE);
        assert!(event.is_actuation());
        assert!(!event.has_shortcut_modifier());
    }

    #[test]
    fn release_is_not_actuation() {
        let event = KeyEvent::new(KeyCode::Enter).with_kind(KeyEventKind::Release);
        assert!(!event.is_actuation());
    }

    #[test]
    fn repeat_is_actuation() {
        let event = KeyEvent::new(KeyCode::Right).with_kind(KeyEventKind::Repeat);
        assert!(event.is_actuation());
    }

    #[test]
    fn shift_is_not_a_shortcut_modifier() {
        let event = KeyEvent::new(KeyCode::Up).with_modifiers(Modifiers::SHIFT);
        assert!(!event.has_shortcut_modifier());
    }

    #[test]
    fn ctrl_alt_super_are_shortcut_modifiers() {
        for modifiers in [Modifiers::CTRL, Modifiers::ALT, Modifiers::SUPER] {
            let event = KeyEvent::new(KeyCode::Up).with_modifiers(modifiers | Modifiers::SHIFT);
            assert!(event.has_shortcut_modifier(), "{modifiers:?}");
        }
    }

    #[test]
    fn from_key_code() {
        let event: KeyEvent = KeyCode::Char(' ').into();
        assert_eq!(event, KeyEvent::new(KeyCode::Char(' ')));
    }
}
