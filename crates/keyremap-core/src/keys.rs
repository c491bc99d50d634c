//! Key codes and normalized key events.
//!
//! # What is a key code here?
//!
//! The remapper works in Windows Virtual Key (VK) codes, the values defined
//! in `<winuser.h>` as `VK_*` (e.g. `VK_RETURN = 0x0D`, `VK_DOWN = 0x28`).
//! A VK code names a *logical* key: pressing the letter A produces
//! `0x41` regardless of the physical keyboard layout.  The persisted mapping
//! file and every user-facing notification use the decimal form of these
//! codes, so `KeyCode` is a thin newtype over `u16`.
//!
//! # Repeat detection
//!
//! The low-level hook reports auto-repeat as just another key-down.  The
//! [`KeyEventNormalizer`] remembers which keys are currently held and marks
//! a down for an already-held key as a repeat.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A virtual key identifier in the unsigned 16-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// No key. Never produced by hardware; as a mapping destination it disables the source key.
    pub const NONE: KeyCode = KeyCode(0x00);
    pub const BACKSPACE: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const ENTER: KeyCode = KeyCode(0x0D);
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CONTROL: KeyCode = KeyCode(0x11);
    /// `VK_MENU`, the generic Alt key.
    pub const ALT: KeyCode = KeyCode(0x12);
    pub const CAPS_LOCK: KeyCode = KeyCode(0x14);
    pub const ESCAPE: KeyCode = KeyCode(0x1B);
    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const LEFT: KeyCode = KeyCode(0x25);
    pub const UP: KeyCode = KeyCode(0x26);
    pub const RIGHT: KeyCode = KeyCode(0x27);
    pub const DOWN: KeyCode = KeyCode(0x28);
    pub const C: KeyCode = KeyCode(0x43);
    pub const LEFT_WIN: KeyCode = KeyCode(0x5B);
    pub const RIGHT_WIN: KeyCode = KeyCode(0x5C);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xA0);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xA1);
    pub const LEFT_CONTROL: KeyCode = KeyCode(0xA2);
    pub const RIGHT_CONTROL: KeyCode = KeyCode(0xA3);
    pub const LEFT_ALT: KeyCode = KeyCode(0xA4);
    pub const RIGHT_ALT: KeyCode = KeyCode(0xA5);

    /// Returns the raw numeric code.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Returns the on-screen keyboard label for this code, if it has one.
    pub fn label(self) -> Option<&'static str> {
        crate::layout::label_for(self)
    }
}

impl From<u16> for KeyCode {
    fn from(value: u16) -> Self {
        KeyCode(value)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Down,
    Up,
}

/// Modifier keys held at the moment an event was produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub win: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        ctrl: false,
        shift: false,
        win: false,
    };

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// A keyboard event in the form the gateway consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub transition: Transition,
    /// `true` for a down delivered while the key was already held.
    pub is_repeat: bool,
    pub modifiers: Modifiers,
    /// `true` when this process synthesized the event itself.
    pub injected: bool,
}

impl KeyEvent {
    /// A first (non-repeat) key-down with no modifiers.
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            transition: Transition::Down,
            is_repeat: false,
            modifiers: Modifiers::NONE,
            injected: false,
        }
    }

    /// A key-up with no modifiers.
    pub fn up(code: KeyCode) -> Self {
        Self {
            transition: Transition::Up,
            ..Self::down(code)
        }
    }

    /// Marks the event as an auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    pub fn is_down(&self) -> bool {
        self.transition == Transition::Down
    }
}

/// Number of codes tracked by the held-key bitset. VK codes never exceed 0xFF.
const TRACKED_CODES: usize = 256;

/// Builds [`KeyEvent`]s from raw hook notifications, deriving `is_repeat`.
///
/// Only physical events update the held-key set; injected events are
/// normalized but never counted as held.
#[derive(Debug, Default, Clone)]
pub struct KeyEventNormalizer {
    held: [u64; TRACKED_CODES / 64],
}

impl KeyEventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one raw notification.
    pub fn normalize(
        &mut self,
        code: KeyCode,
        transition: Transition,
        modifiers: Modifiers,
        injected: bool,
    ) -> KeyEvent {
        let is_repeat = if injected {
            false
        } else {
            match transition {
                Transition::Down => !self.set_held(code, true),
                Transition::Up => {
                    self.set_held(code, false);
                    false
                }
            }
        };

        KeyEvent {
            code,
            transition,
            is_repeat,
            modifiers,
            injected,
        }
    }

    /// Returns `true` if `code` is currently held.
    pub fn is_held(&self, code: KeyCode) -> bool {
        match Self::slot(code) {
            Some((word, bit)) => self.held[word] & bit != 0,
            None => false,
        }
    }

    /// Updates the held bit and returns whether it changed.
    fn set_held(&mut self, code: KeyCode, held: bool) -> bool {
        let Some((word, bit)) = Self::slot(code) else {
            return true;
        };
        let was_held = self.held[word] & bit != 0;
        if held {
            self.held[word] |= bit;
        } else {
            self.held[word] &= !bit;
        }
        was_held != held
    }

    fn slot(code: KeyCode) -> Option<(usize, u64)> {
        let index = code.0 as usize;
        (index < TRACKED_CODES).then(|| (index / 64, 1u64 << (index % 64)))
    }
}
