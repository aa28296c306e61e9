//! Key identifiers as the controller names them.
//!
//! The keyboard operations address keys in four separate namespaces: ASCII
//! characters, function keys, "other" navigation/editing keys, and numpad
//! keys.  A [`KeyId`] remembers which namespace a key came from so that the
//! same physical key pressed through two namespaces is tracked as two held
//! entries, while the report still lists its usage only once.

use serde::{Deserialize, Serialize};

use super::ascii::ascii_to_hid;
use super::hid::HidKeyCode;

// ── ASCII keys ────────────────────────────────────────────────────────────────

/// A validated printable ASCII key (32–127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AsciiKey {
    code: u8,
    key: HidKeyCode,
    shifted: bool,
}

impl AsciiKey {
    /// Returns `None` unless `code` is in 32–127.
    pub fn new(code: u8) -> Option<Self> {
        ascii_to_hid(code).map(|(key, shifted)| Self { code, key, shifted })
    }

    pub fn code(self) -> u8 {
        self.code
    }

    pub fn key(self) -> HidKeyCode {
        self.key
    }

    /// Whether the US layout needs Shift held to produce this character.
    pub fn needs_shift(self) -> bool {
        self.shifted
    }
}

// ── Function / other / numpad tables ─────────────────────────────────────────

const FUNCTION_KEYS_LOW: [HidKeyCode; 12] = [
    HidKeyCode::F1,
    HidKeyCode::F2,
    HidKeyCode::F3,
    HidKeyCode::F4,
    HidKeyCode::F5,
    HidKeyCode::F6,
    HidKeyCode::F7,
    HidKeyCode::F8,
    HidKeyCode::F9,
    HidKeyCode::F10,
    HidKeyCode::F11,
    HidKeyCode::F12,
];

const FUNCTION_KEYS_HIGH: [HidKeyCode; 12] = [
    HidKeyCode::F13,
    HidKeyCode::F14,
    HidKeyCode::F15,
    HidKeyCode::F16,
    HidKeyCode::F17,
    HidKeyCode::F18,
    HidKeyCode::F19,
    HidKeyCode::F20,
    HidKeyCode::F21,
    HidKeyCode::F22,
    HidKeyCode::F23,
    HidKeyCode::F24,
];

/// Controller code of F1; F2–F12 follow consecutively.
pub const FUNCTION_KEY_F1: u8 = 0xC2;

/// Controller code of F13; F14–F24 follow consecutively.
pub const FUNCTION_KEY_F13: u8 = 0xF0;

/// Translates a function-key code (`0xC2..=0xCD`, `0xF0..=0xFB`).
pub fn function_key_to_hid(code: u8) -> Option<HidKeyCode> {
    match code {
        0xC2..=0xCD => Some(FUNCTION_KEYS_LOW[(code - FUNCTION_KEY_F1) as usize]),
        0xF0..=0xFB => Some(FUNCTION_KEYS_HIGH[(code - FUNCTION_KEY_F13) as usize]),
        _ => None,
    }
}

/// Translates a navigation/editing key code.
pub fn other_key_to_hid(code: u8) -> Option<HidKeyCode> {
    let key = match code {
        0xDA => HidKeyCode::ArrowUp,
        0xD9 => HidKeyCode::ArrowDown,
        0xD8 => HidKeyCode::ArrowLeft,
        0xD7 => HidKeyCode::ArrowRight,
        0xB2 => HidKeyCode::Backspace,
        0xB3 => HidKeyCode::Tab,
        0xB0 => HidKeyCode::Enter,
        0xB1 => HidKeyCode::Escape,
        0xD1 => HidKeyCode::Insert,
        0xD4 => HidKeyCode::Delete,
        0xD3 => HidKeyCode::PageUp,
        0xD6 => HidKeyCode::PageDown,
        0xD2 => HidKeyCode::Home,
        0xD5 => HidKeyCode::End,
        0xC1 => HidKeyCode::CapsLock,
        _ => return None,
    };
    Some(key)
}

const NUMPAD_KEYS: [HidKeyCode; 17] = [
    HidKeyCode::Numpad0,
    HidKeyCode::Numpad1,
    HidKeyCode::Numpad2,
    HidKeyCode::Numpad3,
    HidKeyCode::Numpad4,
    HidKeyCode::Numpad5,
    HidKeyCode::Numpad6,
    HidKeyCode::Numpad7,
    HidKeyCode::Numpad8,
    HidKeyCode::Numpad9,
    HidKeyCode::NumpadDecimal,
    HidKeyCode::NumpadMultiply,
    HidKeyCode::NumpadDivide,
    HidKeyCode::NumpadAdd,
    HidKeyCode::NumpadSubtract,
    HidKeyCode::NumpadEnter,
    HidKeyCode::NumLock,
];

/// Translates a numpad id (`0x00..=0x10`).
pub fn numpad_to_hid(id: u8) -> Option<HidKeyCode> {
    NUMPAD_KEYS.get(id as usize).copied()
}

// ── Held-key identifier ──────────────────────────────────────────────────────

/// One entry of the keyboard's held-key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyId {
    Ascii(AsciiKey),
    Function(HidKeyCode),
    Other(HidKeyCode),
    Numpad(HidKeyCode),
}

impl KeyId {
    /// The usage this key contributes to a keyboard report.
    pub fn key(self) -> HidKeyCode {
        match self {
            KeyId::Ascii(ascii) => ascii.key(),
            KeyId::Function(key) | KeyId::Other(key) | KeyId::Numpad(key) => key,
        }
    }

    /// Modifier bits that must be set while this key is held.
    pub fn implied_modifiers(self) -> u8 {
        match self {
            KeyId::Ascii(ascii) if ascii.needs_shift() => Modifier::LeftShift.bit(),
            _ => 0,
        }
    }
}

// ── Modifiers ─────────────────────────────────────────────────────────────────

/// Modifier id carried by MODIFIER_PRESS / MODIFIER_RELEASE.
///
/// Ids follow the bit order of the HID modifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Modifier {
    LeftCtrl = 0,
    LeftShift = 1,
    LeftAlt = 2,
    LeftGui = 3,
    RightCtrl = 4,
    RightShift = 5,
    RightAlt = 6,
    RightGui = 7,
}

impl Modifier {
    pub fn key(self) -> HidKeyCode {
        match self {
            Modifier::LeftCtrl => HidKeyCode::ControlLeft,
            Modifier::LeftShift => HidKeyCode::ShiftLeft,
            Modifier::LeftAlt => HidKeyCode::AltLeft,
            Modifier::LeftGui => HidKeyCode::MetaLeft,
            Modifier::RightCtrl => HidKeyCode::ControlRight,
            Modifier::RightShift => HidKeyCode::ShiftRight,
            Modifier::RightAlt => HidKeyCode::AltRight,
            Modifier::RightGui => HidKeyCode::MetaRight,
        }
    }

    /// Bit of this modifier in the report's modifier byte.
    pub fn bit(self) -> u8 {
        self.key().modifier_bit().unwrap_or(0)
    }
}

impl TryFrom<u8> for Modifier {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(Modifier::LeftCtrl),
            1 => Ok(Modifier::LeftShift),
            2 => Ok(Modifier::LeftAlt),
            3 => Ok(Modifier::LeftGui),
            4 => Ok(Modifier::RightCtrl),
            5 => Ok(Modifier::RightShift),
            6 => Ok(Modifier::RightAlt),
            7 => Ok(Modifier::RightGui),
            _ => Err(()),
        }
    }
}

// ── Hardware-offloaded chords ────────────────────────────────────────────────

/// Fixed key combinations emitted as one shot, independent of held state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKey {
    Pause,
    PrintScreen,
    ScrollLock,
    NumLock,
    CtrlAltDel,
}

impl SpecialKey {
    /// Modifier bits and key making up the chord.
    pub fn chord(self) -> (u8, HidKeyCode) {
        match self {
            SpecialKey::Pause => (0, HidKeyCode::Pause),
            SpecialKey::PrintScreen => (0, HidKeyCode::PrintScreen),
            SpecialKey::ScrollLock => (0, HidKeyCode::ScrollLock),
            SpecialKey::NumLock => (0, HidKeyCode::NumLock),
            SpecialKey::CtrlAltDel => (
                Modifier::LeftCtrl.bit() | Modifier::LeftAlt.bit(),
                HidKeyCode::Delete,
            ),
        }
    }
}
