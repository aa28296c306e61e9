//! HID reports handed to the USB collaborator.
//!
//! Keyboard reports use the boot-protocol layout (8 bytes):
//! ```text
//! Byte 0: modifier bitfield (bit 0 LCtrl .. bit 7 RGUI)
//! Byte 1: reserved (0x00)
//! Byte 2-7: up to 6 key usages, unused slots zero
//! ```
//!
//! Mouse reports carry a button byte plus exactly one kind of motion:
//! ```text
//! relative / wheel: [buttons][dx][dy][wheel]
//! absolute:         [buttons][x_lo][x_hi][y_lo][y_hi][0]
//! ```

use serde::{Deserialize, Serialize};

use crate::keymap::HidKeyCode;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of non-modifier key slots in a keyboard report.
pub const KEY_ROLLOVER: usize = 6;

/// Largest encoded mouse report (absolute form).
pub const MOUSE_REPORT_MAX_SIZE: usize = 6;

/// Upper bound of the absolute pointer axes.
pub const ABSOLUTE_AXIS_MAX: u16 = 32767;

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Snapshot of every key the host should consider held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: [u8; KEY_ROLLOVER],
}

impl KeyboardReport {
    /// All keys released.
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            keys: [0; KEY_ROLLOVER],
        }
    }

    /// Builds a report from a modifier byte and a list of held keys.
    ///
    /// Duplicate usages collapse to one slot; keys beyond the rollover limit
    /// are dropped.  Modifier keys set their bit in the modifier byte instead
    /// of taking a slot.
    pub fn from_keys(modifiers: u8, held: impl IntoIterator<Item = HidKeyCode>) -> Self {
        let mut report = Self {
            modifiers,
            keys: [0; KEY_ROLLOVER],
        };
        let mut used = 0;
        for key in held {
            if let Some(bit) = key.modifier_bit() {
                report.modifiers |= bit;
                continue;
            }
            let usage = key.usage();
            if report.keys[..used].contains(&usage) {
                continue;
            }
            if used == KEY_ROLLOVER {
                break;
            }
            report.keys[used] = usage;
            used += 1;
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.iter().all(|&k| k == 0)
    }

    /// Returns `true` if `key` occupies one of the usage slots.
    pub fn contains(&self, key: HidKeyCode) -> bool {
        self.keys.contains(&key.usage())
    }

    /// Serialises into `buf`. Returns the number of bytes written (8), or 0
    /// if `buf` is too short.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifiers;
        buf[1] = 0;
        buf[2..KEYBOARD_REPORT_SIZE].copy_from_slice(&self.keys);
        KEYBOARD_REPORT_SIZE
    }
}

// ── Mouse ─────────────────────────────────────────────────────────────────────

/// Pointer motion carried by a [`MouseReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    /// No movement; used for pure button changes.
    None,
    Relative { dx: i8, dy: i8 },
    Absolute { x: u16, y: u16 },
    Wheel(i8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseReport {
    /// Bit 0 left, bit 1 right, bit 2 middle.
    pub buttons: u8,
    pub motion: Motion,
}

impl MouseReport {
    pub const fn buttons_only(buttons: u8) -> Self {
        Self {
            buttons,
            motion: Motion::None,
        }
    }

    /// Encoded length: 6 for absolute reports, 4 otherwise.
    pub fn encoded_len(&self) -> usize {
        match self.motion {
            Motion::Absolute { .. } => MOUSE_REPORT_MAX_SIZE,
            _ => 4,
        }
    }

    /// Serialises into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is too short.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        let len = self.encoded_len();
        if buf.len() < len {
            return 0;
        }
        buf[0] = self.buttons;
        match self.motion {
            Motion::None => buf[1..4].fill(0),
            Motion::Relative { dx, dy } => {
                buf[1] = dx as u8;
                buf[2] = dy as u8;
                buf[3] = 0;
            }
            Motion::Wheel(wheel) => {
                buf[1] = 0;
                buf[2] = 0;
                buf[3] = wheel as u8;
            }
            Motion::Absolute { x, y } => {
                buf[1..3].copy_from_slice(&x.to_le_bytes());
                buf[3..5].copy_from_slice(&y.to_le_bytes());
                buf[5] = 0;
            }
        }
        len
    }
}
