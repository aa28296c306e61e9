//! All USB-KVM wire codes: operation types, subtypes, and response bytes.
//!
//! Every frame on the serial link is exactly three bytes:
//!
//! ```text
//! [operation_type:1][operation_subtype_or_x:1][payload_or_y:1]
//! ```
//!
//! The meaning of the second and third byte depends on the operation type.
//! For keyboard, mouse-write and switch operations the second byte is a
//! subtype tag.  For [`OperationType::MouseMove`] it is the X delta and for
//! [`OperationType::MouseScroll`] it is the scroll direction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of every command frame in bytes.
pub const FRAME_SIZE: usize = 3;

/// Minimum spacing between two keyboard reports sent to the host.
///
/// Hosts poll the keyboard endpoint on a fixed scan interval; reports that
/// arrive closer together than this may be coalesced and lost.
pub const MIN_KEY_EVENTS_DELAY: Duration = Duration::from_millis(20);

/// Subtype value that is never valid for operations whose subtype is a tag.
pub const SUBTYPE_RESERVED: u8 = 0x00;

/// Marker byte that opens an out-of-band diagnostic text message.
pub const INFO_MESSAGE_START: u8 = 0xED;

/// Marker byte that closes an out-of-band diagnostic text message.
pub const INFO_MESSAGE_END: u8 = 0xEF;

/// Largest scroll tilt accepted by [`OperationType::MouseScroll`].
pub const MAX_SCROLL_TILT: u8 = 127;

// ── Operation types ───────────────────────────────────────────────────────────

/// First byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationType {
    /// Never valid; always answered with [`ResponseCode::UnknownOperation`].
    Reserved = 0x00,
    KeyboardWrite = 0x01,
    MouseWrite = 0x02,
    /// Relative move: subtype byte is the X delta, payload the Y delta.
    MouseMove = 0x03,
    /// Wheel: subtype byte is the direction, payload the tilt (max 127).
    MouseScroll = 0x04,
    SwitchSet = 0x05,
    /// Zeroes the instruction counter.
    ResetInstructionCount = 0xFE,
    /// Returns keyboard and mouse state to power-on values.
    DataReset = 0xFF,
}

impl TryFrom<u8> for OperationType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(OperationType::Reserved),
            0x01 => Ok(OperationType::KeyboardWrite),
            0x02 => Ok(OperationType::MouseWrite),
            0x03 => Ok(OperationType::MouseMove),
            0x04 => Ok(OperationType::MouseScroll),
            0x05 => Ok(OperationType::SwitchSet),
            0xFE => Ok(OperationType::ResetInstructionCount),
            0xFF => Ok(OperationType::DataReset),
            _ => Err(()),
        }
    }
}

// ── Keyboard subtypes ─────────────────────────────────────────────────────────

/// Second byte of an [`OperationType::KeyboardWrite`] frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyboardSubtype {
    /// Press and release one ASCII character (32–127).
    AsciiWrite = 0x01,
    AsciiPress = 0x02,
    AsciiRelease = 0x03,
    /// Payload is a modifier id 0–7.
    ModifierPress = 0x04,
    ModifierRelease = 0x05,
    /// Payload is a controller function-key code (F1–F24).
    FunctionKeyPress = 0x06,
    FunctionKeyRelease = 0x07,
    /// Payload is a controller code for navigation/editing keys.
    OtherKeyPress = 0x08,
    OtherKeyRelease = 0x09,
    /// Payload is a numpad id 0x00–0x10.
    NumpadPress = 0x0A,
    NumpadRelease = 0x0B,
    SpecialPause = 0xF9,
    SpecialPrintScreen = 0xFA,
    SpecialScrollLock = 0xFB,
    SpecialNumLock = 0xFC,
    SpecialCtrlAltDel = 0xFD,
    /// Release everything: held keys and modifiers.
    SpecialReset = 0xFE,
    SpecialReserved = 0xFF,
}

/// Special-key subtypes reserved for further hardware-offloaded chords.
pub const KEYBOARD_SPECIAL_UNASSIGNED: std::ops::RangeInclusive<u8> = 0xF0..=0xF8;

impl TryFrom<u8> for KeyboardSubtype {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(KeyboardSubtype::AsciiWrite),
            0x02 => Ok(KeyboardSubtype::AsciiPress),
            0x03 => Ok(KeyboardSubtype::AsciiRelease),
            0x04 => Ok(KeyboardSubtype::ModifierPress),
            0x05 => Ok(KeyboardSubtype::ModifierRelease),
            0x06 => Ok(KeyboardSubtype::FunctionKeyPress),
            0x07 => Ok(KeyboardSubtype::FunctionKeyRelease),
            0x08 => Ok(KeyboardSubtype::OtherKeyPress),
            0x09 => Ok(KeyboardSubtype::OtherKeyRelease),
            0x0A => Ok(KeyboardSubtype::NumpadPress),
            0x0B => Ok(KeyboardSubtype::NumpadRelease),
            0xF9 => Ok(KeyboardSubtype::SpecialPause),
            0xFA => Ok(KeyboardSubtype::SpecialPrintScreen),
            0xFB => Ok(KeyboardSubtype::SpecialScrollLock),
            0xFC => Ok(KeyboardSubtype::SpecialNumLock),
            0xFD => Ok(KeyboardSubtype::SpecialCtrlAltDel),
            0xFE => Ok(KeyboardSubtype::SpecialReset),
            0xFF => Ok(KeyboardSubtype::SpecialReserved),
            _ => Err(()),
        }
    }
}

// ── Mouse subtypes ────────────────────────────────────────────────────────────

/// Second byte of an [`OperationType::MouseWrite`] frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseSubtype {
    Click = 0x01,
    Press = 0x02,
    Release = 0x03,
    /// Absolute jump; payload packs the X/Y grid cell.
    SetPosition = 0x04,
    Reset = 0x05,
}

impl TryFrom<u8> for MouseSubtype {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MouseSubtype::Click),
            0x02 => Ok(MouseSubtype::Press),
            0x03 => Ok(MouseSubtype::Release),
            0x04 => Ok(MouseSubtype::SetPosition),
            0x05 => Ok(MouseSubtype::Reset),
            _ => Err(()),
        }
    }
}

/// Mouse button identifier as carried in a mouse-write payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x03,
}

impl MouseButton {
    /// Bit of this button in a HID mouse report's button byte.
    pub fn mask(self) -> u8 {
        match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MouseButton::Left),
            0x02 => Ok(MouseButton::Right),
            0x03 => Ok(MouseButton::Middle),
            _ => Err(()),
        }
    }
}

/// Scroll direction carried in the subtype byte of a scroll frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ScrollDirection {
    Up = 0x00,
    Down = 0x01,
}

impl TryFrom<u8> for ScrollDirection {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(ScrollDirection::Up),
            0x01 => Ok(ScrollDirection::Down),
            _ => Err(()),
        }
    }
}

// ── Switch subtypes ───────────────────────────────────────────────────────────

/// GPIO-controlled line that connects or disconnects a USB sub-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SwitchLine {
    UsbHid = 0x01,
    UsbMassStorage = 0x02,
}

impl TryFrom<u8> for SwitchLine {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(SwitchLine::UsbHid),
            0x02 => Ok(SwitchLine::UsbMassStorage),
            _ => Err(()),
        }
    }
}

// ── Response codes ────────────────────────────────────────────────────────────

/// The single byte written back for every processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0x00,
    /// Reserved operation type or unknown/reserved subtype.
    UnknownOperation = 0x01,
    /// Operation type byte is not in the instruction set.
    InvalidOperationType = 0x02,
    /// Payload outside the domain of its subtype.
    InvalidKeyValue = 0x03,
    /// Subtype recognised but not wired to an action.
    NotImplemented = 0x04,
}

impl ResponseCode {
    /// Wire byte for this response.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        code.as_byte()
    }
}

impl TryFrom<u8> for ResponseCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(ResponseCode::Ok),
            0x01 => Ok(ResponseCode::UnknownOperation),
            0x02 => Ok(ResponseCode::InvalidOperationType),
            0x03 => Ok(ResponseCode::InvalidKeyValue),
            0x04 => Ok(ResponseCode::NotImplemented),
            _ => Err(()),
        }
    }
}
