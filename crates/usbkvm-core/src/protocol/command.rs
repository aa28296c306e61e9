//! Typed interpretation of a [`Frame`].
//!
//! Every operation type gives the subtype and payload bytes a different
//! meaning.  [`Command::parse`] resolves that meaning once, at the decode
//! boundary, so the engines only ever see validated, strongly-typed values.

use thiserror::Error;

use crate::keymap::{
    function_key_to_hid, numpad_to_hid, other_key_to_hid, AsciiKey, HidKeyCode, KeyId, Modifier,
    SpecialKey,
};
use crate::protocol::frame::Frame;
use crate::protocol::messages::{
    KeyboardSubtype, MouseButton, MouseSubtype, OperationType, ResponseCode, ScrollDirection,
    SwitchLine, KEYBOARD_SPECIAL_UNASSIGNED, MAX_SCROLL_TILT, SUBTYPE_RESERVED,
};
use crate::report::ABSOLUTE_AXIS_MAX;

/// Number of cells per axis of the SETPOS grid.
pub const SETPOS_GRID_CELLS: u8 = 16;

/// Why a frame was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("operation type 0x{0:02X} is not in the instruction set")]
    InvalidOperationType(u8),

    #[error("reserved operation or subtype")]
    Reserved,

    #[error("unknown subtype 0x{subtype:02X} for {operation:?}")]
    UnknownSubtype { operation: OperationType, subtype: u8 },

    #[error("subtype 0x{subtype:02X} of {operation:?} is not implemented")]
    NotImplemented { operation: OperationType, subtype: u8 },

    #[error("value 0x{value:02X} rejected: {reason}")]
    InvalidValue { value: u8, reason: &'static str },
}

impl From<CommandError> for ResponseCode {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::InvalidOperationType(_) => ResponseCode::InvalidOperationType,
            CommandError::Reserved | CommandError::UnknownSubtype { .. } => {
                ResponseCode::UnknownOperation
            }
            CommandError::NotImplemented { .. } => ResponseCode::NotImplemented,
            CommandError::InvalidValue { .. } => ResponseCode::InvalidKeyValue,
        }
    }
}

/// A validated keyboard action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardCommand {
    /// Press and release one character.
    Write(AsciiKey),
    Press(KeyId),
    Release(KeyId),
    ModifierPress(Modifier),
    ModifierRelease(Modifier),
    Special(SpecialKey),
    /// Release every key and modifier.
    Reset,
}

/// A validated MOUSE_WRITE action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseCommand {
    Click(MouseButton),
    Press(MouseButton),
    Release(MouseButton),
    /// Absolute target on the `0..=32767` axes.
    SetPosition { x: u16, y: u16 },
    Reset,
}

/// One frame, interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Keyboard(KeyboardCommand),
    Mouse(MouseCommand),
    MouseMove { dx: i8, dy: i8 },
    MouseScroll { direction: ScrollDirection, tilt: u8 },
    Switch { line: SwitchLine, attached: bool },
    ResetInstructionCount,
    DataReset,
}

impl Command {
    /// Interprets `frame`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing the first field that fails
    /// validation.  The error converts into the response code the
    /// controller expects.
    pub fn parse(frame: &Frame) -> Result<Self, CommandError> {
        let operation = OperationType::try_from(frame.operation)
            .map_err(|()| CommandError::InvalidOperationType(frame.operation))?;

        match operation {
            OperationType::Reserved => Err(CommandError::Reserved),
            OperationType::KeyboardWrite => {
                parse_keyboard(frame.subtype, frame.payload).map(Command::Keyboard)
            }
            OperationType::MouseWrite => {
                parse_mouse(frame.subtype, frame.payload).map(Command::Mouse)
            }
            OperationType::MouseMove => Ok(Command::MouseMove {
                dx: frame.subtype as i8,
                dy: frame.payload as i8,
            }),
            OperationType::MouseScroll => parse_scroll(frame.subtype, frame.payload),
            OperationType::SwitchSet => parse_switch(frame.subtype, frame.payload),
            OperationType::ResetInstructionCount => Ok(Command::ResetInstructionCount),
            OperationType::DataReset => Ok(Command::DataReset),
        }
    }
}

// ── Per-operation decoding ────────────────────────────────────────────────────

fn parse_keyboard(subtype: u8, payload: u8) -> Result<KeyboardCommand, CommandError> {
    const OPERATION: OperationType = OperationType::KeyboardWrite;

    if subtype == SUBTYPE_RESERVED {
        return Err(CommandError::Reserved);
    }
    let Ok(kind) = KeyboardSubtype::try_from(subtype) else {
        return Err(if KEYBOARD_SPECIAL_UNASSIGNED.contains(&subtype) {
            CommandError::NotImplemented {
                operation: OPERATION,
                subtype,
            }
        } else {
            CommandError::UnknownSubtype {
                operation: OPERATION,
                subtype,
            }
        });
    };

    let command = match kind {
        KeyboardSubtype::AsciiWrite => KeyboardCommand::Write(ascii(payload)?),
        KeyboardSubtype::AsciiPress => KeyboardCommand::Press(KeyId::Ascii(ascii(payload)?)),
        KeyboardSubtype::AsciiRelease => KeyboardCommand::Release(KeyId::Ascii(ascii(payload)?)),
        KeyboardSubtype::ModifierPress => KeyboardCommand::ModifierPress(modifier(payload)?),
        KeyboardSubtype::ModifierRelease => KeyboardCommand::ModifierRelease(modifier(payload)?),
        KeyboardSubtype::FunctionKeyPress => {
            KeyboardCommand::Press(KeyId::Function(function_key(payload)?))
        }
        KeyboardSubtype::FunctionKeyRelease => {
            KeyboardCommand::Release(KeyId::Function(function_key(payload)?))
        }
        KeyboardSubtype::OtherKeyPress => KeyboardCommand::Press(KeyId::Other(other_key(payload)?)),
        KeyboardSubtype::OtherKeyRelease => {
            KeyboardCommand::Release(KeyId::Other(other_key(payload)?))
        }
        KeyboardSubtype::NumpadPress => KeyboardCommand::Press(KeyId::Numpad(numpad(payload)?)),
        KeyboardSubtype::NumpadRelease => {
            KeyboardCommand::Release(KeyId::Numpad(numpad(payload)?))
        }
        KeyboardSubtype::SpecialPause => KeyboardCommand::Special(SpecialKey::Pause),
        KeyboardSubtype::SpecialPrintScreen => KeyboardCommand::Special(SpecialKey::PrintScreen),
        KeyboardSubtype::SpecialScrollLock => KeyboardCommand::Special(SpecialKey::ScrollLock),
        KeyboardSubtype::SpecialNumLock => KeyboardCommand::Special(SpecialKey::NumLock),
        KeyboardSubtype::SpecialCtrlAltDel => KeyboardCommand::Special(SpecialKey::CtrlAltDel),
        KeyboardSubtype::SpecialReset => KeyboardCommand::Reset,
        KeyboardSubtype::SpecialReserved => return Err(CommandError::Reserved),
    };
    Ok(command)
}

fn ascii(value: u8) -> Result<AsciiKey, CommandError> {
    AsciiKey::new(value).ok_or(CommandError::InvalidValue {
        value,
        reason: "ASCII code outside 32-127",
    })
}

fn modifier(value: u8) -> Result<Modifier, CommandError> {
    Modifier::try_from(value).map_err(|()| CommandError::InvalidValue {
        value,
        reason: "modifier id outside 0-7",
    })
}

fn function_key(value: u8) -> Result<HidKeyCode, CommandError> {
    function_key_to_hid(value).ok_or(CommandError::InvalidValue {
        value,
        reason: "not a function key code",
    })
}

fn other_key(value: u8) -> Result<HidKeyCode, CommandError> {
    other_key_to_hid(value).ok_or(CommandError::InvalidValue {
        value,
        reason: "not a navigation or editing key code",
    })
}

fn numpad(value: u8) -> Result<HidKeyCode, CommandError> {
    numpad_to_hid(value).ok_or(CommandError::InvalidValue {
        value,
        reason: "numpad id above 0x10",
    })
}

fn parse_mouse(subtype: u8, payload: u8) -> Result<MouseCommand, CommandError> {
    if subtype == SUBTYPE_RESERVED {
        return Err(CommandError::Reserved);
    }
    let kind = MouseSubtype::try_from(subtype).map_err(|()| CommandError::UnknownSubtype {
        operation: OperationType::MouseWrite,
        subtype,
    })?;

    let command = match kind {
        MouseSubtype::Click => MouseCommand::Click(button(payload)?),
        MouseSubtype::Press => MouseCommand::Press(button(payload)?),
        MouseSubtype::Release => MouseCommand::Release(button(payload)?),
        MouseSubtype::SetPosition => MouseCommand::SetPosition {
            x: grid_cell_to_axis(payload >> 4),
            y: grid_cell_to_axis(payload & 0x0F),
        },
        MouseSubtype::Reset => MouseCommand::Reset,
    };
    Ok(command)
}

fn button(value: u8) -> Result<MouseButton, CommandError> {
    MouseButton::try_from(value).map_err(|()| CommandError::InvalidValue {
        value,
        reason: "mouse button id outside 1-3",
    })
}

/// Maps a SETPOS grid cell (0–15) onto the absolute axis.
///
/// Cell 0 is the top/left edge and cell 15 the bottom/right edge.
pub fn grid_cell_to_axis(cell: u8) -> u16 {
    let cell = u32::from(cell.min(SETPOS_GRID_CELLS - 1));
    (cell * u32::from(ABSOLUTE_AXIS_MAX) / u32::from(SETPOS_GRID_CELLS - 1)) as u16
}

fn parse_scroll(subtype: u8, payload: u8) -> Result<Command, CommandError> {
    let direction =
        ScrollDirection::try_from(subtype).map_err(|()| CommandError::UnknownSubtype {
            operation: OperationType::MouseScroll,
            subtype,
        })?;
    if payload > MAX_SCROLL_TILT {
        return Err(CommandError::InvalidValue {
            value: payload,
            reason: "scroll tilt above 127",
        });
    }
    Ok(Command::MouseScroll {
        direction,
        tilt: payload,
    })
}

fn parse_switch(subtype: u8, payload: u8) -> Result<Command, CommandError> {
    if subtype == SUBTYPE_RESERVED {
        return Err(CommandError::Reserved);
    }
    let line = SwitchLine::try_from(subtype).map_err(|()| CommandError::UnknownSubtype {
        operation: OperationType::SwitchSet,
        subtype,
    })?;
    Ok(Command::Switch {
        line,
        attached: payload != 0,
    })
}
