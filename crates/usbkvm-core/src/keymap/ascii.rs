//! ASCII → HID usage table (US layout).
//!
//! The controller types text by sending printable ASCII codes 32–127.  Each
//! code is resolved to the physical key that produces it on a US keyboard
//! plus whether Shift must be held while that key is down.

use super::hid::HidKeyCode;

/// Lowest ASCII code accepted by the keyboard write/press/release operations.
pub const ASCII_FIRST: u8 = 0x20;

/// Highest ASCII code accepted (DEL).
pub const ASCII_LAST: u8 = 0x7F;

const LETTERS: [HidKeyCode; 26] = [
    HidKeyCode::KeyA,
    HidKeyCode::KeyB,
    HidKeyCode::KeyC,
    HidKeyCode::KeyD,
    HidKeyCode::KeyE,
    HidKeyCode::KeyF,
    HidKeyCode::KeyG,
    HidKeyCode::KeyH,
    HidKeyCode::KeyI,
    HidKeyCode::KeyJ,
    HidKeyCode::KeyK,
    HidKeyCode::KeyL,
    HidKeyCode::KeyM,
    HidKeyCode::KeyN,
    HidKeyCode::KeyO,
    HidKeyCode::KeyP,
    HidKeyCode::KeyQ,
    HidKeyCode::KeyR,
    HidKeyCode::KeyS,
    HidKeyCode::KeyT,
    HidKeyCode::KeyU,
    HidKeyCode::KeyV,
    HidKeyCode::KeyW,
    HidKeyCode::KeyX,
    HidKeyCode::KeyY,
    HidKeyCode::KeyZ,
];

const DIGITS: [HidKeyCode; 10] = [
    HidKeyCode::Digit0,
    HidKeyCode::Digit1,
    HidKeyCode::Digit2,
    HidKeyCode::Digit3,
    HidKeyCode::Digit4,
    HidKeyCode::Digit5,
    HidKeyCode::Digit6,
    HidKeyCode::Digit7,
    HidKeyCode::Digit8,
    HidKeyCode::Digit9,
];

/// Resolves an ASCII code to its key and whether Shift is implied.
///
/// Returns `None` for control characters and anything above 127.
pub fn ascii_to_hid(code: u8) -> Option<(HidKeyCode, bool)> {
    use HidKeyCode::*;

    let mapped = match code {
        b'a'..=b'z' => (LETTERS[(code - b'a') as usize], false),
        b'A'..=b'Z' => (LETTERS[(code - b'A') as usize], true),
        b'0'..=b'9' => (DIGITS[(code - b'0') as usize], false),
        b' ' => (Space, false),
        b'!' => (Digit1, true),
        b'"' => (Quote, true),
        b'#' => (Digit3, true),
        b'$' => (Digit4, true),
        b'%' => (Digit5, true),
        b'&' => (Digit7, true),
        b'\'' => (Quote, false),
        b'(' => (Digit9, true),
        b')' => (Digit0, true),
        b'*' => (Digit8, true),
        b'+' => (Equal, true),
        b',' => (Comma, false),
        b'-' => (Minus, false),
        b'.' => (Period, false),
        b'/' => (Slash, false),
        b':' => (Semicolon, true),
        b';' => (Semicolon, false),
        b'<' => (Comma, true),
        b'=' => (Equal, false),
        b'>' => (Period, true),
        b'?' => (Slash, true),
        b'@' => (Digit2, true),
        b'[' => (BracketLeft, false),
        b'\\' => (Backslash, false),
        b']' => (BracketRight, false),
        b'^' => (Digit6, true),
        b'_' => (Minus, true),
        b'`' => (Backquote, false),
        b'{' => (BracketLeft, true),
        b'|' => (Backslash, true),
        b'}' => (BracketRight, true),
        b'~' => (Backquote, true),
        ASCII_LAST => (Delete, false),
        _ => return None,
    };
    Some(mapped)
}
