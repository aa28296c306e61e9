//! Key code translation tables.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Controller key codes (ASCII, function, other, numpad, modifier ids) are
//! translated to HID at the command decode boundary.

pub mod ascii;
pub mod hid;
pub mod keys;

pub use ascii::ascii_to_hid;
pub use hid::HidKeyCode;
pub use keys::{
    function_key_to_hid, numpad_to_hid, other_key_to_hid, AsciiKey, KeyId, Modifier, SpecialKey,
};
