//! Bytes written back to the controller.
//!
//! Each processed frame produces exactly one response byte.  Out of band,
//! the device may emit a diagnostic text message bracketed by
//! [`INFO_MESSAGE_START`] and [`INFO_MESSAGE_END`]; the body is restricted to
//! 7-bit ASCII so neither marker can appear inside it.

use crate::protocol::frame::ProtocolError;
use crate::protocol::messages::{ResponseCode, INFO_MESSAGE_END, INFO_MESSAGE_START};

/// Writes the response byte for `code` into `buf`.
///
/// # Errors
///
/// Returns [`ProtocolError::BufferTooSmall`] if `buf` is empty.
pub fn encode_response(code: ResponseCode, buf: &mut [u8]) -> Result<usize, ProtocolError> {
    match buf.first_mut() {
        Some(slot) => {
            *slot = code.as_byte();
            Ok(1)
        }
        None => Err(ProtocolError::BufferTooSmall {
            needed: 1,
            available: 0,
        }),
    }
}

/// Number of bytes [`encode_info_message`] writes for `text`.
pub fn info_message_len(text: &str) -> usize {
    text.len() + 2
}

/// Encodes `text` as a bracketed info message into `buf`.
///
/// Non-ASCII bytes are replaced with `'?'` byte for byte.
///
/// # Errors
///
/// Returns [`ProtocolError::BufferTooSmall`] if the message does not fit.
pub fn encode_info_message(text: &str, buf: &mut [u8]) -> Result<usize, ProtocolError> {
    let needed = info_message_len(text);
    if buf.len() < needed {
        return Err(ProtocolError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }

    buf[0] = INFO_MESSAGE_START;
    for (slot, byte) in buf[1..needed - 1].iter_mut().zip(text.bytes()) {
        *slot = if byte.is_ascii() { byte } else { b'?' };
    }
    buf[needed - 1] = INFO_MESSAGE_END;
    Ok(needed)
}
