//! Fixed-stride frame decoder for the controller byte stream.
//!
//! Wire format:
//! ```text
//! [operation_type:1][operation_subtype_or_x:1][payload_or_y:1]
//! ```
//! There is no length prefix, delimiter or checksum.  The decoder only
//! counts bytes; it cannot notice a lost byte.  Alignment is restored by the
//! controller sending a DATA_RESET once it suspects the device state.

use thiserror::Error;

use crate::protocol::messages::FRAME_SIZE;

/// Errors raised while encoding to, or decoding from, raw byte buffers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than one frame.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The output buffer cannot hold the encoded bytes.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// One 3-byte command frame, not yet interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub operation: u8,
    /// Subtype tag, X delta (mouse move) or scroll direction.
    pub subtype: u8,
    /// Payload, Y delta (mouse move) or scroll tilt.
    pub payload: u8,
}

impl Frame {
    pub const fn new(operation: u8, subtype: u8, payload: u8) -> Self {
        Self {
            operation,
            subtype,
            payload,
        }
    }

    pub const fn from_bytes(bytes: [u8; FRAME_SIZE]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Reads a frame from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if fewer than 3 bytes are
    /// available.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        match bytes {
            [operation, subtype, payload, ..] => Ok(Self::new(*operation, *subtype, *payload)),
            _ => Err(ProtocolError::InsufficientData {
                needed: FRAME_SIZE,
                available: bytes.len(),
            }),
        }
    }

    pub const fn to_bytes(self) -> [u8; FRAME_SIZE] {
        [self.operation, self.subtype, self.payload]
    }
}

/// Result of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Frame(Frame),
    NeedMoreBytes,
}

/// Assembles frames from a byte stream, one byte at a time.
///
/// Partial frames are buffered internally and never surface as a [`Frame`].
#[derive(Debug, Default, Clone)]
pub struct FrameDecoder {
    buf: [u8; FRAME_SIZE],
    filled: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte.  Every third byte completes a frame.
    pub fn push(&mut self, byte: u8) -> Decoded {
        self.buf[self.filled] = byte;
        self.filled += 1;
        if self.filled < FRAME_SIZE {
            return Decoded::NeedMoreBytes;
        }
        self.filled = 0;
        Decoded::Frame(Frame::from_bytes(self.buf))
    }

    /// Feeds a chunk of bytes and returns the completed frames in order.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = Frame> + 'a {
        bytes.iter().filter_map(move |&byte| match self.push(byte) {
            Decoded::Frame(frame) => Some(frame),
            Decoded::NeedMoreBytes => None,
        })
    }

    /// Number of bytes of the current partial frame.
    pub fn pending(&self) -> usize {
        self.filled
    }

    /// Drops any partial frame so the next byte starts a new one.
    pub fn resync(&mut self) {
        self.filled = 0;
    }
}
