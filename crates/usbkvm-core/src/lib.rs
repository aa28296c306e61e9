//! # usbkvm-core
//!
//! Command protocol core of a USB KVM device: a microcontroller that
//! impersonates a keyboard, a mouse and a mass-storage drive toward a target
//! host, while a controlling computer drives it over a serial link.
//!
//! This crate has no dependencies on OS APIs or sockets and does not
//! allocate on the dispatch path.
//!
//! # Architecture overview (for beginners)
//!
//! The controller sends a stream of 3-byte frames.  For each frame the
//! device answers with exactly one status byte.
//!
//! - **`protocol`** – Wire codes, the [`FrameDecoder`] that cuts the byte
//!   stream into frames, [`Command::parse`] which turns a frame into a typed
//!   command, the instruction counter, and the response encoder.
//!
//! - **`engine`** – The [`Device`] context.  It owns keyboard, mouse and
//!   switch state and dispatches commands to them, pacing keyboard reports
//!   so the host never sees two closer than 20 ms apart.
//!
//! - **`keymap`** – Tables translating controller key codes (ASCII,
//!   function keys, navigation keys, numpad ids, modifier ids) into USB HID
//!   usages.
//!
//! - **`report`** – Boot-protocol keyboard and mouse reports.
//!
//! - **`sink`** – The traits through which the device talks to the USB
//!   transport and the GPIO switch lines, plus recording implementations for
//!   tests.

pub mod engine;
pub mod keymap;
pub mod protocol;
pub mod report;
pub mod sink;

// Re-export the most-used types at the crate root so callers can write
// `usbkvm_core::Device` instead of `usbkvm_core::engine::Device`.
pub use engine::{Clock, Device, DeviceOptions, ManualClock, SystemClock};
pub use keymap::HidKeyCode;
pub use protocol::{
    encode_info_message, Command, CommandError, Decoded, Frame, FrameDecoder, ProtocolError,
    ResponseCode,
};
pub use report::{KeyboardReport, Motion, MouseReport};
pub use sink::{HidSink, SwitchSink};
