//! # usbkvm-device
//!
//! Runs the `usbkvm-core` command engine on a desktop host.
//!
//! On the real board the controller talks over a serial line, the HID
//! reports leave through the USB device port, and two GPIO pins drive the
//! USB switches.  Here:
//!
//! - **`link`** – serves the byte stream over TCP (one controller at a time)
//!   or stdin/stdout, keeping one device alive across connections.
//! - **`sinks`** – log-backed stand-ins for the USB transport and GPIO lines.
//! - **`config`** – the TOML file that sets link, pacing, pin and logging
//!   options.

pub mod config;
pub mod link;
pub mod sinks;

pub use config::{load_config, ConfigError, DeviceConfig, LinkMode};
pub use link::{
    run_tcp, serve_link, serve_stdio, share, LinkError, LinkOptions, LinkStats, SharedDevice,
};
pub use sinks::{GpioSwitchSink, TracingHidSink};
