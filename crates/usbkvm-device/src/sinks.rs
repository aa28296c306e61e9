//! Host-side stand-ins for the USB transport and the switch GPIO lines.
//!
//! A desktop build has no USB device controller and no GPIO bank, so these
//! sinks serialize exactly what the firmware would push out and log it via
//! `tracing`.  They also keep counters and last levels so the runtime and
//! tests can see what happened.

use tracing::{debug, info};
use usbkvm_core::protocol::SwitchLine;
use usbkvm_core::report::{KEYBOARD_REPORT_SIZE, MOUSE_REPORT_MAX_SIZE};
use usbkvm_core::{HidSink, KeyboardReport, MouseReport, SwitchSink};

use crate::config::GpioConfig;

// ── HID ───────────────────────────────────────────────────────────────────────

/// Logs every HID report as the bytes the USB endpoint would carry.
#[derive(Debug, Default)]
pub struct TracingHidSink {
    keyboard_reports: u64,
    mouse_reports: u64,
}

impl TracingHidSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyboard_reports(&self) -> u64 {
        self.keyboard_reports
    }

    pub fn mouse_reports(&self) -> u64 {
        self.mouse_reports
    }
}

impl HidSink for TracingHidSink {
    fn send_keyboard_report(&mut self, report: &KeyboardReport) {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        let len = report.serialize(&mut buf);
        self.keyboard_reports += 1;
        debug!(bytes = ?&buf[..len], n = self.keyboard_reports, "usb keyboard report");
    }

    fn send_mouse_report(&mut self, report: &MouseReport) {
        let mut buf = [0u8; MOUSE_REPORT_MAX_SIZE];
        let len = report.serialize(&mut buf);
        self.mouse_reports += 1;
        debug!(bytes = ?&buf[..len], n = self.mouse_reports, "usb mouse report");
    }
}

// ── GPIO ──────────────────────────────────────────────────────────────────────

/// Drives the two USB switch lines.  On the board each line is a digital
/// output pin; here a write is logged along with the pin number.
#[derive(Debug)]
pub struct GpioSwitchSink {
    hid_pin: u8,
    mass_storage_pin: u8,
    hid_level: Option<bool>,
    mass_storage_level: Option<bool>,
}

impl GpioSwitchSink {
    pub fn new(hid_pin: u8, mass_storage_pin: u8) -> Self {
        Self {
            hid_pin,
            mass_storage_pin,
            hid_level: None,
            mass_storage_level: None,
        }
    }

    pub fn from_config(config: &GpioConfig) -> Self {
        Self::new(config.hid_switch_pin, config.mass_storage_switch_pin)
    }

    /// Pin wired to `line`.
    pub fn pin(&self, line: SwitchLine) -> u8 {
        match line {
            SwitchLine::UsbHid => self.hid_pin,
            SwitchLine::UsbMassStorage => self.mass_storage_pin,
        }
    }

    /// Last level written to `line`, or `None` if it was never driven.
    pub fn level(&self, line: SwitchLine) -> Option<bool> {
        match line {
            SwitchLine::UsbHid => self.hid_level,
            SwitchLine::UsbMassStorage => self.mass_storage_level,
        }
    }
}

impl SwitchSink for GpioSwitchSink {
    fn set_switch(&mut self, line: SwitchLine, attached: bool) {
        let pin = self.pin(line);
        match line {
            SwitchLine::UsbHid => self.hid_level = Some(attached),
            SwitchLine::UsbMassStorage => self.mass_storage_level = Some(attached),
        }
        info!(
            ?line,
            pin,
            level = if attached { "high" } else { "low" },
            "switch line written"
        );
    }
}
