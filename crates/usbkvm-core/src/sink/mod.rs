//! Collaborator interfaces driven by the device engines.
//!
//! The USB transport and the GPIO mux are outside this crate.  The engines
//! talk to them only through these traits; calls are synchronous and treated
//! as infallible, since physical-layer failures are the collaborator's
//! problem.

pub mod mock;

use crate::protocol::messages::SwitchLine;
use crate::report::{KeyboardReport, MouseReport};

/// Receives every HID report the device emits toward the target host.
pub trait HidSink {
    fn send_keyboard_report(&mut self, report: &KeyboardReport);

    fn send_mouse_report(&mut self, report: &MouseReport);
}

/// Drives the GPIO lines that connect USB sub-devices to the target host.
#[cfg_attr(test, mockall::automock)]
pub trait SwitchSink {
    /// Sets `line` to attached (`true`) or detached (`false`).
    fn set_switch(&mut self, line: SwitchLine, attached: bool);
}

impl<T: HidSink + ?Sized> HidSink for &mut T {
    fn send_keyboard_report(&mut self, report: &KeyboardReport) {
        (**self).send_keyboard_report(report);
    }

    fn send_mouse_report(&mut self, report: &MouseReport) {
        (**self).send_mouse_report(report);
    }
}

impl<T: SwitchSink + ?Sized> SwitchSink for &mut T {
    fn set_switch(&mut self, line: SwitchLine, attached: bool) {
        (**self).set_switch(line, attached);
    }
}
