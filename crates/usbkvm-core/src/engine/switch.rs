//! USB sub-device switch state.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::SwitchLine;
use crate::sink::SwitchSink;

/// Whether each USB sub-device is electrically connected to the target host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    pub usb_hid: bool,
    pub usb_mass_storage: bool,
}

impl SwitchState {
    pub fn get(&self, line: SwitchLine) -> bool {
        match line {
            SwitchLine::UsbHid => self.usb_hid,
            SwitchLine::UsbMassStorage => self.usb_mass_storage,
        }
    }

    /// Records the new level and writes it to the GPIO line.
    ///
    /// The line is written even when the level is unchanged.
    pub fn set<S: SwitchSink + ?Sized>(&mut self, line: SwitchLine, attached: bool, gpio: &mut S) {
        match line {
            SwitchLine::UsbHid => self.usb_hid = attached,
            SwitchLine::UsbMassStorage => self.usb_mass_storage = attached,
        }
        gpio.set_switch(line, attached);
    }

    /// Writes every line's current level to `gpio`.
    pub fn drive_all<S: SwitchSink + ?Sized>(&self, gpio: &mut S) {
        gpio.set_switch(SwitchLine::UsbHid, self.usb_hid);
        gpio.set_switch(SwitchLine::UsbMassStorage, self.usb_mass_storage);
    }
}
