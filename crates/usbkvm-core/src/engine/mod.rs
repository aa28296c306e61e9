//! The device context: all mutable state of one USB KVM plus its
//! collaborators.
//!
//! # Dispatch order
//!
//! [`Device::dispatch`] handles one frame to completion:
//!
//! 1. Parse the frame into a [`Command`].
//! 2. Every frame, valid or not, increments the instruction counter, except
//!    RESET_INSTR_COUNT, which zeroes it when executed.
//! 3. Rejected frames return their response code; no state changes.
//! 4. Valid commands run against the owning engine, which emits HID reports
//!    or switch writes through the sinks.
//!
//! Keyboard reports pass through a [`Pacer`] so two of them are never sent
//! closer together than the configured minimum delay.  The wait happens on
//! the calling thread.

pub mod keyboard;
pub mod mouse;
pub mod pacing;
pub mod switch;

use std::time::Duration;

use tracing::{debug, trace};

use crate::protocol::command::{Command, CommandError};
use crate::protocol::counter::InstructionCounter;
use crate::protocol::frame::Frame;
use crate::protocol::messages::{ResponseCode, MIN_KEY_EVENTS_DELAY};
use crate::report::{KeyboardReport, MouseReport};
use crate::sink::{HidSink, SwitchSink};

pub use keyboard::KeyboardState;
pub use mouse::{MouseState, MOUSE_CENTER};
pub use pacing::{Clock, ManualClock, Pacer, SystemClock};
pub use switch::SwitchState;

/// Power-on settings of a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Initial level of the USB HID switch line.
    pub usb_hid_attached: bool,
    /// Initial level of the USB mass-storage switch line.
    pub usb_mass_storage_attached: bool,
    /// Minimum spacing between keyboard reports.
    pub min_key_events_delay: Duration,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            usb_hid_attached: true,
            usb_mass_storage_attached: false,
            min_key_events_delay: MIN_KEY_EVENTS_DELAY,
        }
    }
}

/// One USB KVM: engine state, instruction counter, and collaborators.
pub struct Device<H, S, C = SystemClock> {
    keyboard: KeyboardState,
    mouse: MouseState,
    switches: SwitchState,
    counter: InstructionCounter,
    pacer: Pacer,
    clock: C,
    hid: H,
    gpio: S,
}

impl<H: HidSink, S: SwitchSink> Device<H, S, SystemClock> {
    /// Creates a device paced by the wall clock.
    pub fn new(hid: H, gpio: S, options: DeviceOptions) -> Self {
        Self::with_clock(hid, gpio, SystemClock::new(), options)
    }
}

impl<H: HidSink, S: SwitchSink, C: Clock> Device<H, S, C> {
    /// Creates a device with an explicit clock and drives the initial switch
    /// levels out to `gpio`.
    pub fn with_clock(hid: H, mut gpio: S, clock: C, options: DeviceOptions) -> Self {
        let switches = SwitchState {
            usb_hid: options.usb_hid_attached,
            usb_mass_storage: options.usb_mass_storage_attached,
        };
        switches.drive_all(&mut gpio);

        Self {
            keyboard: KeyboardState::new(),
            mouse: MouseState::new(),
            switches,
            counter: InstructionCounter::new(),
            pacer: Pacer::new(options.min_key_events_delay),
            clock,
            hid,
            gpio,
        }
    }

    /// Processes one frame and returns the response for the controller.
    pub fn dispatch(&mut self, frame: &Frame) -> ResponseCode {
        let command = Command::parse(frame);

        // The counter reset is the one frame that is not counted.
        let count = match command {
            Ok(Command::ResetInstructionCount) => self.counter.get(),
            _ => self.counter.increment(),
        };

        let outcome = command.and_then(|command| self.execute(command));
        match outcome {
            Ok(()) => {
                debug!(count, ?frame, "frame dispatched");
                ResponseCode::Ok
            }
            Err(err) => {
                let code = ResponseCode::from(err);
                debug!(count, ?frame, %err, ?code, "frame rejected");
                code
            }
        }
    }

    /// Returns keyboard and mouse to power-on state.  Switches and the
    /// instruction counter are left alone.
    pub fn data_reset(&mut self) {
        let Self {
            keyboard,
            mouse,
            pacer,
            clock,
            hid,
            ..
        } = self;
        reset_engines(keyboard, mouse, pacer, clock, hid);
    }

    fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        let Self {
            keyboard,
            mouse,
            switches,
            counter,
            pacer,
            clock,
            hid,
            gpio,
        } = self;

        match command {
            Command::Keyboard(command) => {
                keyboard.apply(command, &mut |report| emit_keyboard(pacer, clock, hid, report))?
            }
            Command::Mouse(command) => mouse.apply(command, &mut |report| emit_mouse(hid, report)),
            Command::MouseMove { dx, dy } => {
                mouse.move_relative(dx, dy, &mut |report| emit_mouse(hid, report))
            }
            Command::MouseScroll { direction, tilt } => {
                mouse.scroll(direction, tilt, &mut |report| emit_mouse(hid, report))
            }
            Command::Switch { line, attached } => {
                switches.set(line, attached, gpio);
                debug!(?line, attached, "switch set");
            }
            Command::DataReset => reset_engines(keyboard, mouse, pacer, clock, hid),
            Command::ResetInstructionCount => {
                counter.reset();
                debug!("instruction counter reset");
            }
        }
        Ok(())
    }

    pub fn keyboard_state(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn mouse_state(&self) -> &MouseState {
        &self.mouse
    }

    pub fn switch_state(&self) -> SwitchState {
        self.switches
    }

    pub fn instruction_count(&self) -> u32 {
        self.counter.get()
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }

    pub fn hid_mut(&mut self) -> &mut H {
        &mut self.hid
    }

    pub fn gpio(&self) -> &S {
        &self.gpio
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Tears the device apart, returning its collaborators.
    pub fn into_parts(self) -> (H, S, C) {
        (self.hid, self.gpio, self.clock)
    }
}

fn emit_keyboard<H: HidSink, C: Clock>(
    pacer: &mut Pacer,
    clock: &C,
    hid: &mut H,
    report: KeyboardReport,
) {
    pacer.wait_turn(clock);
    trace!(?report, "keyboard report");
    hid.send_keyboard_report(&report);
}

fn emit_mouse<H: HidSink>(hid: &mut H, report: MouseReport) {
    trace!(?report, "mouse report");
    hid.send_mouse_report(&report);
}

fn reset_engines<H: HidSink, C: Clock>(
    keyboard: &mut KeyboardState,
    mouse: &mut MouseState,
    pacer: &mut Pacer,
    clock: &C,
    hid: &mut H,
) {
    keyboard.reset(&mut |report| emit_keyboard(pacer, clock, hid, report));
    mouse.reset(&mut |report| emit_mouse(hid, report));
    debug!("keyboard and mouse state reset");
}
