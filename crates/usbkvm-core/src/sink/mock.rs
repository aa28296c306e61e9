//! Recording sinks for unit and integration testing.
//!
//! # Why recording sinks?
//!
//! The real HID and GPIO collaborators touch hardware that a test machine
//! does not have.  These replacements store every call in memory, in
//! order, so assertions can inspect exactly what the engines emitted.
//!
//! [`RecordingHidSink::with_clock`] additionally stamps each keyboard report
//! with the time it was received, which lets tests check report pacing
//! against a [`ManualClock`].

use std::time::Duration;

use crate::engine::pacing::{Clock, ManualClock};
use crate::protocol::messages::SwitchLine;
use crate::report::{KeyboardReport, MouseReport};
use crate::sink::{HidSink, SwitchSink};

/// One HID report, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

/// HID sink that records every report.
#[derive(Debug, Default, Clone)]
pub struct RecordingHidSink {
    /// Every report, keyboard and mouse interleaved.
    pub reports: Vec<RecordedReport>,
    /// Arrival time of each keyboard report, when a clock is attached.
    pub keyboard_times: Vec<Duration>,
    clock: Option<ManualClock>,
}

impl RecordingHidSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records keyboard arrival times from `clock`.
    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    pub fn keyboard_reports(&self) -> Vec<KeyboardReport> {
        self.reports
            .iter()
            .filter_map(|report| match report {
                RecordedReport::Keyboard(r) => Some(*r),
                RecordedReport::Mouse(_) => None,
            })
            .collect()
    }

    pub fn mouse_reports(&self) -> Vec<MouseReport> {
        self.reports
            .iter()
            .filter_map(|report| match report {
                RecordedReport::Mouse(r) => Some(*r),
                RecordedReport::Keyboard(_) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.keyboard_times.clear();
    }
}

impl HidSink for RecordingHidSink {
    fn send_keyboard_report(&mut self, report: &KeyboardReport) {
        if let Some(clock) = &self.clock {
            self.keyboard_times.push(clock.now());
        }
        self.reports.push(RecordedReport::Keyboard(*report));
    }

    fn send_mouse_report(&mut self, report: &MouseReport) {
        self.reports.push(RecordedReport::Mouse(*report));
    }
}

/// GPIO sink that records every line write.
#[derive(Debug, Default, Clone)]
pub struct RecordingSwitchSink {
    pub writes: Vec<(SwitchLine, bool)>,
}

impl RecordingSwitchSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SwitchSink for RecordingSwitchSink {
    fn set_switch(&mut self, line: SwitchLine, attached: bool) {
        self.writes.push((line, attached));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_are_kept_in_emission_order() {
        // Arrange
        let mut sink = RecordingHidSink::new();

        // Act
        sink.send_mouse_report(&MouseReport::buttons_only(0x01));
        sink.send_keyboard_report(&KeyboardReport::empty());

        // Assert
        assert!(matches!(sink.reports[0], RecordedReport::Mouse(_)));
        assert!(matches!(sink.reports[1], RecordedReport::Keyboard(_)));
        assert_eq!(sink.keyboard_reports().len(), 1);
        assert_eq!(sink.mouse_reports().len(), 1);
    }

    #[test]
    fn test_keyboard_times_follow_attached_clock() {
        // Arrange
        let clock = ManualClock::new();
        let mut sink = RecordingHidSink::with_clock(clock.clone());

        // Act
        sink.send_keyboard_report(&KeyboardReport::empty());
        clock.advance(Duration::from_millis(7));
        sink.send_keyboard_report(&KeyboardReport::empty());

        // Assert
        assert_eq!(
            sink.keyboard_times,
            vec![Duration::ZERO, Duration::from_millis(7)]
        );
    }
}
