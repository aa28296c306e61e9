//! Integration tests for the usbkvm-core command stream.
//!
//! Each test feeds raw controller bytes through the public API (frame
//! decoder, then device dispatch) and checks the response bytes, the engine
//! state, and the HID reports that reached the sink.

use std::time::Duration;

use usbkvm_core::{
    engine::MOUSE_CENTER,
    keymap::{AsciiKey, KeyId},
    protocol::{SwitchLine, MIN_KEY_EVENTS_DELAY},
    sink::mock::{RecordedReport, RecordingHidSink, RecordingSwitchSink},
    Clock, Device, DeviceOptions, FrameDecoder, HidKeyCode, KeyboardReport, ManualClock, Motion,
    ResponseCode,
};

type TestDevice = Device<RecordingHidSink, RecordingSwitchSink, ManualClock>;

fn new_device() -> TestDevice {
    let clock = ManualClock::new();
    Device::with_clock(
        RecordingHidSink::with_clock(clock.clone()),
        RecordingSwitchSink::new(),
        clock,
        DeviceOptions::default(),
    )
}

/// Runs `bytes` through a fresh decoder into `device` and collects the
/// response bytes.
fn run(device: &mut TestDevice, bytes: &[u8]) -> Vec<u8> {
    let mut decoder = FrameDecoder::new();
    decoder
        .feed(bytes)
        .map(|frame| device.dispatch(&frame).as_byte())
        .collect()
}

fn held_ascii(device: &TestDevice, code: u8) -> bool {
    let key = AsciiKey::new(code).expect("printable ASCII");
    device.keyboard_state().is_held(KeyId::Ascii(key))
}

#[test]
fn test_one_response_per_complete_frame() {
    // Arrange
    let mut device = new_device();
    let bytes = [0x01, 0x01, b'o', 0x01, 0x01, b'k', 0x01];

    // Act
    let responses = run(&mut device, &bytes);

    // Assert – the trailing partial frame is never dispatched
    assert_eq!(responses, vec![0x00, 0x00]);
    assert_eq!(device.instruction_count(), 2);
}

#[test]
fn test_ascii_press_release_round_trip() {
    // Arrange
    let mut device = new_device();

    for code in 32u8..=127 {
        // Act
        let responses = run(&mut device, &[0x01, 0x02, code, 0x01, 0x03, code]);

        // Assert
        assert_eq!(responses, vec![0x00, 0x00], "code 0x{code:02X}");
        assert!(device.keyboard_state().is_released(), "code 0x{code:02X}");
    }
}

#[test]
fn test_ascii_press_out_of_range_is_rejected_without_state_change() {
    // Arrange
    let mut device = new_device();
    run(&mut device, &[0x01, 0x02, b'q']);

    // Act
    let responses = run(&mut device, &[0x01, 0x02, 128]);

    // Assert
    assert_eq!(responses, vec![ResponseCode::InvalidKeyValue.as_byte()]);
    assert!(held_ascii(&device, b'q'));
    assert_eq!(device.keyboard_state().held_keys().count(), 1);
}

#[test]
fn test_counter_counts_all_frames_and_resets_to_zero() {
    // Arrange
    let mut device = new_device();
    let stream = [
        0x01, 0x01, b'a', // ok
        0x06, 0x00, 0x00, // invalid op type, still counted
        0x00, 0x01, 0x01, // reserved op type, still counted
        0x04, 0x00, 0x80, // tilt too large, still counted
    ];

    // Act
    run(&mut device, &stream);
    let before_reset = device.instruction_count();
    let reset = run(&mut device, &[0xFE, 0x00, 0x00]);
    run(&mut device, &[0x03, 0x01, 0x01]);

    // Assert
    assert_eq!(before_reset, 4);
    assert_eq!(reset, vec![0x00]);
    assert_eq!(device.instruction_count(), 1);
}

#[test]
fn test_data_reset_restores_power_on_state_from_any_state() {
    // Arrange
    let mut device = new_device();
    run(
        &mut device,
        &[
            0x01, 0x02, b'Z', // hold Shift+Z
            0x01, 0x04, 0x03, // hold left GUI
            0x01, 0x0A, 0x05, // hold numpad 5
            0x02, 0x02, 0x03, // hold middle button
            0x02, 0x04, 0x00, // jump to top-left
            0x05, 0x02, 0x01, // attach mass storage
        ],
    );

    // Act
    let responses = run(&mut device, &[0xFF, 0x00, 0x00]);

    // Assert
    assert_eq!(responses, vec![0x00]);
    assert!(device.keyboard_state().is_released());
    assert_eq!(device.mouse_state().buttons(), 0);
    assert_eq!(device.mouse_state().position(), MOUSE_CENTER);
    assert!(device.switch_state().usb_mass_storage);
    assert_eq!(device.instruction_count(), 7);
}

#[test]
fn test_data_reset_is_idempotent() {
    // Arrange
    let mut device = new_device();

    // Act
    let responses = run(&mut device, &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);

    // Assert
    assert_eq!(responses, vec![0x00, 0x00]);
    assert_eq!(device.hid().keyboard_reports(), vec![KeyboardReport::empty(); 2]);
}

#[test]
fn test_scroll_tilt_boundary() {
    // Arrange
    let mut device = new_device();

    // Act
    let responses = run(&mut device, &[0x04, 0x00, 127, 0x04, 0x00, 128]);

    // Assert
    assert_eq!(responses, vec![0x00, ResponseCode::InvalidKeyValue.as_byte()]);
    assert_eq!(device.hid().mouse_reports().len(), 1);
}

#[test]
fn test_unknown_operation_type_touches_no_engine() {
    // Arrange
    let mut device = new_device();

    // Act
    let responses = run(&mut device, &[0x06, 0x01, 0x01]);

    // Assert
    assert_eq!(responses, vec![ResponseCode::InvalidOperationType.as_byte()]);
    assert!(device.hid().reports.is_empty());
    assert!(device.keyboard_state().is_released());
}

#[test]
fn test_key_reports_are_never_closer_than_min_delay() {
    // Arrange
    let mut device = new_device();
    let mut stream = Vec::new();
    for code in b"Hello, World!" {
        stream.extend_from_slice(&[0x01, 0x01, *code]);
    }
    stream.extend_from_slice(&[0x01, 0xFD, 0x00]); // ctrl-alt-del chord
    stream.extend_from_slice(&[0x03, 0x05, 0x05]); // mouse move in between
    stream.extend_from_slice(&[0x01, 0x04, 0x00, 0x01, 0x05, 0x00]);

    // Act
    run(&mut device, &stream);

    // Assert
    let times = &device.hid().keyboard_times;
    assert_eq!(times.len(), 13 * 2 + 2 + 2);
    for pair in times.windows(2) {
        assert!(
            pair[1] - pair[0] >= MIN_KEY_EVENTS_DELAY,
            "reports at {:?} and {:?} are too close",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_slow_controller_is_not_delayed() {
    // Arrange
    let mut device = new_device();
    run(&mut device, &[0x01, 0x01, b'a']);
    let after_first = device.clock().now();
    device.clock().advance(Duration::from_secs(1));

    // Act
    run(&mut device, &[0x01, 0x02, b'b']);

    // Assert
    assert_eq!(after_first, MIN_KEY_EVENTS_DELAY);
    assert_eq!(
        device.hid().keyboard_times.last().copied(),
        Some(MIN_KEY_EVENTS_DELAY + Duration::from_secs(1))
    );
}

#[test]
fn test_switch_with_undefined_subtype_leaves_both_lines() {
    // Arrange
    let mut device = new_device();
    let before = device.switch_state();

    // Act
    let responses = run(&mut device, &[0x05, 0x03, 0x01]);

    // Assert
    assert_eq!(responses, vec![ResponseCode::UnknownOperation.as_byte()]);
    assert_eq!(device.switch_state(), before);
}

#[test]
fn test_switch_sets_drive_gpio_in_order() {
    // Arrange
    let mut device = new_device();

    // Act
    run(&mut device, &[0x05, 0x02, 0x01, 0x05, 0x01, 0x00]);

    // Assert
    assert_eq!(
        device.gpio().writes[2..],
        [(SwitchLine::UsbMassStorage, true), (SwitchLine::UsbHid, false)]
    );
    assert!(!device.switch_state().usb_hid);
}

#[test]
fn test_ascii_write_reports_press_then_release() {
    // Arrange
    let mut device = new_device();

    // Act
    run(&mut device, &[0x01, 0x01, b'?']);

    // Assert
    assert_eq!(
        device.hid().keyboard_reports(),
        vec![
            KeyboardReport::from_keys(0x02, [HidKeyCode::Slash]),
            KeyboardReport::empty(),
        ]
    );
    assert!(!held_ascii(&device, b'?'));
}

#[test]
fn test_mixed_stream_keeps_report_order() {
    // Arrange
    let mut device = new_device();

    // Act
    run(
        &mut device,
        &[
            0x02, 0x01, 0x01, // left click
            0x01, 0x06, 0xC2, // F1 down
            0x03, 0xFE, 0x02, // move (-2, 2)
            0x01, 0x07, 0xC2, // F1 up
        ],
    );

    // Assert
    let kinds: Vec<&str> = device
        .hid()
        .reports
        .iter()
        .map(|r| match r {
            RecordedReport::Keyboard(_) => "kbd",
            RecordedReport::Mouse(_) => "mouse",
        })
        .collect();
    assert_eq!(kinds, vec!["mouse", "mouse", "kbd", "mouse", "kbd"]);
    assert_eq!(
        device.hid().mouse_reports()[2].motion,
        Motion::Relative { dx: -2, dy: 2 }
    );
}

#[test]
fn test_reserved_and_unassigned_keyboard_subtypes() {
    // Arrange
    let mut device = new_device();

    // Act
    let responses = run(
        &mut device,
        &[
            0x01, 0x00, b'a', // reserved subtype
            0x01, 0xFF, 0x00, // reserved special
            0x01, 0xF4, 0x00, // unassigned special chord
            0x01, 0x40, 0x00, // gap
        ],
    );

    // Assert
    assert_eq!(responses, vec![0x01, 0x01, 0x04, 0x01]);
    assert!(device.hid().reports.is_empty());
}

#[test]
fn test_print_screen_chord_keeps_held_alt_and_arrow() {
    // Arrange
    let mut device = new_device();
    run(&mut device, &[0x01, 0x04, 0x02, 0x01, 0x08, 0xD8]);
    device.hid_mut().clear();

    // Act
    let responses = run(&mut device, &[0x01, 0xFA, 0x00]);

    // Assert
    assert_eq!(responses, vec![0x00]);
    assert_eq!(
        device.hid().keyboard_reports(),
        vec![
            KeyboardReport::from_keys(0x04, [HidKeyCode::ArrowLeft, HidKeyCode::PrintScreen]),
            KeyboardReport::from_keys(0x04, [HidKeyCode::ArrowLeft]),
        ]
    );
}

#[test]
fn test_writing_a_held_key_produces_a_fresh_keystroke() {
    // Arrange
    let mut device = new_device();
    run(&mut device, &[0x01, 0x02, b'a']);
    device.hid_mut().clear();

    // Act
    let responses = run(&mut device, &[0x01, 0x01, b'a']);

    // Assert
    assert_eq!(responses, vec![0x00]);
    assert_eq!(
        device.hid().keyboard_reports(),
        vec![
            KeyboardReport::empty(),
            KeyboardReport::from_keys(0, [HidKeyCode::KeyA]),
        ]
    );
    assert!(held_ascii(&device, b'a'));
}
