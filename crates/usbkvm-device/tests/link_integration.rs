//! Integration tests for serving the controller protocol over a byte link.
//!
//! The controller side is either an in-memory duplex pipe (for interactive
//! exchanges) or a scripted `tokio_test` mock (for exact byte expectations).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use usbkvm_core::protocol::SwitchLine;
use usbkvm_core::sink::mock::{RecordingHidSink, RecordingSwitchSink};
use usbkvm_core::{Device, DeviceOptions, KeyboardReport, ManualClock};
use usbkvm_device::{run_tcp, serve_link, share, LinkOptions, SharedDevice};

type TestDevice = SharedDevice<RecordingHidSink, RecordingSwitchSink, ManualClock>;

fn new_device() -> TestDevice {
    let clock = ManualClock::new();
    share(Device::with_clock(
        RecordingHidSink::with_clock(clock.clone()),
        RecordingSwitchSink::new(),
        clock,
        DeviceOptions::default(),
    ))
}

#[tokio::test]
async fn test_scripted_controller_gets_banner_then_one_byte_per_frame() {
    // Arrange
    let device = new_device();
    let reader = tokio_test::io::Builder::new()
        .read(&[0x01, 0x01])
        .read(&[b'a', 0x05, 0x02])
        .read(&[0x01, 0x07, 0x00, 0x00])
        .build();
    let writer = tokio_test::io::Builder::new()
        .write(&[0xED, b'o', b'k', 0xEF])
        .write(&[0x00])
        .write(&[0x00])
        .write(&[0x02])
        .build();
    let options = LinkOptions {
        banner: Some("ok".to_string()),
        ..LinkOptions::default()
    };

    // Act
    let stats = serve_link(reader, writer, Arc::clone(&device), &options)
        .await
        .expect("link ok");

    // Assert
    assert_eq!(stats.frames_dispatched, 3);
    assert_eq!(stats.discarded_bytes, 0);
    let device = device.lock().expect("lock");
    assert!(device.switch_state().usb_mass_storage);
    assert_eq!(
        device.gpio().writes.last(),
        Some(&(SwitchLine::UsbMassStorage, true))
    );
}

#[tokio::test]
async fn test_duplex_controller_sees_responses_as_it_sends() {
    // Arrange
    let device = new_device();
    let (mut controller, server) = tokio::io::duplex(64);
    let (server_rx, server_tx) = tokio::io::split(server);
    let link_device = Arc::clone(&device);
    let link = tokio::spawn(async move {
        serve_link(server_rx, server_tx, link_device, &LinkOptions::default()).await
    });

    // Act: one frame at a time, waiting for each answer
    let mut answers = Vec::new();
    for frame in [[0x01, 0x02, b'Q'], [0x01, 0x02, 200], [0x01, 0x03, b'Q']] {
        controller.write_all(&frame).await.expect("write frame");
        let mut byte = [0u8; 1];
        controller.read_exact(&mut byte).await.expect("read response");
        answers.push(byte[0]);
    }
    controller.shutdown().await.expect("shutdown");
    drop(controller);
    let stats = link.await.expect("join").expect("link ok");

    // Assert
    assert_eq!(answers, vec![0x00, 0x03, 0x00]);
    assert_eq!(stats.responses_written, 3);
    let device = device.lock().expect("lock");
    assert!(device.keyboard_state().is_released());
    assert_eq!(
        device.hid().keyboard_reports().last(),
        Some(&KeyboardReport::empty())
    );
}

#[tokio::test]
async fn test_frames_split_across_writes_are_reassembled() {
    // Arrange
    let device = new_device();
    let reader = tokio_test::io::Builder::new()
        .read(&[0x03])
        .read(&[0x05])
        .read(&[0xFB, 0x03, 0x01])
        .read(&[0x01])
        .build();
    let mut written = Vec::new();

    // Act
    let stats = serve_link(reader, &mut written, Arc::clone(&device), &LinkOptions::default())
        .await
        .expect("link ok");

    // Assert
    assert_eq!(written, vec![0x00, 0x00]);
    assert_eq!(stats.bytes_read, 6);
    assert_eq!(device.lock().expect("lock").hid().mouse_reports().len(), 2);
}

#[tokio::test]
async fn test_queued_frames_are_answered_after_controller_closes() {
    // Arrange: more frames than the queue holds, then EOF
    let device = new_device();
    let mut input = Vec::new();
    for _ in 0..20 {
        input.extend_from_slice(&[0x03, 0x01, 0x01]);
    }
    let reader: &[u8] = &input;
    let mut written = Vec::new();
    let options = LinkOptions {
        banner: None,
        frame_queue_depth: 2,
    };

    // Act
    let stats = serve_link(reader, &mut written, Arc::clone(&device), &options)
        .await
        .expect("link ok");

    // Assert
    assert_eq!(written, vec![0x00; 20]);
    assert_eq!(stats.frames_dispatched, 20);
    assert_eq!(device.lock().expect("lock").instruction_count(), 20);
}

#[tokio::test]
async fn test_tcp_loop_serves_successive_controllers_on_one_device() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let device = new_device();
    let running = Arc::new(AtomicBool::new(true));
    let server = tokio::spawn(run_tcp(
        listener,
        Arc::clone(&device),
        LinkOptions::default(),
        Arc::clone(&running),
    ));

    // Act: first controller holds a key, second one reads the counter state
    let mut first = TcpStream::connect(addr).await.expect("connect first");
    first.write_all(&[0x01, 0x02, b'k']).await.expect("write");
    let mut byte = [0u8; 1];
    first.read_exact(&mut byte).await.expect("response");
    drop(first);

    let mut second = TcpStream::connect(addr).await.expect("connect second");
    second.write_all(&[0x02, 0x01, 0x02]).await.expect("write");
    let mut second_byte = [0u8; 1];
    second.read_exact(&mut second_byte).await.expect("response");
    drop(second);

    running.store(false, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("accept loop stops")
        .expect("join")
        .expect("loop ok");

    // Assert
    assert_eq!((byte[0], second_byte[0]), (0x00, 0x00));
    let device = device.lock().expect("lock");
    assert_eq!(device.instruction_count(), 2);
    assert_eq!(device.keyboard_state().held_keys().count(), 1);
}
