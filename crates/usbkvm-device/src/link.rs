//! The controller link: the byte stream that stands in for the serial line.
//!
//! # How a link is served (for beginners)
//!
//! Three pieces run concurrently for each connected controller:
//!
//! ```text
//!  reader ──bytes──▶ FrameDecoder ──Frame──▶ [bounded queue] ──▶ engine worker
//!                                                                     │
//!  writer ◀──────────── status byte ◀──────── [response queue] ◀──────┘
//! ```
//!
//! - The **reader** cuts incoming bytes into 3-byte frames.  A partial frame
//!   stays in the decoder until the rest arrives.
//! - The **engine worker** is a blocking thread (`spawn_blocking`) that owns
//!   the device lock for the whole link and dispatches frames strictly in
//!   arrival order.  Keyboard pacing sleeps here, never on the async runtime.
//! - The **writer** sends one status byte per frame, in the same order, and
//!   flushes after each.
//!
//! When the controller closes its side, frames already queued are still
//! dispatched and answered before the link ends; a trailing partial frame is
//! discarded.  The device itself outlives the link, so engine state carries
//! over to the next controller.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use usbkvm_core::protocol::{encode_response, info_message_len, FRAME_SIZE};
use usbkvm_core::{
    encode_info_message, Clock, Device, Frame, FrameDecoder, HidSink, ProtocolError,
    ResponseCode, SwitchSink,
};

/// How often the accept loop re-checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Bytes requested from the reader per call.
const READ_CHUNK: usize = 64 * FRAME_SIZE;

/// A device shared between successive links.
pub type SharedDevice<H, S, C> = Arc<Mutex<Device<H, S, C>>>;

/// Wraps a device so it can be handed from link to link.
pub fn share<H, S, C>(device: Device<H, S, C>) -> SharedDevice<H, S, C> {
    Arc::new(Mutex::new(device))
}

/// Errors that end a link early.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode outgoing bytes: {0}")]
    Encode(#[from] ProtocolError),

    /// A previous engine worker panicked while holding the device.
    #[error("device state is poisoned by an earlier panic")]
    DevicePoisoned,

    /// The runtime shut down before the engine worker finished.
    #[error("engine worker was cancelled")]
    WorkerCancelled,
}

/// Per-link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    /// Info message written before any status byte, if set.
    pub banner: Option<String>,
    /// Capacity of the frame queue between reader and engine worker.
    pub frame_queue_depth: usize,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            banner: None,
            frame_queue_depth: 64,
        }
    }
}

/// Counters for one finished link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub bytes_read: u64,
    pub frames_received: u64,
    pub frames_dispatched: u64,
    pub responses_written: u64,
    /// Bytes of an incomplete frame left over when the controller closed.
    pub discarded_bytes: usize,
}

// ── Serving one link ──────────────────────────────────────────────────────────

/// Serves one controller until it closes its side (or I/O fails).
///
/// Returns once every complete frame received has been dispatched and its
/// status byte written.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if reading or writing fails, and
/// [`LinkError::DevicePoisoned`] if the device mutex is poisoned.
///
/// # Panics
///
/// A panic inside the engine worker is resumed on the calling task.
pub async fn serve_link<R, W, H, S, C>(
    reader: R,
    writer: W,
    device: SharedDevice<H, S, C>,
    options: &LinkOptions,
) -> Result<LinkStats, LinkError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    H: HidSink + Send + 'static,
    S: SwitchSink + Send + 'static,
    C: Clock + Send + 'static,
{
    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(options.frame_queue_depth.max(1));
    let (response_tx, response_rx) = mpsc::unbounded_channel::<ResponseCode>();

    let worker =
        tokio::task::spawn_blocking(move || run_engine_worker(&device, frame_rx, response_tx));

    let pumped = pump(reader, writer, frame_tx, response_rx, options).await;

    let dispatched = match worker.await {
        Ok(result) => result?,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => return Err(LinkError::WorkerCancelled),
    };

    let mut stats = pumped?;
    stats.frames_dispatched = dispatched;
    Ok(stats)
}

/// Dispatches queued frames in order until the queue closes.
fn run_engine_worker<H, S, C>(
    device: &Mutex<Device<H, S, C>>,
    mut frames: mpsc::Receiver<Frame>,
    responses: mpsc::UnboundedSender<ResponseCode>,
) -> Result<u64, LinkError>
where
    H: HidSink,
    S: SwitchSink,
    C: Clock,
{
    let mut device = device.lock().map_err(|_| LinkError::DevicePoisoned)?;
    let mut dispatched = 0u64;

    while let Some(frame) = frames.blocking_recv() {
        let code = device.dispatch(&frame);
        dispatched += 1;
        if responses.send(code).is_err() {
            warn!(dispatched, "response writer gone; stopping engine worker");
            break;
        }
    }
    Ok(dispatched)
}

/// Moves bytes between the link and the worker queues.
async fn pump<R, W>(
    mut reader: R,
    mut writer: W,
    frame_tx: mpsc::Sender<Frame>,
    mut response_rx: mpsc::UnboundedReceiver<ResponseCode>,
    options: &LinkOptions,
) -> Result<LinkStats, LinkError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = LinkStats::default();

    if let Some(text) = &options.banner {
        let mut banner = vec![0u8; info_message_len(text)];
        let len = encode_info_message(text, &mut banner)?;
        writer.write_all(&banner[..len]).await?;
        writer.flush().await?;
        debug!(%text, "banner sent");
    }

    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; READ_CHUNK];
    // `None` once the controller has closed its side.
    let mut frame_tx = Some(frame_tx);

    loop {
        tokio::select! {
            // Drain responses first so status bytes go out as soon as they exist.
            biased;

            response = response_rx.recv() => {
                let Some(code) = response else {
                    // Worker finished: the reader closed and the queue is drained.
                    break;
                };
                let mut out = [0u8; 1];
                let len = encode_response(code, &mut out)?;
                writer.write_all(&out[..len]).await?;
                writer.flush().await?;
                stats.responses_written += 1;
            }

            read = reader.read(&mut buf), if frame_tx.is_some() => {
                let n = read?;
                if n == 0 {
                    stats.discarded_bytes = decoder.pending();
                    if stats.discarded_bytes > 0 {
                        warn!(
                            bytes = stats.discarded_bytes,
                            "controller closed mid-frame; discarding partial frame"
                        );
                    }
                    debug!("controller closed its side; draining queued frames");
                    frame_tx = None;
                    continue;
                }
                stats.bytes_read += n as u64;

                let Some(tx) = frame_tx.as_ref() else { continue };
                for frame in decoder.feed(&buf[..n]) {
                    stats.frames_received += 1;
                    if tx.send(frame).await.is_err() {
                        // Worker is gone; its result explains why.
                        return Ok(stats);
                    }
                }
            }
        }
    }

    Ok(stats)
}

// ── TCP accept loop ───────────────────────────────────────────────────────────

/// Accepts controllers on `listener`, one at a time, until `running` is
/// cleared.
///
/// The same device serves every connection.  A link error is logged and the
/// loop goes back to accepting.
///
/// # Errors
///
/// Returns [`LinkError::DevicePoisoned`] if the device can no longer be used.
pub async fn run_tcp<H, S, C>(
    listener: TcpListener,
    device: SharedDevice<H, S, C>,
    options: LinkOptions,
    running: Arc<AtomicBool>,
) -> Result<(), LinkError>
where
    H: HidSink + Send + 'static,
    S: SwitchSink + Send + 'static,
    C: Clock + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening for controllers on {addr}");
    }

    while running.load(Ordering::SeqCst) {
        let (stream, peer) = match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                error!("TCP accept error: {e}");
                continue;
            }
            // Timeout: loop back to check the running flag.
            Err(_) => continue,
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(%peer, "could not disable Nagle: {e}");
        }
        info!(%peer, "controller connected");

        let (reader, writer) = stream.into_split();
        tokio::select! {
            result = serve_link(reader, writer, Arc::clone(&device), &options) => {
                log_link_end(peer, result)?;
            }
            () = wait_for_shutdown(&running) => {
                info!(%peer, "shutdown requested; dropping controller");
                break;
            }
        }
    }

    info!("accept loop stopped");
    Ok(())
}

fn log_link_end(peer: SocketAddr, result: Result<LinkStats, LinkError>) -> Result<(), LinkError> {
    match result {
        Ok(stats) => {
            info!(
                %peer,
                frames = stats.frames_dispatched,
                responses = stats.responses_written,
                discarded = stats.discarded_bytes,
                "controller disconnected"
            );
            Ok(())
        }
        Err(LinkError::DevicePoisoned) => Err(LinkError::DevicePoisoned),
        Err(e) => {
            warn!(%peer, "link closed with error: {e}");
            Ok(())
        }
    }
}

async fn wait_for_shutdown(running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(ACCEPT_POLL).await;
    }
}

// ── Stdio ─────────────────────────────────────────────────────────────────────

/// Serves a single controller over this process's stdin and stdout.
///
/// # Errors
///
/// See [`serve_link`].
pub async fn serve_stdio<H, S, C>(
    device: SharedDevice<H, S, C>,
    options: &LinkOptions,
) -> Result<LinkStats, LinkError>
where
    H: HidSink + Send + 'static,
    S: SwitchSink + Send + 'static,
    C: Clock + Send + 'static,
{
    info!("serving controller on stdin/stdout");
    serve_link(tokio::io::stdin(), tokio::io::stdout(), device, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbkvm_core::sink::mock::{RecordingHidSink, RecordingSwitchSink};
    use usbkvm_core::{DeviceOptions, ManualClock};

    fn shared_device() -> SharedDevice<RecordingHidSink, RecordingSwitchSink, ManualClock> {
        let clock = ManualClock::new();
        share(Device::with_clock(
            RecordingHidSink::with_clock(clock.clone()),
            RecordingSwitchSink::new(),
            clock,
            DeviceOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_empty_link_writes_nothing() {
        // Arrange
        let device = shared_device();
        let reader: &[u8] = &[];
        let mut written = Vec::new();

        // Act
        let stats = serve_link(reader, &mut written, device, &LinkOptions::default())
            .await
            .expect("link ok");

        // Assert
        assert_eq!(stats, LinkStats::default());
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn test_one_status_byte_per_frame_in_order() {
        // Arrange
        let device = shared_device();
        let reader: &[u8] = &[0x01, 0x01, b'a', 0x06, 0x00, 0x00, 0x04, 0x00, 0x80];
        let mut written = Vec::new();

        // Act
        let stats = serve_link(reader, &mut written, device, &LinkOptions::default())
            .await
            .expect("link ok");

        // Assert
        assert_eq!(written, vec![0x00, 0x02, 0x03]);
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.frames_dispatched, 3);
        assert_eq!(stats.responses_written, 3);
    }

    #[tokio::test]
    async fn test_banner_precedes_status_bytes() {
        // Arrange
        let device = shared_device();
        let reader: &[u8] = &[0xFE, 0x00, 0x00];
        let mut written = Vec::new();
        let options = LinkOptions {
            banner: Some("hi".to_string()),
            ..LinkOptions::default()
        };

        // Act
        serve_link(reader, &mut written, device, &options)
            .await
            .expect("link ok");

        // Assert
        assert_eq!(written, vec![0xED, b'h', b'i', 0xEF, 0x00]);
    }

    #[tokio::test]
    async fn test_partial_trailing_frame_is_discarded() {
        // Arrange
        let device = shared_device();
        let reader: &[u8] = &[0x03, 0x01, 0x01, 0x03, 0x01];
        let mut written = Vec::new();

        // Act
        let stats = serve_link(reader, &mut written, Arc::clone(&device), &LinkOptions::default())
            .await
            .expect("link ok");

        // Assert
        assert_eq!(written, vec![0x00]);
        assert_eq!(stats.discarded_bytes, 2);
        assert_eq!(device.lock().expect("lock").instruction_count(), 1);
    }

    #[tokio::test]
    async fn test_device_state_survives_between_links() {
        // Arrange
        let device = shared_device();
        let first: &[u8] = &[0x01, 0x02, b'x'];
        let second: &[u8] = &[0x02, 0x02, 0x01];

        // Act
        serve_link(first, tokio::io::sink(), Arc::clone(&device), &LinkOptions::default())
            .await
            .expect("first link");
        serve_link(second, tokio::io::sink(), Arc::clone(&device), &LinkOptions::default())
            .await
            .expect("second link");

        // Assert
        let device = device.lock().expect("lock");
        assert_eq!(device.instruction_count(), 2);
        assert_eq!(device.keyboard_state().held_keys().count(), 1);
        assert_eq!(device.mouse_state().buttons(), 0x01);
    }

    #[tokio::test]
    async fn test_poisoned_device_is_reported() {
        // Arrange
        let device = shared_device();
        let poisoner = Arc::clone(&device);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().expect("lock");
            panic!("poison the device");
        })
        .join();
        let reader: &[u8] = &[0x01, 0x01, b'a'];

        // Act
        let result = serve_link(reader, tokio::io::sink(), device, &LinkOptions::default()).await;

        // Assert
        assert!(matches!(result, Err(LinkError::DevicePoisoned)));
    }
}
