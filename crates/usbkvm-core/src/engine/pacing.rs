//! Minimum spacing between keyboard reports.
//!
//! Hosts scan a boot keyboard on a fixed interval.  Two reports delivered
//! inside the same scan window can be merged, which turns a press+release
//! into nothing at all.  The [`Pacer`] blocks the caller until
//! [`MIN_KEY_EVENTS_DELAY`](crate::protocol::MIN_KEY_EVENTS_DELAY) has
//! passed since the previous keyboard report.  Reports are delayed, never
//! dropped or reordered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time plus a way to wait.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by [`Instant`] and `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests and benchmarks.
///
/// `sleep` advances the clock instantly instead of blocking.  Clones share
/// the same time source, so a test can hand one clone to the device and
/// keep another to read or advance time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Enforces a floor on the interval between consecutive emissions.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last_emit: Option<Duration>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next emission is allowed, then records it.
    ///
    /// The first call never waits.
    pub fn wait_turn<C: Clock>(&mut self, clock: &C) {
        if let Some(last) = self.last_emit {
            let ready_at = last + self.min_interval;
            let now = clock.now();
            if now < ready_at {
                clock.sleep(ready_at - now);
            }
        }
        self.last_emit = Some(clock.now());
    }
}
