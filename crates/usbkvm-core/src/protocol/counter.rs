//! Instruction counter shared between the device and its controller.
//!
//! # What the counter is for
//!
//! The serial link has no sequence numbers and no acknowledgements beyond the
//! one response byte per frame.  The controller keeps its own count of frames
//! it has sent; the device counts every frame it has decoded.  If the two
//! numbers disagree, bytes were lost or duplicated somewhere and the
//! controller should resynchronise with a DATA_RESET.
//!
//! - Every decoded frame counts, including frames that are rejected.
//! - RESET_INSTR_COUNT sets the counter to zero and is itself not counted.
//!
//! The counter is owned by exactly one device context and mutated on the
//! dispatch path only, so it needs no atomics.

/// Number of frames dispatched since the last RESET_INSTR_COUNT.
///
/// Wraps around at `u32::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use usbkvm_core::protocol::InstructionCounter;
///
/// let mut counter = InstructionCounter::new();
/// counter.increment();
/// counter.increment();
/// assert_eq!(counter.get(), 2);
/// counter.reset();
/// assert_eq!(counter.get(), 0);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstructionCounter {
    count: u32,
}

impl InstructionCounter {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Counts one more frame and returns the new value.
    pub fn increment(&mut self) -> u32 {
        self.count = self.count.wrapping_add(1);
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn get(&self) -> u32 {
        self.count
    }
}
