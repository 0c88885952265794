//! Time management for the polling loop
//!
//! Provides the two time capabilities the engine needs:
//! - A monotonic clock (milliseconds since boot) for every timer comparison
//! - A blocking delay for the connect poll and the gap between drain publishes
//!
//! Wall-clock time is never needed: samples carry monotonic capture times and
//! the collector stamps arrival itself.

use core::cell::Cell;

use fugit::MillisDurationU64;

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Source of monotonic time for the engine
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Blocking delay provider
///
/// Takes `&self` so a single clock value can serve as both time source and
/// delay while the engine borrows it for a whole tick.
pub trait Delay {
    /// Block the polling loop for `ms` milliseconds
    fn delay_ms(&self, ms: u32);
}

/// Milliseconds elapsed between `since` and `now`
///
/// Saturates at zero so a timer stamped "in the future" (clock glitch, test
/// setup) reads as not elapsed instead of wrapping.
#[inline]
pub fn elapsed_ms(now: Timestamp, since: Timestamp) -> u64 {
    now.saturating_sub(since)
}

/// True when strictly more than `interval` has passed since `since`
#[inline]
pub fn has_elapsed(now: Timestamp, since: Timestamp, interval: MillisDurationU64) -> bool {
    elapsed_ms(now, since) > interval.to_millis()
}

/// Hand-driven clock for tests and simulations
///
/// Time only moves when told to. `delay_ms` advances the clock instead of
/// sleeping, so code under test that blocks still observes time passing.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds
    pub fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.now.set(timestamp);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl Delay for ManualClock {
    fn delay_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

/// Monotonic clock backed by `std::time::Instant` (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self { boot: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.boot.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl Delay for MonotonicClock {
    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
