//! Buffer Sizes and Queue Depths
//!
//! Sized for an ESP32-class device with the offline buffer held in RAM.

/// Default number of serialized samples the offline buffer holds.
///
/// - 400 samples × ~80 bytes JSON = ~32KB of heap
/// - The measurement interval is derived so one trip fills it exactly
///
/// Source: reference board RAM budget
pub const DEFAULT_BUFFER_CAPACITY: usize = 400;

/// Buffer occupancy that forces a sync, as a fraction of capacity in tenths.
///
/// Pressure is `len > 0.9 * capacity`, evaluated as
/// `len * 10 > capacity * BUFFER_PRESSURE_TENTHS` to stay in integers.
pub const BUFFER_PRESSURE_TENTHS: usize = 9;

/// Inbound commands held between two polls.
///
/// The broker delivers a handful of messages per poll at most.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// Bytes kept of the operator status text.
pub const STATUS_TEXT_CAPACITY: usize = 32;

/// Longest accepted device id (bytes).
pub const MAX_DEVICE_ID_LEN: usize = 14;
