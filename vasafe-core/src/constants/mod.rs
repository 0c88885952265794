//! Constants for the VaSafe engine
//!
//! All tunable numbers live here with a note on where they come from.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Time**: Timer floors, grace periods and polling cadences
//! - **Sensors**: Alarm thresholds and battery calibration
//! - **Buffers**: Offline buffer sizing and queue depths
//! - **Protocol**: Topic layout and payload literals
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name
//! 3. Values that operators may tune are mirrored in `DeviceConfig` /
//!    `Thresholds`; the constants here are their defaults

/// Time-related constants for intervals, debounce windows and retry budgets.
pub mod time;

/// Sensor alarm thresholds and battery calibration.
pub mod sensors;

/// Buffer sizes and queue depths.
pub mod buffers;

/// Topic layout and payload literals shared with the collector.
pub mod protocol;

// Re-export commonly used constants for convenience
pub use time::{
    MIN_MEASUREMENT_INTERVAL_S, EMERGENCY_DEBOUNCE_MS, IDLE_POWER_DOWN_GRACE_MS,
    SENSOR_POLL_INTERVAL_MS, DRAIN_PUBLISH_DELAY_MS, CONNECT_ATTEMPT_BUDGET,
};

pub use sensors::{LIGHT_ALARM_THRESHOLD, TEMP_DELTA_LIMIT_C};

pub use buffers::{DEFAULT_BUFFER_CAPACITY, COMMAND_QUEUE_DEPTH, STATUS_TEXT_CAPACITY};
