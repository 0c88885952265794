//! Time-Related Constants
//!
//! Timer floors, debounce windows and polling cadences of the control loop.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

// ===== MEASUREMENT CADENCE =====

/// Absolute floor on the derived measurement interval (seconds).
///
/// Short trips would otherwise sample (and wake the radio path) every few
/// seconds. 10 s bounds sensor self-heating and flash/radio wear.
///
/// Source: field deployments on DHT11-class sensors
pub const MIN_MEASUREMENT_INTERVAL_S: u64 = 10;

/// Trip duration assumed when the stored value is unusable (hours).
pub const DEFAULT_TRIP_DURATION_HOURS: f32 = 1.0;

/// Sync period assumed when the stored value is unusable (minutes).
pub const DEFAULT_SYNC_PERIOD_MINUTES: u64 = 5;

/// Minimum gap between sensor reads (milliseconds).
///
/// The measurement tick, the display refresh and connectivity evaluation all
/// run at this cadence. Transport servicing runs on every poll.
pub const SENSOR_POLL_INTERVAL_MS: u64 = 1000;

// ===== ALERTING =====

/// Minimum gap between two actionable emergencies (milliseconds).
///
/// A light sensor hovering around the alarm threshold flips on every read;
/// without this window every flip would wake the radio.
pub const EMERGENCY_DEBOUNCE_MS: u64 = 5000;

// ===== RADIO DUTY CYCLE =====

/// Inactivity required before the radio is powered down (milliseconds).
///
/// Keeps back-to-back triggers from cycling the radio on and off.
pub const IDLE_POWER_DOWN_GRACE_MS: u64 = 5000;

/// Polls a single connect attempt may spend before reverting to radio-off.
///
/// One poll per sensor tick, so roughly 15 s of association and handshake.
pub const CONNECT_ATTEMPT_BUDGET: u8 = 15;

/// Pause between consecutive publishes while draining (milliseconds).
pub const DRAIN_PUBLISH_DELAY_MS: u32 = 50;

// ===== RESET BUTTON =====

/// Hold time that turns a button press into a factory reset (milliseconds).
pub const RESET_HOLD_MS: u64 = 3000;

// ===== INDICATORS =====

/// Half-period of the sensor-fault LED blink (milliseconds).
pub const FAULT_BLINK_HALF_PERIOD_MS: u64 = 200;

/// Half-period of the forced-sync LED blink (milliseconds).
pub const SYNC_BLINK_HALF_PERIOD_MS: u64 = 100;
