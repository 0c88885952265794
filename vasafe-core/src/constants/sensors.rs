//! Sensor Thresholds and Calibration
//!
//! Values for the LDR tamper detector, the temperature excursion check and
//! the battery divider on the reference board.

// ===== TAMPER DETECTION =====

/// Light level below which the box counts as open (raw 12-bit ADC counts).
///
/// The LDR sits in a voltage divider that reads high in the dark, so an
/// opened lid drives the reading *down*. 600 separates a closed box from
/// diffuse warehouse light with margin on the reference enclosure.
pub const LIGHT_ALARM_THRESHOLD: u16 = 600;

// ===== TEMPERATURE EXCURSION =====

/// Largest temperature swing between scheduled samples before it counts as
/// an emergency (°C).
///
/// DHT11 resolution is 1 °C with ±2 °C accuracy; a 2 °C jump between two
/// scheduled samples is beyond sensor noise for a closed insulated box.
pub const TEMP_DELTA_LIMIT_C: f32 = 2.0;

/// Temperature carried in the payload when the sensor returned no reading.
pub const FAULT_TEMPERATURE_C: f32 = 0.0;

// ===== BATTERY =====

/// Cell voltage reported as 0 % (volts).
pub const BATTERY_EMPTY_V: f32 = 3.0;

/// Cell voltage reported as 100 % (volts).
pub const BATTERY_FULL_V: f32 = 4.2;
