//! Samples: classification and wire payload
//!
//! A raw sensor read becomes a [`Classification`] (open/closed, fault flag,
//! temperature to report). The engine adds emergency and mode flags to make a
//! [`Sample`], which serializes to the collector's JSON schema:
//!
//! ```text
//! {"box_id":"box_01","temperatura":4.5,"aberta":false,
//!  "alerta":"EVENTO_CRITICO",   <- only while an emergency is active
//!  "tipo":"SYNC_MANUAL",        <- only under a forced sync
//!  "modo":"MANUTENCAO"}         <- only in maintenance mode
//! ```

use alloc::string::String;

use serde::Serialize;

use crate::config::Thresholds;
use crate::constants::protocol::{ALERT_CRITICAL_EVENT, KIND_MANUAL_SYNC, MODE_MAINTENANCE};
use crate::constants::sensors::FAULT_TEMPERATURE_C;
use crate::errors::PayloadError;
use crate::time::Timestamp;

/// One read of the two sensors that feed classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// Temperature in °C, `None` when the sensor gave no reading
    pub temperature: Option<f32>,
    /// Light sensor, raw ADC counts
    pub light: u16,
}

/// Classifier output, the skeleton of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Temperature to report; `0.0` on fault
    pub temperature: f32,
    /// Light below the alarm threshold
    pub box_open: bool,
    /// Temperature sensor gave no usable reading
    pub sensor_fault: bool,
}

impl Classification {
    /// Temperature only when it was actually measured
    pub fn measured_temperature(&self) -> Option<f32> {
        if self.sensor_fault {
            None
        } else {
            Some(self.temperature)
        }
    }
}

/// Classify a raw reading. Pure.
pub fn classify(reading: &RawReading, thresholds: &Thresholds) -> Classification {
    let measured = reading.temperature.filter(|t| t.is_finite());
    Classification {
        temperature: measured.unwrap_or(FAULT_TEMPERATURE_C),
        box_open: reading.light < thresholds.light_alarm,
        sensor_fault: measured.is_none(),
    }
}

/// A classified observation with the flags in force when it was captured
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    /// Device identity
    pub device_id: &'a str,
    /// Reported temperature (°C)
    pub temperature: f32,
    /// Box lid open
    pub box_open: bool,
    /// Temperature sensor fault
    pub sensor_fault: bool,
    /// Emergency condition active at capture time
    pub is_emergency: bool,
    /// Captured while a forced sync was pending
    pub is_forced_sync: bool,
    /// Captured in maintenance mode
    pub is_maintenance: bool,
    /// Monotonic capture time
    pub captured_at: Timestamp,
}

#[derive(Serialize)]
struct TelemetryPayload<'a> {
    box_id: &'a str,
    temperatura: f32,
    aberta: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerta: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modo: Option<&'static str>,
}

impl<'a> Sample<'a> {
    /// Serialize to the collector's JSON schema
    pub fn to_payload(&self) -> Result<String, PayloadError> {
        let payload = TelemetryPayload {
            box_id: self.device_id,
            temperatura: if self.sensor_fault { FAULT_TEMPERATURE_C } else { self.temperature },
            aberta: self.box_open,
            alerta: self.is_emergency.then_some(ALERT_CRITICAL_EVENT),
            tipo: self.is_forced_sync.then_some(KIND_MANUAL_SYNC),
            modo: self.is_maintenance.then_some(MODE_MAINTENANCE),
        };
        serde_json::to_string(&payload).map_err(|_| PayloadError::Serialize)
    }
}
