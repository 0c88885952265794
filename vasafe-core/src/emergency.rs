//! Emergency detection with debounce
//!
//! A sample is an emergency when the box is open, or when the temperature
//! moved more than the delta limit since the last *scheduled, successfully
//! measured* sample. Emergencies wake the radio out of band, so they are
//! debounced: at most one actionable emergency per 5 s window, however fast
//! the loop polls.
//!
//! ```text
//! t=0.0s  open  -> actionable   (alert stamped at 0.0s)
//! t=1.0s  open  -> active, suppressed
//! t=5.0s  open  -> active, suppressed (5.0s is not > 5s)
//! t=6.0s  open  -> actionable   (alert stamped at 6.0s)
//! ```

use fugit::MillisDurationU64;

use crate::config::Thresholds;
use crate::constants::time::EMERGENCY_DEBOUNCE_MS;
use crate::sample::Classification;
use crate::time::{has_elapsed, Timestamp};

/// Verdict for one classified reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmergencyVerdict {
    /// Emergency condition holds right now
    pub active: bool,
    /// Condition holds and the debounce window allows acting on it
    pub actionable: bool,
}

/// Debounced emergency detector
///
/// Owns `last_emergency_alert` and the reference temperature for the delta
/// check. Nothing else writes either.
#[derive(Debug, Clone)]
pub struct EmergencyDetector {
    thresholds: Thresholds,
    debounce: MillisDurationU64,
    last_alert: Option<Timestamp>,
    reference_temperature: Option<f32>,
}

impl EmergencyDetector {
    /// Detector with the standard 5 s debounce window
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            debounce: MillisDurationU64::millis(EMERGENCY_DEBOUNCE_MS),
            last_alert: None,
            reference_temperature: None,
        }
    }

    /// Is the condition present, ignoring debounce? Pure.
    pub fn is_emergency(&self, reading: &Classification) -> bool {
        reading.box_open || self.temperature_excursion(reading)
    }

    fn temperature_excursion(&self, reading: &Classification) -> bool {
        match (reading.measured_temperature(), self.reference_temperature) {
            (Some(current), Some(previous)) => {
                libm::fabsf(current - previous) > self.thresholds.temp_delta_limit
            }
            _ => false,
        }
    }

    /// Evaluate a reading at `now`
    ///
    /// When the verdict is actionable the alert time is stamped here, before
    /// the caller tries to transmit anything, so a failed publish cannot make
    /// the same event actionable again on the next tick.
    pub fn evaluate(&mut self, reading: &Classification, now: Timestamp) -> EmergencyVerdict {
        let active = self.is_emergency(reading);
        let window_open = match self.last_alert {
            Some(last) => has_elapsed(now, last, self.debounce),
            None => true,
        };
        let actionable = active && window_open;
        if actionable {
            self.last_alert = Some(now);
            log_info!(
                "Emergency at {}ms (open={}, temp={})",
                now,
                reading.box_open,
                reading.temperature
            );
        }
        EmergencyVerdict { active, actionable }
    }

    /// Record the temperature of a scheduled sample as the new reference
    ///
    /// Faulted readings leave the previous reference in place.
    pub fn record_scheduled(&mut self, reading: &Classification) {
        if let Some(temperature) = reading.measured_temperature() {
            self.reference_temperature = Some(temperature);
        }
    }

    /// Time of the last actionable emergency
    pub fn last_alert(&self) -> Option<Timestamp> {
        self.last_alert
    }

    /// Temperature the delta check compares against
    pub fn reference_temperature(&self) -> Option<f32> {
        self.reference_temperature
    }
}
