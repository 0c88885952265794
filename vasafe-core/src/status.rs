//! Read-only status snapshot for displays

use crate::command::StatusText;
use crate::constants::sensors::{BATTERY_EMPTY_V, BATTERY_FULL_V};
use crate::controller::ConnectivityState;

/// Everything a display adapter may render
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Controller state
    pub connectivity_state: ConnectivityState,
    /// Samples waiting in the offline buffer
    pub buffer_size: usize,
    /// Temperature of the last sensor tick (°C, `0.0` on fault)
    pub last_temperature: f32,
    /// Temperature sensor fault on the last tick
    pub sensor_fault: bool,
    /// Box open on the last tick
    pub box_open: bool,
    /// Raw light level of the last tick
    pub light_level: u16,
    /// Battery charge, when measurable
    pub battery_percent: Option<u8>,
    /// Remote sync still pending
    pub forced_sync_pending: bool,
    /// Maintenance override active
    pub maintenance_mode: bool,
    /// Text sent by the collector
    pub remote_status_text: StatusText,
}

impl StatusSnapshot {
    /// One-line status for the display
    pub fn headline(&self) -> &'static str {
        let online = self.connectivity_state.radio_powered();
        if self.sensor_fault {
            "ERRO SENSOR"
        } else if online && self.forced_sync_pending {
            "SYNC..."
        } else if online && self.buffer_size > 0 {
            "ENVIANDO"
        } else if online && self.maintenance_mode {
            "MANUTENCAO"
        } else if online {
            "ONLINE"
        } else {
            "OFFLINE"
        }
    }
}

/// Linear battery estimate, 3.0 V empty to 4.2 V full
pub fn battery_percent(voltage: Option<f32>) -> Option<u8> {
    let voltage = voltage.filter(|v| v.is_finite())?;
    let fraction = (voltage - BATTERY_EMPTY_V) / (BATTERY_FULL_V - BATTERY_EMPTY_V);
    Some(libm::roundf(fraction.clamp(0.0, 1.0) * 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: ConnectivityState) -> StatusSnapshot {
        StatusSnapshot {
            connectivity_state: state,
            buffer_size: 0,
            last_temperature: 4.0,
            sensor_fault: false,
            box_open: false,
            light_level: 900,
            battery_percent: Some(80),
            forced_sync_pending: false,
            maintenance_mode: false,
            remote_status_text: StatusText::new(),
        }
    }

    #[test]
    fn headline_priority() {
        let online = snapshot(ConnectivityState::OnlineIdle);
        assert_eq!(online.headline(), "ONLINE");
        assert_eq!(snapshot(ConnectivityState::RadioOff).headline(), "OFFLINE");
        assert_eq!(StatusSnapshot { maintenance_mode: true, ..online.clone() }.headline(), "MANUTENCAO");
        assert_eq!(
            StatusSnapshot { buffer_size: 3, maintenance_mode: true, ..online.clone() }.headline(),
            "ENVIANDO"
        );
        assert_eq!(
            StatusSnapshot { forced_sync_pending: true, buffer_size: 3, ..online.clone() }.headline(),
            "SYNC..."
        );
        assert_eq!(
            StatusSnapshot { sensor_fault: true, forced_sync_pending: true, ..online }.headline(),
            "ERRO SENSOR"
        );
    }

    #[test]
    fn offline_ignores_pending_work() {
        let off = StatusSnapshot {
            buffer_size: 10,
            forced_sync_pending: true,
            ..snapshot(ConnectivityState::RadioOff)
        };
        assert_eq!(off.headline(), "OFFLINE");
    }

    #[test]
    fn battery_scale() {
        assert_eq!(battery_percent(Some(3.0)), Some(0));
        assert_eq!(battery_percent(Some(4.2)), Some(100));
        assert_eq!(battery_percent(Some(3.6)), Some(50));
        assert_eq!(battery_percent(Some(2.5)), Some(0));
        assert_eq!(battery_percent(Some(5.0)), Some(100));
        assert_eq!(battery_percent(None), None);
        assert_eq!(battery_percent(Some(f32::NAN)), None);
    }
}
