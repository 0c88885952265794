//! LED and buzzer state derived from the status snapshot

use crate::constants::time::{FAULT_BLINK_HALF_PERIOD_MS, SYNC_BLINK_HALF_PERIOD_MS};
use crate::status::StatusSnapshot;
use crate::time::Timestamp;

/// Status LED color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedColor {
    /// Dark
    #[default]
    Off,
    /// Radio on
    Green,
    /// Sensor fault
    Red,
}

/// What the indicator hardware should show right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorState {
    /// LED color for this instant, blink phase applied
    pub led: LedColor,
    /// Buzzer sounding
    pub buzzer: bool,
}

impl IndicatorState {
    /// Derive the indicators for `snapshot` at `now`
    pub fn derive(snapshot: &StatusSnapshot, now: Timestamp) -> Self {
        let led = if snapshot.sensor_fault {
            blink(LedColor::Red, now, FAULT_BLINK_HALF_PERIOD_MS)
        } else if snapshot.connectivity_state.radio_powered() {
            if snapshot.forced_sync_pending {
                blink(LedColor::Green, now, SYNC_BLINK_HALF_PERIOD_MS)
            } else {
                LedColor::Green
            }
        } else {
            LedColor::Off
        };
        Self { led, buzzer: snapshot.box_open }
    }
}

fn blink(color: LedColor, now: Timestamp, half_period_ms: u64) -> LedColor {
    if (now / half_period_ms) % 2 == 0 {
        color
    } else {
        LedColor::Off
    }
}
