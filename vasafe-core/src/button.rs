//! Long-press detection for the reset button

use fugit::MillisDurationU64;

use crate::constants::time::RESET_HOLD_MS;
use crate::time::{has_elapsed, Timestamp};

/// Reports once when the button has been held past the hold time
#[derive(Debug, Clone, Copy)]
pub struct HoldDetector {
    hold: MillisDurationU64,
    pressed_since: Option<Timestamp>,
    fired: bool,
}

impl Default for HoldDetector {
    fn default() -> Self {
        Self::new(MillisDurationU64::millis(RESET_HOLD_MS))
    }
}

impl HoldDetector {
    /// Detector firing after `hold` of continuous press
    pub fn new(hold: MillisDurationU64) -> Self {
        Self { hold, pressed_since: None, fired: false }
    }

    /// Feed the current button level; `true` exactly once per long press
    pub fn update(&mut self, pressed: bool, now: Timestamp) -> bool {
        if !pressed {
            self.pressed_since = None;
            self.fired = false;
            return false;
        }
        let since = *self.pressed_since.get_or_insert(now);
        if !self.fired && has_elapsed(now, since, self.hold) {
            self.fired = true;
            return true;
        }
        false
    }
}
