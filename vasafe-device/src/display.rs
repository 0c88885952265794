//! Console stand-in for the OLED panel and the indicator hardware
//!
//! Renders the same four lines the panel shows, but only logs them when
//! something other than the blink phase changed.

use log::info;
use vasafe_core::indicator::{IndicatorState, LedColor};
use vasafe_core::status::StatusSnapshot;

/// Display lines for one snapshot
pub fn render(snapshot: &StatusSnapshot) -> [String; 4] {
    let temperature = if snapshot.sensor_fault {
        "T: --.- C".to_string()
    } else {
        format!("T: {:.1} C", snapshot.last_temperature)
    };
    let battery = match snapshot.battery_percent {
        Some(percent) => format!("BAT {}%", percent),
        None => "BAT --".to_string(),
    };
    [
        snapshot.headline().to_string(),
        format!("{}  {}", temperature, battery),
        format!("BUF {}  {}", snapshot.buffer_size, snapshot.connectivity_state),
        snapshot.remote_status_text.as_str().to_string(),
    ]
}

/// Deduplicating log-backed display
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last_lines: Option<[String; 4]>,
    led_lit: bool,
    buzzer: bool,
}

impl ConsoleDisplay {
    /// Empty display
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `snapshot`; returns whether anything was logged
    pub fn show(&mut self, snapshot: &StatusSnapshot, indicators: IndicatorState) -> bool {
        let mut logged = false;

        let lines = render(snapshot);
        if self.last_lines.as_ref() != Some(&lines) {
            info!("[{}] {} | {} | {}", lines[0], lines[1], lines[2], lines[3]);
            self.last_lines = Some(lines);
            logged = true;
        }

        // Blink phases would flood the log, only steady color changes count
        let led_lit = indicators.led != LedColor::Off;
        if led_lit != self.led_lit && !blinking(snapshot) {
            info!("LED {:?}", indicators.led);
            self.led_lit = led_lit;
            logged = true;
        }

        if indicators.buzzer != self.buzzer {
            info!("Buzzer {}", if indicators.buzzer { "on" } else { "off" });
            self.buzzer = indicators.buzzer;
            logged = true;
        }

        logged
    }
}

fn blinking(snapshot: &StatusSnapshot) -> bool {
    snapshot.sensor_fault
        || (snapshot.forced_sync_pending && snapshot.connectivity_state.radio_powered())
}
