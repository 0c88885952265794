//! VaSafe shipment monitor, host build
//!
//! Runs the telemetry engine against an MQTT broker with simulated sensors.
//! Configuration lives in `<CONFIG_DIR>/vasafe_cfg.json`; `VASAFE_*`
//! environment variables override it. Creating `<CONFIG_DIR>/vasafe_reset`
//! and keeping it for three seconds acts as the reset button.

mod display;
mod kv_store;
mod sensors;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use env_logger::Env;
use log::{info, warn};
use vasafe_connectors::{MqttConfig, MqttTransport};
use vasafe_core::button::HoldDetector;
use vasafe_core::{DeviceConfig, MonotonicClock, TelemetryEngine, TimeSource};

use display::ConsoleDisplay;
use kv_store::ConfigStore;
use sensors::SimulatedSensors;

const LOOP_PAUSE: Duration = Duration::from_millis(10);
const RESET_MARKER: &str = "vasafe_reset";

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("VaSafe monitor v{} starting", vasafe_core::VERSION);

    let store = ConfigStore::from_env();
    let inputs = store.load_or_init()?;
    let (config, issues) = DeviceConfig::derive_checked(&inputs, Default::default());
    for issue in &issues {
        warn!("Configuration: {}", issue);
    }
    info!(
        "Box {} -> {}:{}, measuring every {}s, syncing every {}s",
        config.device_id(),
        config.broker().host,
        config.broker().port,
        config.measurement_interval().to_secs(),
        config.sync_interval().to_secs()
    );

    let mut transport =
        MqttTransport::new(MqttConfig::new(config.broker().host.clone(), config.broker().port));
    let mut sensors = SimulatedSensors::new();
    let clock = MonotonicClock::new();
    let mut engine = TelemetryEngine::new(config, clock.now());
    let mut display = ConsoleDisplay::new();
    let mut reset_button = HoldDetector::default();
    let reset_marker = reset_marker(store.path().parent());

    loop {
        let report = engine.poll(&mut transport, &mut sensors, &clock);
        if let Some(drain) = &report.drain {
            if let Some(e) = drain.interrupted {
                warn!("Drain stopped after {} samples: {}", drain.sent, e);
            }
        }

        let now = clock.now();
        display.show(&engine.snapshot(), engine.indicators(now));

        if reset_button.update(reset_marker.exists(), now) {
            warn!("Reset requested, clearing stored configuration");
            store.reset()?;
            let _ = std::fs::remove_file(&reset_marker);
            return Ok(());
        }

        thread::sleep(LOOP_PAUSE);
    }
}

fn reset_marker(dir: Option<&std::path::Path>) -> PathBuf {
    dir.map(|d| d.join(RESET_MARKER)).unwrap_or_else(|| PathBuf::from(RESET_MARKER))
}
