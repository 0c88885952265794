//! The store-and-forward engine
//!
//! ## Overview
//!
//! [`TelemetryEngine`] is the single context every tick is threaded through.
//! It exclusively owns the offline buffer, the connectivity controller, the
//! emergency detector, the command queue, the mode flags and the measurement
//! timers; collaborators (transport, sensors, clock) are borrowed per call.
//!
//! ## Poll Order
//!
//! ```text
//! poll()
//!  ├─ inbound messages  -> command queue
//!  ├─ command queue     -> mode flags          (drained once)
//!  ├─ drain buffer                              (when online)
//!  └─ sensor tick, only when > 1000 ms since the last one
//!       ├─ read + classify
//!       ├─ emergency verdict (debounced)
//!       ├─ controller step   (shutdown > maintenance > triggers)
//!       ├─ record sample?    (interval | emergency | forced | maintenance)
//!       └─ publish or buffer
//! ```
//!
//! Nothing in a poll is fatal; every failure is absorbed and retried on a
//! later tick.

use fugit::MillisDurationU64;

use crate::buffer::OfflineBuffer;
use crate::command::{CommandQueue, ModeFlags};
use crate::config::DeviceConfig;
use crate::constants::time::SENSOR_POLL_INTERVAL_MS;
use crate::controller::{ConnectivityController, ConnectivityState, Demands, Session};
use crate::emergency::{EmergencyDetector, EmergencyVerdict};
use crate::indicator::IndicatorState;
use crate::publisher::{Delivery, DrainReport, TelemetryPublisher};
use crate::sample::{classify, Classification, RawReading, Sample};
use crate::status::{battery_percent, StatusSnapshot};
use crate::time::{has_elapsed, Delay, TimeSource, Timestamp};
use crate::traits::{SensorSuite, Transport};

/// What one call to [`TelemetryEngine::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    /// Inbound messages collected from the transport
    pub inbound: usize,
    /// Drain pass, if one ran
    pub drain: Option<DrainReport>,
    /// A sensor tick ran
    pub sensor_tick: bool,
    /// Emergency verdict of the sensor tick
    pub emergency: EmergencyVerdict,
    /// Where the recorded sample went, if one was recorded
    pub recorded: Option<Delivery>,
}

/// Engine context
#[derive(Debug)]
pub struct TelemetryEngine {
    config: DeviceConfig,
    buffer: OfflineBuffer,
    controller: ConnectivityController,
    detector: EmergencyDetector,
    publisher: TelemetryPublisher,
    commands: CommandQueue,
    flags: ModeFlags,
    sensor_interval: MillisDurationU64,
    last_sensor_read: Timestamp,
    last_measurement: Timestamp,
    last_reading: Classification,
    last_light: u16,
    last_battery: Option<u8>,
}

impl TelemetryEngine {
    /// Engine booted at `boot`, radio off and buffer empty
    pub fn new(config: DeviceConfig, boot: Timestamp) -> Self {
        log_info!(
            "Engine up: buffer {} slots, telemetry on {}",
            config.buffer_capacity(),
            config.topics().telemetry
        );
        Self {
            buffer: OfflineBuffer::new(config.buffer_capacity()),
            controller: ConnectivityController::new(config.sync_interval(), boot),
            detector: EmergencyDetector::new(config.thresholds()),
            publisher: TelemetryPublisher::new(config.topics().telemetry.clone()),
            commands: CommandQueue::new(),
            flags: ModeFlags::default(),
            sensor_interval: MillisDurationU64::millis(SENSOR_POLL_INTERVAL_MS),
            last_sensor_read: boot,
            last_measurement: boot,
            last_reading: Classification { temperature: 0.0, box_open: false, sensor_fault: false },
            last_light: 0,
            last_battery: None,
            config,
        }
    }

    /// Override the connect poll budget
    pub fn with_connect_budget(mut self, budget: u8) -> Self {
        self.controller = self.controller.with_connect_budget(budget);
        self
    }

    /// Override the gap between drain publishes
    pub fn with_drain_gap(mut self, ms: u32) -> Self {
        self.publisher = self.publisher.with_drain_gap(ms);
        self
    }

    /// Run one pass of the polling loop
    pub fn poll<T, S, C>(&mut self, transport: &mut T, sensors: &mut S, clock: &C) -> PollReport
    where
        T: Transport + ?Sized,
        S: SensorSuite + ?Sized,
        C: TimeSource + Delay + ?Sized,
    {
        let mut report = PollReport::default();

        while let Some(message) = transport.poll_inbound() {
            report.inbound += 1;
            if message.topic == self.config.topics().command {
                self.commands.ingest(&message.payload);
            } else {
                log_debug!("Ignoring message on {}", message.topic);
            }
        }
        self.flags.apply_all(&mut self.commands);

        if self.controller.state().is_online() && transport.is_connected() && !self.buffer.is_empty() {
            let drain = self.publisher.drain(&mut self.buffer, transport, clock);
            self.controller.record_sync(clock.now());
            if drain.completed() {
                self.complete_forced_sync();
            }
            report.drain = Some(drain);
        }

        let now = clock.now();
        if has_elapsed(now, self.last_sensor_read, self.sensor_interval) {
            self.last_sensor_read = now;
            self.sensor_tick(transport, sensors, now, &mut report);
        }
        report
    }

    fn sensor_tick<T, S>(&mut self, transport: &mut T, sensors: &mut S, now: Timestamp, report: &mut PollReport)
    where
        T: Transport + ?Sized,
        S: SensorSuite + ?Sized,
    {
        report.sensor_tick = true;

        let raw = RawReading { temperature: sensors.read_temperature(), light: sensors.read_light() };
        self.last_battery = battery_percent(sensors.read_battery_voltage());
        let reading = classify(&raw, &self.config.thresholds());
        self.last_reading = reading;
        self.last_light = raw.light;

        let verdict = self.detector.evaluate(&reading, now);
        report.emergency = verdict;

        let demands = Demands {
            shutdown: self.flags.shutdown_requested,
            maintenance: self.flags.maintenance_mode,
            buffer_pressure: self.buffer.under_pressure(),
            emergency: verdict.actionable,
            forced_sync: self.flags.forced_sync_requested,
            buffer_empty: self.buffer.is_empty(),
        };
        let topics = self.config.topics();
        let session = Session { client_id: self.config.device_id(), command_topic: &topics.command };
        let state = self.controller.step(transport, session, demands, now);
        // One-cycle signal, consumed by this step
        self.flags.shutdown_requested = false;

        let measurement_due = has_elapsed(now, self.last_measurement, self.config.measurement_interval());
        if measurement_due {
            self.last_measurement = now;
            self.detector.record_scheduled(&reading);
        }

        let should_record = measurement_due
            || verdict.actionable
            || self.flags.forced_sync_requested
            || self.flags.maintenance_mode;
        if should_record {
            let sample = Sample {
                device_id: self.config.device_id(),
                temperature: reading.temperature,
                box_open: reading.box_open,
                sensor_fault: reading.sensor_fault,
                is_emergency: verdict.active,
                is_forced_sync: self.flags.forced_sync_requested,
                is_maintenance: self.flags.maintenance_mode,
                captured_at: now,
            };
            match self.publisher.record(&sample, transport, &mut self.buffer) {
                Ok(delivery) => {
                    if delivery == Delivery::Published {
                        self.controller.record_activity(now);
                    }
                    report.recorded = Some(delivery);
                }
                Err(_e) => log_warn!("Dropping sample: {}", _e),
            }
        }

        if state.is_online() && transport.is_connected() && self.buffer.is_empty() {
            self.complete_forced_sync();
        }
    }

    fn complete_forced_sync(&mut self) {
        if self.flags.forced_sync_requested {
            log_info!("Remote sync completed");
            self.flags.forced_sync_requested = false;
        }
    }

    /// Queue a command payload as if it arrived on the command topic
    pub fn submit_command(&mut self, payload: &[u8]) -> usize {
        self.commands.ingest(payload)
    }

    /// Display snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connectivity_state: self.controller.state(),
            buffer_size: self.buffer.len(),
            last_temperature: self.last_reading.temperature,
            sensor_fault: self.last_reading.sensor_fault,
            box_open: self.last_reading.box_open,
            light_level: self.last_light,
            battery_percent: self.last_battery,
            forced_sync_pending: self.flags.forced_sync_requested,
            maintenance_mode: self.flags.maintenance_mode,
            remote_status_text: self.flags.remote_status_text.clone(),
        }
    }

    /// Indicator outputs at `now`
    pub fn indicators(&self, now: Timestamp) -> IndicatorState {
        IndicatorState::derive(&self.snapshot(), now)
    }

    /// Connectivity state
    pub fn state(&self) -> ConnectivityState {
        self.controller.state()
    }

    /// Offline buffer
    pub fn buffer(&self) -> &OfflineBuffer {
        &self.buffer
    }

    /// Mode flags
    pub fn flags(&self) -> &ModeFlags {
        &self.flags
    }

    /// Configuration in force
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Time of the last scheduled measurement
    pub fn last_measurement(&self) -> Timestamp {
        self.last_measurement
    }

    /// Time of the last actionable emergency
    pub fn last_emergency_alert(&self) -> Option<Timestamp> {
        self.detector.last_alert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigInputs;
    use crate::errors::TransportError;
    use crate::time::ManualClock;
    use crate::traits::InboundMessage;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Loopback {
        powered: bool,
        connected: bool,
        sent: Vec<String>,
        inbound: Vec<InboundMessage>,
    }

    impl Transport for Loopback {
        fn radio_on(&mut self) {
            self.powered = true;
        }
        fn radio_off(&mut self) {
            self.powered = false;
        }
        fn link_up(&self) -> bool {
            self.powered
        }
        fn connect(&mut self, _client_id: &str) -> Result<(), TransportError> {
            self.connected = true;
            Ok(())
        }
        fn disconnect(&mut self) {
            self.connected = false;
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn publish(&mut self, _topic: &str, payload: &str) -> Result<(), TransportError> {
            self.sent.push(payload.to_string());
            Ok(())
        }
        fn subscribe(&mut self, _topic: &str) -> Result<(), TransportError> {
            Ok(())
        }
        fn poll_inbound(&mut self) -> Option<InboundMessage> {
            self.inbound.pop()
        }
    }

    struct Steady {
        temperature: Option<f32>,
        light: u16,
    }

    impl SensorSuite for Steady {
        fn read_temperature(&mut self) -> Option<f32> {
            self.temperature
        }
        fn read_light(&mut self) -> u16 {
            self.light
        }
        fn read_battery_voltage(&mut self) -> Option<f32> {
            Some(3.9)
        }
    }

    fn engine() -> TelemetryEngine {
        TelemetryEngine::new(DeviceConfig::derive(&ConfigInputs::default()), 0)
    }

    #[test]
    fn sensor_tick_waits_for_the_poll_interval() {
        let mut engine = engine();
        let mut radio = Loopback::default();
        let mut sensors = Steady { temperature: Some(4.0), light: 900 };
        let clock = ManualClock::new(1000);

        assert!(!engine.poll(&mut radio, &mut sensors, &clock).sensor_tick);
        clock.set(1001);
        assert!(engine.poll(&mut radio, &mut sensors, &clock).sensor_tick);
        assert!(!engine.poll(&mut radio, &mut sensors, &clock).sensor_tick);
        assert_eq!(engine.snapshot().battery_percent, Some(75));
    }

    #[test]
    fn open_box_buffers_an_alert_and_wakes_the_radio() {
        let mut engine = engine();
        let mut radio = Loopback::default();
        let mut sensors = Steady { temperature: Some(4.0), light: 100 };
        let clock = ManualClock::new(1001);

        let report = engine.poll(&mut radio, &mut sensors, &clock);
        assert!(report.emergency.actionable);
        assert_eq!(report.recorded, Some(Delivery::Buffered { evicted: false }));
        assert_eq!(engine.state(), ConnectivityState::Connecting);
        assert!(radio.powered);
        assert!(engine.buffer().front().is_some_and(|p| p.contains("EVENTO_CRITICO")));
        assert!(engine.indicators(1001).buzzer);
    }

    #[test]
    fn commands_arrive_through_the_command_topic() {
        let mut engine = engine();
        let mut radio = Loopback::default();
        radio.inbound.push(InboundMessage {
            topic: "vasafe/box_01/command".to_string(),
            payload: br#"{"status_operacional":"APROVADO","comando":"SYNC"}"#.to_vec(),
        });
        radio.inbound.push(InboundMessage {
            topic: "vasafe/other/command".to_string(),
            payload: br#"{"comando":"MANUTENCAO_ON"}"#.to_vec(),
        });
        let mut sensors = Steady { temperature: Some(4.0), light: 900 };
        let clock = ManualClock::new(0);

        let report = engine.poll(&mut radio, &mut sensors, &clock);
        assert_eq!(report.inbound, 2);
        assert!(engine.flags().forced_sync_requested);
        assert!(!engine.flags().maintenance_mode);
        assert_eq!(engine.snapshot().remote_status_text.as_str(), "APROVADO");
    }

    #[test]
    fn sensor_fault_is_recorded_with_zero_temperature() {
        let mut engine = engine();
        let mut radio = Loopback::default();
        let mut sensors = Steady { temperature: None, light: 900 };
        let clock = ManualClock::new(0);
        engine.submit_command(b"MANUTENCAO_ON");

        clock.set(1001);
        engine.poll(&mut radio, &mut sensors, &clock);
        let snapshot = engine.snapshot();
        assert!(snapshot.sensor_fault);
        assert_eq!(snapshot.headline(), "ERRO SENSOR");
        assert!(engine.buffer().front().is_some_and(|p| p.contains("\"temperatura\":0")));
    }
}
