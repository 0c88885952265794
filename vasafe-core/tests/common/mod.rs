//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scriptable in-memory transport (link availability, session drops,
//!   publish log, inbound queue)
//! - Scripted sensors
//! - Helpers to drive an engine against a manual clock

#![allow(dead_code)]

use std::collections::VecDeque;

use serde_json::Value;
use vasafe_core::{
    ConfigInputs, DeviceConfig, InboundMessage, ManualClock, PollReport, SensorSuite,
    TelemetryEngine, TimeSource, Transport, TransportError,
};

/// Command topic of the default configuration
pub const COMMAND_TOPIC: &str = "vasafe/box_01/command";

/// Telemetry topic of the default configuration
pub const TELEMETRY_TOPIC: &str = "vasafe/box_01/telemetry";

/// In-memory radio and broker session
#[derive(Debug, Default)]
pub struct MockTransport {
    pub powered: bool,
    /// Access point in range; the link is up when powered and available
    pub link_available: bool,
    pub connected: bool,
    pub refuse_handshake: bool,
    /// Session drops right after this many publishes in total
    pub drop_after: Option<usize>,
    pub published: Vec<(String, String)>,
    pub subscriptions: Vec<String>,
    pub inbound: VecDeque<InboundMessage>,
    pub radio_on_count: usize,
    pub radio_off_count: usize,
    pub handshakes: usize,
}

impl MockTransport {
    /// Transport whose access point is always reachable
    pub fn reachable() -> Self {
        Self { link_available: true, ..Self::default() }
    }

    /// Transport that never finds a network
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Deliver a message on the command topic
    pub fn deliver_command(&mut self, payload: &str) {
        self.inbound.push_back(InboundMessage {
            topic: COMMAND_TOPIC.to_string(),
            payload: payload.as_bytes().to_vec(),
        });
    }

    /// Payloads published on the telemetry topic, in order
    pub fn telemetry(&self) -> Vec<Value> {
        self.published
            .iter()
            .filter(|(topic, _)| topic == TELEMETRY_TOPIC)
            .map(|(_, payload)| serde_json::from_str(payload).expect("published payload is JSON"))
            .collect()
    }
}

impl Transport for MockTransport {
    fn radio_on(&mut self) {
        self.powered = true;
        self.radio_on_count += 1;
    }

    fn radio_off(&mut self) {
        self.powered = false;
        self.connected = false;
        self.radio_off_count += 1;
    }

    fn link_up(&self) -> bool {
        self.powered && self.link_available
    }

    fn connect(&mut self, _client_id: &str) -> Result<(), TransportError> {
        if !self.link_up() {
            return Err(TransportError::LinkDown);
        }
        if self.refuse_handshake {
            return Err(TransportError::HandshakeFailed);
        }
        self.handshakes += 1;
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.published.push((topic.to_string(), payload.to_string()));
        if self.drop_after == Some(self.published.len()) {
            self.connected = false;
        }
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}

/// Sensors returning whatever the test last set
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    pub temperature: Option<f32>,
    pub light: u16,
    pub battery_voltage: Option<f32>,
}

impl Default for ScriptedSensors {
    /// Closed box at 4 °C, battery near full
    fn default() -> Self {
        Self { temperature: Some(4.0), light: 900, battery_voltage: Some(4.1) }
    }
}

impl SensorSuite for ScriptedSensors {
    fn read_temperature(&mut self) -> Option<f32> {
        self.temperature
    }

    fn read_light(&mut self) -> u16 {
        self.light
    }

    fn read_battery_voltage(&mut self) -> Option<f32> {
        self.battery_voltage
    }
}

/// Engine with the stored default configuration, booted at 0 ms
pub fn default_engine() -> TelemetryEngine {
    TelemetryEngine::new(DeviceConfig::derive(&ConfigInputs::default()), 0)
}

/// Engine with a custom trip duration and sync period
pub fn engine_with(duration_hours: &str, sync_minutes: &str) -> TelemetryEngine {
    let inputs = ConfigInputs {
        trip_duration_hours: duration_hours.to_string(),
        sync_period_minutes: sync_minutes.to_string(),
        ..ConfigInputs::default()
    };
    TelemetryEngine::new(DeviceConfig::derive(&inputs), 0)
}

/// Advance by just over one sensor period and poll once
pub fn tick(
    engine: &mut TelemetryEngine,
    transport: &mut MockTransport,
    sensors: &mut ScriptedSensors,
    clock: &ManualClock,
) -> PollReport {
    clock.advance(1001);
    engine.poll(transport, sensors, clock)
}

/// Tick until `until` ms, collecting every report
pub fn run_until(
    engine: &mut TelemetryEngine,
    transport: &mut MockTransport,
    sensors: &mut ScriptedSensors,
    clock: &ManualClock,
    until: u64,
) -> Vec<PollReport> {
    let mut reports = Vec::new();
    while clock.now() < until {
        reports.push(tick(engine, transport, sensors, clock));
    }
    reports
}

/// Temperature of a payload, as f32
pub fn temperature_of(payload: &Value) -> f32 {
    payload["temperatura"].as_f64().expect("temperatura is a number") as f32
}
