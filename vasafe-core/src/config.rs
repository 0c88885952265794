//! Boot-time configuration derivation
//!
//! The key-value store hands over five strings. This module turns them into
//! the immutable [`DeviceConfig`] the engine runs with:
//!
//! ```text
//! measurement_interval = max(10 s, trip_duration_s / buffer_capacity)
//! sync_interval        = sync_minutes * 60 s
//! ```
//!
//! Spreading exactly `buffer_capacity` samples across the trip means a device
//! that never sees a network still returns with the whole trip on board. The
//! derivation runs once; changing the stored inputs takes effect on restart.
//!
//! ```rust
//! use vasafe_core::config::{ConfigInputs, DeviceConfig};
//!
//! let inputs = ConfigInputs { trip_duration_hours: "3".into(), ..ConfigInputs::default() };
//! let config = DeviceConfig::derive(&inputs);
//! assert_eq!(config.measurement_interval().to_secs(), 27);
//! ```

use alloc::format;
use alloc::string::{String, ToString};

use fugit::MillisDurationU64;
use heapless::Vec as BoundedVec;
use serde::{Deserialize, Serialize};

use crate::constants::buffers::{DEFAULT_BUFFER_CAPACITY, MAX_DEVICE_ID_LEN};
use crate::constants::protocol::{
    COMMAND_TOPIC_SUFFIX, DEFAULT_BROKER_HOST, DEFAULT_BROKER_PORT, DEFAULT_DEVICE_ID,
    DEFAULT_TOPIC_NAMESPACE, TELEMETRY_TOPIC_SUFFIX,
};
use crate::constants::sensors::{LIGHT_ALARM_THRESHOLD, TEMP_DELTA_LIMIT_C};
use crate::constants::time::{
    DEFAULT_SYNC_PERIOD_MINUTES, DEFAULT_TRIP_DURATION_HOURS, MIN_MEASUREMENT_INTERVAL_S,
    MS_PER_SECOND, SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};
use crate::errors::ConfigError;

/// Raw configuration exactly as the key-value store keeps it
///
/// Every value is a string because that is what the captive portal collects
/// and what the store persists. Missing keys take the stored defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInputs {
    /// Broker host name or address
    #[serde(rename = "server", default = "default_server")]
    pub broker_host: String,

    /// Broker TCP port
    #[serde(rename = "port", default = "default_port")]
    pub broker_port: String,

    /// Device identity, also the MQTT client id and topic segment
    #[serde(rename = "boxid", default = "default_box_id")]
    pub device_id: String,

    /// Expected trip length in hours (fractional allowed)
    #[serde(rename = "duration", default = "default_duration")]
    pub trip_duration_hours: String,

    /// Sync period in whole minutes
    #[serde(rename = "sync_min", default = "default_sync_min")]
    pub sync_period_minutes: String,
}

fn default_server() -> String {
    DEFAULT_BROKER_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_BROKER_PORT.to_string()
}

fn default_box_id() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

fn default_duration() -> String {
    "3".to_string()
}

fn default_sync_min() -> String {
    "5".to_string()
}

impl Default for ConfigInputs {
    fn default() -> Self {
        Self {
            broker_host: default_server(),
            broker_port: default_port(),
            device_id: default_box_id(),
            trip_duration_hours: default_duration(),
            sync_period_minutes: default_sync_min(),
        }
    }
}

/// Alarm thresholds the classifier and emergency detector apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Light readings below this mean the box is open (raw ADC counts)
    pub light_alarm: u16,
    /// Temperature swing between scheduled samples that raises an emergency (°C)
    pub temp_delta_limit: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            light_alarm: LIGHT_ALARM_THRESHOLD,
            temp_delta_limit: TEMP_DELTA_LIMIT_C,
        }
    }
}

/// Tunables that are fixed per firmware build rather than per trip
#[derive(Debug, Clone, PartialEq)]
pub struct Tunables {
    /// Offline buffer slots
    pub buffer_capacity: usize,
    /// First topic segment
    pub topic_namespace: String,
    /// Alarm thresholds
    pub thresholds: Thresholds,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            topic_namespace: DEFAULT_TOPIC_NAMESPACE.to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Broker endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

/// Telemetry and command topics, derived once from the device id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// `<namespace>/<device_id>/telemetry`
    pub telemetry: String,
    /// `<namespace>/<device_id>/command`
    pub command: String,
}

impl Topics {
    fn for_device(namespace: &str, device_id: &str) -> Self {
        Self {
            telemetry: format!("{}/{}/{}", namespace, device_id, TELEMETRY_TOPIC_SUFFIX),
            command: format!("{}/{}/{}", namespace, device_id, COMMAND_TOPIC_SUFFIX),
        }
    }
}

/// Problems found while deriving a config; each one was replaced by a default
pub type ConfigIssues = BoundedVec<ConfigError, 4>;

/// Immutable runtime configuration
///
/// Only constructible through [`DeviceConfig::derive`] /
/// [`DeviceConfig::derive_with`], and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    device_id: String,
    broker: BrokerAddress,
    measurement_interval: MillisDurationU64,
    sync_interval: MillisDurationU64,
    buffer_capacity: usize,
    thresholds: Thresholds,
    topics: Topics,
}

impl DeviceConfig {
    /// Derive with the default tunables, logging every fallback
    pub fn derive(inputs: &ConfigInputs) -> Self {
        Self::derive_with(inputs, Tunables::default())
    }

    /// Derive with explicit tunables, logging every fallback
    pub fn derive_with(inputs: &ConfigInputs, tunables: Tunables) -> Self {
        let (config, issues) = Self::derive_checked(inputs, tunables);
        for issue in &issues {
            log_warn!("Config: {}", issue);
        }
        log_info!(
            "Config applied: id={} broker={}:{} measure every {}s, sync every {}s, buffer {}",
            config.device_id,
            config.broker.host,
            config.broker.port,
            config.measurement_interval.to_secs(),
            config.sync_interval.to_secs(),
            config.buffer_capacity
        );
        config
    }

    /// Derive and hand back the list of substituted values instead of logging
    pub fn derive_checked(inputs: &ConfigInputs, tunables: Tunables) -> (Self, ConfigIssues) {
        let mut issues = ConfigIssues::new();
        let buffer_capacity = tunables.buffer_capacity.max(1);

        let hours = parse_trip_hours(&inputs.trip_duration_hours).unwrap_or_else(|e| {
            let _ = issues.push(e);
            DEFAULT_TRIP_DURATION_HOURS
        });
        let minutes = parse_sync_minutes(&inputs.sync_period_minutes).unwrap_or_else(|e| {
            let _ = issues.push(e);
            DEFAULT_SYNC_PERIOD_MINUTES
        });
        let port = parse_port(&inputs.broker_port).unwrap_or_else(|e| {
            let _ = issues.push(e);
            DEFAULT_BROKER_PORT
        });
        let device_id = validate_device_id(&inputs.device_id)
            .map(ToString::to_string)
            .unwrap_or_else(|e| {
                let _ = issues.push(e);
                DEFAULT_DEVICE_ID.to_string()
            });

        let host = inputs.broker_host.trim();
        let host = if host.is_empty() { DEFAULT_BROKER_HOST } else { host };

        let config = Self {
            topics: Topics::for_device(&tunables.topic_namespace, &device_id),
            device_id,
            broker: BrokerAddress { host: host.to_string(), port },
            measurement_interval: measurement_interval(hours, buffer_capacity),
            sync_interval: sync_interval(minutes),
            buffer_capacity,
            thresholds: tunables.thresholds,
        };
        (config, issues)
    }

    /// Device identity
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Broker endpoint
    pub fn broker(&self) -> &BrokerAddress {
        &self.broker
    }

    /// Gap between scheduled measurements
    pub fn measurement_interval(&self) -> MillisDurationU64 {
        self.measurement_interval
    }

    /// Gap between scheduled syncs
    pub fn sync_interval(&self) -> MillisDurationU64 {
        self.sync_interval
    }

    /// Offline buffer slots
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Alarm thresholds
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Telemetry and command topics
    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}

/// `max(10 s, trip_seconds / capacity)`, integer seconds
pub fn measurement_interval(trip_hours: f32, buffer_capacity: usize) -> MillisDurationU64 {
    let trip_secs = (trip_hours * SECONDS_PER_HOUR as f32) as u64;
    let per_slot = trip_secs / buffer_capacity.max(1) as u64;
    saturating_secs(per_slot.max(MIN_MEASUREMENT_INTERVAL_S))
}

/// `sync_minutes * 60 s`
pub fn sync_interval(sync_minutes: u64) -> MillisDurationU64 {
    saturating_secs(sync_minutes.saturating_mul(SECONDS_PER_MINUTE))
}

// Inputs have no upper bound; clamp at the largest representable duration
fn saturating_secs(secs: u64) -> MillisDurationU64 {
    MillisDurationU64::millis(secs.saturating_mul(MS_PER_SECOND))
}

fn parse_trip_hours(raw: &str) -> Result<f32, ConfigError> {
    match raw.trim().parse::<f32>() {
        Ok(hours) if hours.is_finite() && hours > 0.0 => Ok(hours),
        _ => Err(ConfigError::InvalidDuration),
    }
}

fn parse_sync_minutes(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes as u64),
        _ => Err(ConfigError::InvalidSyncPeriod),
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort),
    }
}

fn validate_device_id(raw: &str) -> Result<&str, ConfigError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ConfigError::InvalidDeviceId { reason: "empty" });
    }
    if id.len() > MAX_DEVICE_ID_LEN {
        return Err(ConfigError::InvalidDeviceId { reason: "too long" });
    }
    if id.contains(['/', '+', '#']) {
        return Err(ConfigError::InvalidDeviceId { reason: "topic metacharacter" });
    }
    Ok(id)
}
