//! Transport Connectors for the VaSafe Telemetry Engine
//!
//! ## Overview
//!
//! The engine in `vasafe-core` talks to the network only through its
//! [`Transport`](vasafe_core::Transport) trait. This crate provides the
//! adapters that make that trait real on a host.
//!
//! ### MQTT
//!
//! **Why MQTT for a shipment monitor:**
//! - Small fixed header (2-5 bytes), fine over a weak cellular or WiFi link
//! - Pub/sub lets the collector push commands back on a per-device topic
//! - Clean sessions make every radio wake-up a fresh, self-contained session
//!
//! **Topic layout:**
//! ```text
//! vasafe/<device_id>/telemetry   device -> collector, JSON samples
//! vasafe/<device_id>/command     collector -> device, JSON or free text
//! ```
//!
//! ## Delivery Semantics
//!
//! Publishes are best-effort (QoS 0 by default). The engine never assumes a
//! delivery confirmation; it only cares whether the request was accepted by
//! a live session, and keeps the sample buffered otherwise.
//!
//! ## Resource Usage
//!
//! | Connector | Threads | Buffers                              |
//! |-----------|---------|--------------------------------------|
//! | MQTT      | none    | request channel (16), inbound queue  |
//!
//! The MQTT adapter pumps the client's event loop from inside the trait calls
//! with short bounded waits, so it fits the engine's single cooperative loop.

#![warn(missing_docs)]

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttError, MqttTransport, QoS};

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Completed broker handshakes
    pub reconnections: u32,
    /// Inbound messages received
    pub inbound_received: u64,
    /// Last error message
    pub last_error: Option<String>,
}
