//! MQTT Transport for the VaSafe Engine
//!
//! ## Overview
//!
//! Implements [`vasafe_core::Transport`] on top of the synchronous `rumqttc`
//! client. The engine runs one cooperative loop, so the adapter never spawns
//! a thread of its own: the client's event loop is pumped with short bounded
//! waits from inside the trait calls.
//!
//! ```text
//! engine ──publish/subscribe──▶ Client ──requests──▶ Connection ──TCP──▶ broker
//!    ▲                                                   │
//!    └──────── poll_inbound ◀── inbound queue ◀── pump ──┘
//! ```
//!
//! ## Session Lifecycle
//!
//! - `radio_on` / `radio_off` model the modem power rail; on a host the
//!   network is always reachable once the radio flag is up
//! - `connect` builds a fresh clean session and pumps until CONNACK or the
//!   handshake timeout
//! - Any connection error observed while pumping tears the session down;
//!   the controller sees `is_connected() == false` on its next tick and
//!   reconnects from scratch
//!
//! ## Example
//!
//! ```no_run
//! use vasafe_connectors::mqtt::{MqttConfig, MqttTransport};
//! use vasafe_core::Transport;
//!
//! let mut transport = MqttTransport::new(MqttConfig::new("broker.local", 1883));
//! transport.radio_on();
//! if transport.connect("box_01").is_ok() {
//!     transport.subscribe("vasafe/box_01/command").ok();
//!     transport.publish("vasafe/box_01/telemetry", r#"{"box_id":"box_01"}"#).ok();
//! }
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet};
use thiserror::Error;
use vasafe_core::{InboundMessage, Transport, TransportError};

use crate::ConnectionStats;

pub use rumqttc::QoS;

/// Events handled per pump call before yielding back to the loop
const MAX_EVENTS_PER_PUMP: usize = 32;

/// MQTT adapter errors
#[derive(Debug, Error)]
pub enum MqttError {
    /// Radio powered down
    #[error("Radio is off")]
    RadioOff,

    /// No session
    #[error("Not connected")]
    NotConnected,

    /// Broker answered CONNACK with a failure code
    #[error("Broker refused connection: {0:?}")]
    Refused(ConnectReturnCode),

    /// No CONNACK in time
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// Network or protocol failure in the event loop
    #[error("Connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Request could not be queued to the event loop
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

impl MqttError {
    /// Collapse into the engine's transport error for a failed `operation`
    pub fn into_transport(self, operation: Operation) -> TransportError {
        match (self, operation) {
            (MqttError::RadioOff, _) => TransportError::LinkDown,
            (MqttError::NotConnected, _) => TransportError::NotConnected,
            (_, Operation::Connect) => TransportError::HandshakeFailed,
            (_, Operation::Publish) => TransportError::PublishFailed,
            (_, Operation::Subscribe) => TransportError::SubscribeFailed,
        }
    }
}

/// Transport operation, for error mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Broker handshake
    Connect,
    /// Telemetry publish
    Publish,
    /// Command subscription
    Subscribe,
}

/// MQTT connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Maximum wait for CONNACK
    pub handshake_timeout: Duration,
    /// Wait per event while pumping the event loop
    pub pump_timeout: Duration,
    /// Request channel capacity
    pub request_capacity: usize,
    /// QoS for telemetry and subscriptions
    pub qos: QoS,
}

impl MqttConfig {
    /// Settings for `host:port` with defaults suited to a duty-cycled radio
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            keep_alive: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(5),
            pump_timeout: Duration::from_millis(10),
            request_capacity: 16,
            qos: QoS::AtMostOnce,
        }
    }

    /// Set the keep-alive interval
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the CONNACK wait
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the QoS level
    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    fn options(&self, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options
    }
}

struct Session {
    client: Client,
    connection: Connection,
}

/// `rumqttc`-backed transport
pub struct MqttTransport {
    config: MqttConfig,
    radio: bool,
    session: Option<Session>,
    inbound: VecDeque<InboundMessage>,
    stats: ConnectionStats,
}

impl MqttTransport {
    /// Transport with the radio off and no session
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            radio: false,
            session: None,
            inbound: VecDeque::new(),
            stats: ConnectionStats::default(),
        }
    }

    /// Counters since creation
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Settings in use
    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    fn handshake(&mut self, client_id: &str) -> Result<(), MqttError> {
        if !self.radio {
            return Err(MqttError::RadioOff);
        }
        self.drop_session();

        let (client, mut connection) =
            Client::new(self.config.options(client_id), self.config.request_capacity);
        let deadline = Instant::now() + self.config.handshake_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MqttError::HandshakeTimeout(self.config.handshake_timeout));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(MqttError::Refused(ack.code));
                    }
                    break;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(MqttError::Connection(e)),
                Err(_) => return Err(MqttError::HandshakeTimeout(self.config.handshake_timeout)),
            }
        }

        self.session = Some(Session { client, connection });
        self.stats.reconnections += 1;
        Ok(())
    }

    /// Run the event loop until it goes quiet, collecting inbound publishes
    fn pump(&mut self) {
        let timeout = self.config.pump_timeout;
        let mut failure = None;

        if let Some(session) = self.session.as_mut() {
            for _ in 0..MAX_EVENTS_PER_PUMP {
                match session.connection.recv_timeout(timeout) {
                    Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                        debug!("Inbound on {} ({} bytes)", publish.topic, publish.payload.len());
                        self.stats.inbound_received += 1;
                        self.inbound.push_back(InboundMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                        });
                    }
                    Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                        failure = Some("broker sent DISCONNECT".to_string());
                        break;
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        failure = Some(e.to_string());
                        break;
                    }
                    Err(_) => break,
                }
            }
        }

        if let Some(reason) = failure {
            warn!("MQTT session lost: {}", reason);
            self.stats.last_error = Some(reason);
            self.drop_session();
        }
    }

    fn drop_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.client.disconnect().is_err() {
            return;
        }
        // The request only reaches the broker once the event loop runs
        for _ in 0..MAX_EVENTS_PER_PUMP {
            match session.connection.recv_timeout(self.config.pump_timeout) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) | Ok(Err(_)) | Err(_) => break,
                Ok(Ok(_)) => {}
            }
        }
    }

    fn session(&mut self) -> Result<&mut Session, MqttError> {
        self.session.as_mut().ok_or(MqttError::NotConnected)
    }
}

impl Transport for MqttTransport {
    fn radio_on(&mut self) {
        if !self.radio {
            info!(">>> RADIO ON <<<");
        }
        self.radio = true;
    }

    fn radio_off(&mut self) {
        self.drop_session();
        if self.radio {
            info!(">>> RADIO OFF <<<");
        }
        self.radio = false;
    }

    fn link_up(&self) -> bool {
        self.radio
    }

    fn connect(&mut self, client_id: &str) -> Result<(), TransportError> {
        match self.handshake(client_id) {
            Ok(()) => {
                info!("Connected to {}:{} as {}", self.config.host, self.config.port, client_id);
                Ok(())
            }
            Err(e) => {
                debug!("Handshake with {}:{} failed: {}", self.config.host, self.config.port, e);
                self.stats.last_error = Some(e.to_string());
                Err(e.into_transport(Operation::Connect))
            }
        }
    }

    fn disconnect(&mut self) {
        if self.session.is_some() {
            info!("Disconnecting from {}:{}", self.config.host, self.config.port);
        }
        self.drop_session();
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        let qos = self.config.qos;
        let result = self
            .session()
            .and_then(|s| Ok(s.client.publish(topic, qos, false, payload.as_bytes().to_vec())?));

        match result {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += payload.len() as u64;
                // Flush the request onto the wire
                self.pump();
                Ok(())
            }
            Err(e) => {
                self.stats.messages_failed += 1;
                self.stats.last_error = Some(e.to_string());
                Err(e.into_transport(Operation::Publish))
            }
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let qos = self.config.qos;
        self.session()
            .and_then(|s| Ok(s.client.subscribe(topic, qos)?))
            .map_err(|e| e.into_transport(Operation::Subscribe))?;
        info!("Subscribed to {}", topic);
        self.pump();
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        if self.inbound.is_empty() {
            self.pump();
        }
        self.inbound.pop_front()
    }
}
