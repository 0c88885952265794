//! Collaborator traits
//!
//! The engine's only view of hardware and network. Adapters implement these;
//! the engine never learns which radio, broker client or sensor part is
//! behind them. Keep them simple - each method maps to one primitive the
//! reference firmware already has.

use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::TransportError;

/// A message that arrived on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the broker delivered on
    pub topic: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

/// Radio plus publish/subscribe session
///
/// Inbound messages may arrive at any time inside the adapter; the engine
/// collects them with [`Transport::poll_inbound`] once per poll and handles
/// them synchronously.
pub trait Transport {
    /// Power the radio up and start associating
    fn radio_on(&mut self);

    /// Power the radio down
    fn radio_off(&mut self);

    /// Wireless link associated and usable
    fn link_up(&self) -> bool;

    /// Broker handshake with `client_id`
    fn connect(&mut self, client_id: &str) -> Result<(), TransportError>;

    /// Close the broker session, if any
    fn disconnect(&mut self);

    /// Broker session established
    fn is_connected(&self) -> bool;

    /// Best-effort publish; `Ok` means handed to the session, not delivered
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Subscribe on the current session
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Next inbound message, if one is waiting
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}

/// Sensor reads
///
/// Each read is independent and may fail on its own.
pub trait SensorSuite {
    /// Temperature in °C, `None` when the sensor did not answer
    fn read_temperature(&mut self) -> Option<f32>;

    /// Light sensor in raw ADC counts; lower is brighter
    fn read_light(&mut self) -> u16;

    /// Battery voltage, `None` when not measurable
    fn read_battery_voltage(&mut self) -> Option<f32>;
}
