//! Store-and-forward telemetry engine for VaSafe shipment monitors
//!
//! Decides when a sample is worth recording, when an emergency must bypass
//! duty-cycling, when the radio is powered, and how buffered samples are
//! drained once a broker session is available.
//!
//! Key constraints:
//! - Single cooperative polling loop, no locking
//! - Radio off whenever nothing needs it
//! - Bounded memory: offline buffer sized once at boot, fixed-size queues
//! - Nothing fatal after boot
//!
//! ```no_run
//! use vasafe_core::{ConfigInputs, DeviceConfig, ManualClock, TelemetryEngine};
//! # use vasafe_core::{InboundMessage, SensorSuite, Transport, TransportError};
//! # struct Radio;
//! # impl Transport for Radio {
//! #     fn radio_on(&mut self) {}
//! #     fn radio_off(&mut self) {}
//! #     fn link_up(&self) -> bool { false }
//! #     fn connect(&mut self, _: &str) -> Result<(), TransportError> { Err(TransportError::LinkDown) }
//! #     fn disconnect(&mut self) {}
//! #     fn is_connected(&self) -> bool { false }
//! #     fn publish(&mut self, _: &str, _: &str) -> Result<(), TransportError> { Err(TransportError::NotConnected) }
//! #     fn subscribe(&mut self, _: &str) -> Result<(), TransportError> { Ok(()) }
//! #     fn poll_inbound(&mut self) -> Option<InboundMessage> { None }
//! # }
//! # struct Probe;
//! # impl SensorSuite for Probe {
//! #     fn read_temperature(&mut self) -> Option<f32> { Some(4.0) }
//! #     fn read_light(&mut self) -> u16 { 900 }
//! #     fn read_battery_voltage(&mut self) -> Option<f32> { None }
//! # }
//!
//! let config = DeviceConfig::derive(&ConfigInputs::default());
//! let clock = ManualClock::new(0);
//! let mut engine = TelemetryEngine::new(config, 0);
//! let (mut radio, mut probe) = (Radio, Probe);
//!
//! loop {
//!     engine.poll(&mut radio, &mut probe, &clock);
//!     println!("{}", engine.snapshot().headline());
//!     clock.advance(100);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod buffer;
pub mod button;
pub mod command;
pub mod config;
pub mod constants;
pub mod controller;
pub mod emergency;
pub mod engine;
pub mod errors;
pub mod indicator;
pub mod publisher;
pub mod sample;
pub mod status;
pub mod time;
pub mod traits;

// Public API
pub use buffer::OfflineBuffer;
pub use command::{Command, CommandQueue, ModeFlags};
pub use config::{ConfigInputs, DeviceConfig, Thresholds, Tunables};
pub use controller::{transition, ConnectivityController, ConnectivityState, Signals};
pub use engine::{PollReport, TelemetryEngine};
pub use errors::{ConfigError, ConnectError, PayloadError, TransportError};
pub use status::StatusSnapshot;
pub use time::{Delay, ManualClock, TimeSource, Timestamp};
pub use traits::{InboundMessage, SensorSuite, Transport};

#[cfg(feature = "std")]
pub use time::MonotonicClock;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
