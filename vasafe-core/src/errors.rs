//! Error Types for the Telemetry Engine
//!
//! ## Design Philosophy
//!
//! Nothing in this engine is fatal. Every error here describes a condition the
//! polling loop absorbs and recovers from on a later tick:
//!
//! 1. **Small Size**: Each variant is a few bytes and `Copy`, so errors can be
//!    returned from the hot path and stashed in reports without moves.
//!
//! 2. **No Heap Allocation**: Only `&'static str` and integers are carried,
//!    which keeps the types usable without `alloc`.
//!
//! 3. **Actionable Information**: The variant alone tells the caller what to do
//!    next (buffer the sample, revert the radio, fall back to a default).
//!
//! ## Error Categories
//!
//! ### Transport
//! - `TransportError`: link or broker trouble reported by the pub/sub adapter
//! - `ConnectError`: the bounded connect attempt ran out of polls
//!
//! ### Data
//! - `PayloadError`: a sample could not be serialized
//!
//! ### Boot
//! - `ConfigError`: a stored configuration value was unusable and a default
//!   was substituted
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use vasafe_core::TransportError;
//!
//! fn on_publish(result: Result<(), TransportError>) -> bool {
//!     match result {
//!         Ok(()) => true,
//!         // Keep the sample queued, the next connected window retries it
//!         Err(TransportError::NotConnected) | Err(TransportError::LinkDown) => false,
//!         Err(_) => false,
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Errors reported by a pub/sub transport adapter
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Radio is off or the wireless link is not associated
    #[error("Wireless link is down")]
    LinkDown,

    /// Link is up but the broker refused or never answered the handshake
    #[error("Broker handshake failed")]
    HandshakeFailed,

    /// Operation needs an established broker session
    #[error("Not connected to broker")]
    NotConnected,

    /// Broker session rejected or dropped the publish
    #[error("Publish failed")]
    PublishFailed,

    /// Command channel subscription was rejected
    #[error("Subscribe failed")]
    SubscribeFailed,
}

/// Outcome of a connect attempt that will not succeed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// All polls of the attempt were spent without a broker session
    #[error("Connect attempt gave up after {attempts} polls")]
    RetryBudgetExhausted {
        /// Polls performed before giving up
        attempts: u8,
    },
}

/// Sample serialization failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// JSON encoder rejected the sample
    #[error("Sample serialization failed")]
    Serialize,
}

/// Stored configuration values that could not be used as-is
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Trip duration missing, non-numeric or not positive
    #[error("Invalid trip duration, using default")]
    InvalidDuration,

    /// Sync period missing, non-numeric or not positive
    #[error("Invalid sync period, using default")]
    InvalidSyncPeriod,

    /// Broker port not a valid non-zero port number
    #[error("Invalid broker port, using default")]
    InvalidPort,

    /// Device id empty, too long or containing topic metacharacters
    #[error("Invalid device id: {reason}")]
    InvalidDeviceId {
        /// Why the id was rejected
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::LinkDown => defmt::write!(fmt, "Link down"),
            Self::HandshakeFailed => defmt::write!(fmt, "Handshake failed"),
            Self::NotConnected => defmt::write!(fmt, "Not connected"),
            Self::PublishFailed => defmt::write!(fmt, "Publish failed"),
            Self::SubscribeFailed => defmt::write!(fmt, "Subscribe failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::RetryBudgetExhausted { attempts } =>
                defmt::write!(fmt, "Connect gave up after {} polls", attempts),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidDuration => defmt::write!(fmt, "Invalid duration"),
            Self::InvalidSyncPeriod => defmt::write!(fmt, "Invalid sync period"),
            Self::InvalidPort => defmt::write!(fmt, "Invalid port"),
            Self::InvalidDeviceId { reason } => defmt::write!(fmt, "Invalid device id: {}", reason),
        }
    }
}
