//! Telemetry Publisher
//!
//! Serializes samples and decides publish-vs-buffer, then drains the offline
//! buffer in capture order once the session is up.
//!
//! Drain rules:
//! - Strict FIFO, one entry at a time, the head is removed only after its
//!   publish was accepted
//! - Fixed gap between consecutive publishes
//! - Stops at once when the session drops or a publish fails; what was sent
//!   stays sent, the rest waits for the next connected window

use alloc::string::String;

use crate::buffer::OfflineBuffer;
use crate::constants::time::DRAIN_PUBLISH_DELAY_MS;
use crate::errors::{PayloadError, TransportError};
use crate::sample::Sample;
use crate::time::Delay;
use crate::traits::Transport;

/// Where a recorded sample went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the live session
    Published,
    /// Queued in the offline buffer
    Buffered {
        /// The oldest entry was evicted to make room
        evicted: bool,
    },
}

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Entries published and removed
    pub sent: usize,
    /// Entries still queued
    pub remaining: usize,
    /// Why the pass stopped early, if it did
    pub interrupted: Option<TransportError>,
}

impl DrainReport {
    /// Buffer ended empty
    pub fn completed(&self) -> bool {
        self.remaining == 0
    }
}

/// Publishes to the telemetry topic
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    topic: String,
    drain_gap_ms: u32,
}

impl TelemetryPublisher {
    /// Publisher for `topic` with the standard drain gap
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into(), drain_gap_ms: DRAIN_PUBLISH_DELAY_MS }
    }

    /// Override the gap between drain publishes
    pub fn with_drain_gap(mut self, ms: u32) -> Self {
        self.drain_gap_ms = ms;
        self
    }

    /// Serialize `sample`, publish it if the session is up, buffer it otherwise
    ///
    /// While a backlog is waiting the sample joins it, so the collector still
    /// receives samples in capture order. A publish the session rejects falls
    /// back to the buffer.
    pub fn record<T: Transport + ?Sized>(
        &self,
        sample: &Sample<'_>,
        transport: &mut T,
        buffer: &mut OfflineBuffer,
    ) -> Result<Delivery, PayloadError> {
        let payload = sample.to_payload()?;

        if transport.is_connected() && buffer.is_empty() {
            match transport.publish(&self.topic, &payload) {
                Ok(()) => {
                    log_info!("[ONLINE] {}", payload);
                    return Ok(Delivery::Published);
                }
                Err(_e) => log_warn!("Publish failed ({}), buffering sample", _e),
            }
        }

        log_info!("[BUFFER] {}", payload);
        let evicted = buffer.push(payload).is_some();
        Ok(Delivery::Buffered { evicted })
    }

    /// Publish buffered entries oldest first until empty or interrupted
    pub fn drain<T, D>(&self, buffer: &mut OfflineBuffer, transport: &mut T, delay: &D) -> DrainReport
    where
        T: Transport + ?Sized,
        D: Delay + ?Sized,
    {
        let mut report = DrainReport::default();
        if buffer.is_empty() {
            return report;
        }
        log_info!("Draining {} buffered samples", buffer.len());

        while let Some(entry) = buffer.front() {
            if !transport.is_connected() {
                report.interrupted = Some(TransportError::NotConnected);
                break;
            }
            if let Err(e) = transport.publish(&self.topic, entry) {
                report.interrupted = Some(e);
                break;
            }
            buffer.pop_front();
            report.sent += 1;

            if !buffer.is_empty() {
                delay.delay_ms(self.drain_gap_ms);
            }
        }

        report.remaining = buffer.len();
        match report.interrupted {
            Some(_e) => log_warn!(
                "Drain interrupted after {} samples ({}), {} left",
                report.sent,
                _e,
                report.remaining
            ),
            None => log_info!("Drain complete, {} samples sent", report.sent),
        }
        report
    }
}
