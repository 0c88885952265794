//! Bounded FIFO for Samples Awaiting Transmission
//!
//! ## Overview
//!
//! While the radio is off, serialized samples wait here. The buffer is a ring
//! with overwrite-oldest semantics: once full, every insert evicts exactly the
//! oldest entry. Losing the start of a long offline stretch is accepted policy;
//! the most recent readings are the ones the collector needs to assess the
//! cargo on arrival.
//!
//! ## Design Rationale
//!
//! ### Why a Ring?
//!
//! - O(1) insertion, eviction included
//! - O(1) access to the oldest entry, which is the next one to publish
//! - Slots allocated once at boot; steady state never reallocates
//!
//! ### Why Runtime Capacity?
//!
//! Capacity is part of the configuration (it also sets the measurement
//! cadence), so it cannot be a const generic. The slot vector is sized once in
//! [`OfflineBuffer::new`] and never grows.
//!
//! ### Memory Layout
//!
//! ```text
//! OfflineBuffer, capacity 5, after 7 pushes (A..G):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  F  │  G  │  C  │  D  │  E  │  ← slots
//! └─────┴─────┴─────┴─────┴─────┘
//!                ↑
//!                └── head = 2 (oldest, next to drain)
//!
//! Logical view: [C, D, E, F, G]   (A and B were evicted)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use vasafe_core::buffer::OfflineBuffer;
//!
//! let mut buffer = OfflineBuffer::new(2);
//! buffer.push("a".into());
//! buffer.push("b".into());
//! assert_eq!(buffer.push("c".into()), Some("a".into()));
//!
//! assert_eq!(buffer.front(), Some("b"));
//! buffer.pop_front();
//! assert_eq!(buffer.front(), Some("c"));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::constants::buffers::BUFFER_PRESSURE_TENTHS;

/// Ring buffer of serialized samples
///
/// ## Internal Invariants
///
/// - `slots.len() == capacity`, fixed at construction
/// - `len <= capacity`
/// - `head < capacity`; the oldest entry lives at `slots[head]`
/// - Logical index `i` lives at `slots[(head + i) % capacity]`
/// - Exactly the `len` logically occupied slots are `Some`
#[derive(Debug, Clone)]
pub struct OfflineBuffer {
    slots: Vec<Option<String>>,
    head: usize,
    len: usize,
}

impl OfflineBuffer {
    /// Allocate a buffer with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, head: 0, len: 0 }
    }

    /// Append a payload, evicting and returning the oldest when full
    pub fn push(&mut self, payload: String) -> Option<String> {
        let capacity = self.capacity();
        if self.len == capacity {
            // Newest overwrites oldest; the ring rotates by one
            let evicted = self.slots[self.head].replace(payload);
            self.head = (self.head + 1) % capacity;
            log_debug!("Offline buffer full, evicted oldest entry");
            evicted
        } else {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = Some(payload);
            self.len += 1;
            None
        }
    }

    /// Oldest payload, the next one to publish
    pub fn front(&self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_deref()
    }

    /// Remove and return the oldest payload
    pub fn pop_front(&mut self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let payload = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        payload
    }

    /// Number of queued payloads
    pub fn len(&self) -> usize {
        self.len
    }

    /// Nothing queued
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every slot occupied
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Slot count fixed at boot
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupancy strictly above 90% of capacity
    ///
    /// Integer form of `len > 0.9 * capacity`, so a capacity of 400 reports
    /// pressure from 361 entries on and 360 does not.
    pub fn under_pressure(&self) -> bool {
        self.len * 10 > self.capacity() * BUFFER_PRESSURE_TENTHS
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % capacity].as_deref())
    }
}
