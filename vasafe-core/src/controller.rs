//! Connectivity Controller
//!
//! ## Overview
//!
//! Owns the radio and broker-session lifecycle. Each measurement tick the
//! controller gathers [`Signals`], runs the pure [`transition`] function and
//! applies the side effects of entering the new state (radio power, session
//! teardown, timer resets).
//!
//! ```text
//!                 trigger / maintenance
//!   ┌──────────┐ ─────────────────────▶ ┌────────────┐
//!   │ RadioOff │                        │ Connecting │ ── budget spent ──▶ RadioOff
//!   └──────────┘ ◀── idle + empty ───   └────────────┘
//!        ▲                    │              │ session up
//!        │ shutdown           │              ▼
//!        │            ┌────────────┐  buffer  ┌───────────────┐
//!        └─────────── │ OnlineIdle │ ◀──────▶ │ OnlineSyncing │
//!                     └────────────┘  empty   └───────────────┘
//!
//!   MaintenanceOnline: any state while maintenance is requested and the
//!   session is up; only a shutdown request leaves it.
//! ```
//!
//! ## Priority Ladder
//!
//! Guards are evaluated in a fixed order, never independently:
//!
//! 1. Shutdown request: always `RadioOff`
//! 2. Maintenance request: connect and stay connected
//! 3. Ordinary triggers: sync due, buffer pressure, actionable emergency,
//!    forced sync
//!
//! ## Connect Attempts
//!
//! A connect is a [`ConnectAttempt`] polled once per tick through
//! `nb::Result`: `WouldBlock` while the link is still associating, `Ok` once
//! the broker session is up and the command topic subscribed, and
//! `ConnectError::RetryBudgetExhausted` after the fixed number of polls.

use fugit::MillisDurationU64;

use crate::constants::time::{CONNECT_ATTEMPT_BUDGET, IDLE_POWER_DOWN_GRACE_MS};
use crate::errors::ConnectError;
use crate::time::{has_elapsed, Timestamp};
use crate::traits::Transport;

/// Radio and session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectivityState {
    /// Radio powered down
    #[default]
    RadioOff,
    /// Radio on, waiting for link and broker session
    Connecting,
    /// Session up, nothing buffered
    OnlineIdle,
    /// Session up, buffered samples waiting to drain
    OnlineSyncing,
    /// Session held up by operator request
    MaintenanceOnline,
}

impl ConnectivityState {
    /// Broker session expected to be up in this state
    pub fn is_online(self) -> bool {
        matches!(self, Self::OnlineIdle | Self::OnlineSyncing | Self::MaintenanceOnline)
    }

    /// Radio powered in this state
    pub fn radio_powered(self) -> bool {
        self != Self::RadioOff
    }

    /// Short name for logs and displays
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RadioOff => "radio-off",
            Self::Connecting => "connecting",
            Self::OnlineIdle => "online-idle",
            Self::OnlineSyncing => "online-syncing",
            Self::MaintenanceOnline => "maintenance",
        }
    }
}

impl core::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectivityState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str())
    }
}

/// Everything the transition function looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signals {
    /// Explicit power-down request; wins over everything
    pub shutdown_requested: bool,
    /// Maintenance override active
    pub maintenance_requested: bool,
    /// Sync interval elapsed since the last sync
    pub sync_due: bool,
    /// Offline buffer above 90% of capacity
    pub buffer_pressure: bool,
    /// Actionable (debounced) emergency this tick
    pub emergency: bool,
    /// Remote sync request pending
    pub forced_sync: bool,
    /// Broker session up
    pub session_up: bool,
    /// The current connect attempt spent its budget
    pub connect_exhausted: bool,
    /// Nothing buffered
    pub buffer_empty: bool,
    /// Idle grace period elapsed since the last activity
    pub idle_elapsed: bool,
}

impl Signals {
    /// Any ordinary reason to have the radio on
    pub fn wants_connection(&self) -> bool {
        self.sync_due || self.buffer_pressure || self.emergency || self.forced_sync
    }

    /// Online and allowed to power down
    ///
    /// `sync_due` only wakes the radio; a session that is already up with
    /// nothing buffered has nothing left to sync.
    fn may_rest(&self) -> bool {
        !(self.buffer_pressure || self.emergency || self.forced_sync)
            && self.buffer_empty
            && self.idle_elapsed
    }
}

/// Pure state transition
///
/// An online state only returns to `RadioOff` with an empty buffer and no
/// forced sync pending, unless shutdown was requested.
pub fn transition(state: ConnectivityState, signals: &Signals) -> ConnectivityState {
    use ConnectivityState::*;

    if signals.shutdown_requested {
        return RadioOff;
    }

    if signals.maintenance_requested {
        return match state {
            RadioOff => Connecting,
            Connecting if signals.session_up => MaintenanceOnline,
            Connecting if signals.connect_exhausted => RadioOff,
            Connecting => Connecting,
            OnlineIdle | OnlineSyncing | MaintenanceOnline if signals.session_up => {
                MaintenanceOnline
            }
            OnlineIdle | OnlineSyncing | MaintenanceOnline => Connecting,
        };
    }

    match state {
        RadioOff if signals.wants_connection() => Connecting,
        RadioOff => RadioOff,
        Connecting if signals.session_up => online(signals),
        Connecting if signals.connect_exhausted => RadioOff,
        Connecting => Connecting,
        OnlineIdle | OnlineSyncing | MaintenanceOnline => {
            if signals.may_rest() {
                RadioOff
            } else if !signals.session_up {
                Connecting
            } else {
                online(signals)
            }
        }
    }
}

fn online(signals: &Signals) -> ConnectivityState {
    if signals.buffer_empty {
        ConnectivityState::OnlineIdle
    } else {
        ConnectivityState::OnlineSyncing
    }
}

/// Bounded connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectAttempt {
    budget: u8,
    attempts: u8,
}

impl ConnectAttempt {
    /// Fresh attempt allowed `budget` polls (at least one)
    pub fn new(budget: u8) -> Self {
        Self { budget: budget.max(1), attempts: 0 }
    }

    /// Polls spent so far
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// No polls left
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.budget
    }

    /// Spend one poll
    ///
    /// Checks the link, then performs the broker handshake and subscribes to
    /// `command_topic`. A failed subscribe is logged and does not fail the
    /// attempt.
    pub fn poll<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        client_id: &str,
        command_topic: &str,
    ) -> nb::Result<(), ConnectError> {
        if self.is_exhausted() {
            return Err(nb::Error::Other(ConnectError::RetryBudgetExhausted {
                attempts: self.attempts,
            }));
        }
        self.attempts += 1;

        if transport.is_connected() {
            return Ok(());
        }

        if transport.link_up() {
            match transport.connect(client_id) {
                Ok(()) => {
                    log_info!("Broker session up as {} after {} polls", client_id, self.attempts);
                    if let Err(_e) = transport.subscribe(command_topic) {
                        log_warn!("Subscribe to {} failed: {}", command_topic, _e);
                    }
                    return Ok(());
                }
                Err(_e) => log_debug!("Handshake poll {} failed: {}", self.attempts, _e),
            }
        }

        if self.is_exhausted() {
            Err(nb::Error::Other(ConnectError::RetryBudgetExhausted { attempts: self.attempts }))
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

/// Demands the engine places on the controller for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Demands {
    /// Shutdown requested remotely
    pub shutdown: bool,
    /// Maintenance mode active
    pub maintenance: bool,
    /// Buffer above the pressure threshold
    pub buffer_pressure: bool,
    /// Actionable emergency this tick
    pub emergency: bool,
    /// Forced sync pending
    pub forced_sync: bool,
    /// Offline buffer empty
    pub buffer_empty: bool,
}

/// Session identity used for connect attempts
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    /// Broker client id
    pub client_id: &'a str,
    /// Topic to subscribe on every fresh handshake
    pub command_topic: &'a str,
}

/// Stateful controller wrapped around [`transition`]
///
/// Owns the connectivity state, the in-flight connect attempt and the
/// `last_activity` / `last_sync_attempt` timers.
#[derive(Debug, Clone)]
pub struct ConnectivityController {
    state: ConnectivityState,
    attempt: ConnectAttempt,
    budget: u8,
    sync_interval: MillisDurationU64,
    idle_grace: MillisDurationU64,
    last_activity: Timestamp,
    last_sync_attempt: Timestamp,
}

impl ConnectivityController {
    /// Controller starting in `RadioOff` with timers anchored at `boot`
    pub fn new(sync_interval: MillisDurationU64, boot: Timestamp) -> Self {
        Self {
            state: ConnectivityState::RadioOff,
            attempt: ConnectAttempt::new(CONNECT_ATTEMPT_BUDGET),
            budget: CONNECT_ATTEMPT_BUDGET,
            sync_interval,
            idle_grace: MillisDurationU64::millis(IDLE_POWER_DOWN_GRACE_MS),
            last_activity: boot,
            last_sync_attempt: boot,
        }
    }

    /// Override the connect poll budget
    pub fn with_connect_budget(mut self, budget: u8) -> Self {
        self.budget = budget.max(1);
        self.attempt = ConnectAttempt::new(self.budget);
        self
    }

    /// Current state
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Polls spent by the current connect attempt
    pub fn connect_attempts(&self) -> u8 {
        self.attempt.attempts()
    }

    /// Last radio/session activity
    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Last sync attempt
    pub fn last_sync_attempt(&self) -> Timestamp {
        self.last_sync_attempt
    }

    /// Scheduled sync due at `now`
    pub fn sync_due(&self, now: Timestamp) -> bool {
        has_elapsed(now, self.last_sync_attempt, self.sync_interval)
    }

    /// A publish went out
    pub fn record_activity(&mut self, now: Timestamp) {
        self.last_activity = now;
    }

    /// A drain finished, fully or not
    pub fn record_sync(&mut self, now: Timestamp) {
        self.last_sync_attempt = now;
        self.last_activity = now;
    }

    /// Run one controller tick and return the resulting state
    pub fn step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        session: Session<'_>,
        demands: Demands,
        now: Timestamp,
    ) -> ConnectivityState {
        let (session_up, connect_exhausted) =
            if self.state == ConnectivityState::Connecting && !demands.shutdown {
                match self.attempt.poll(transport, session.client_id, session.command_topic) {
                    Ok(()) => (true, false),
                    Err(nb::Error::WouldBlock) => (false, false),
                    Err(nb::Error::Other(_e)) => {
                        log_warn!("{}", _e);
                        (false, true)
                    }
                }
            } else {
                (transport.is_connected(), false)
            };

        let signals = Signals {
            shutdown_requested: demands.shutdown,
            maintenance_requested: demands.maintenance,
            sync_due: self.sync_due(now),
            buffer_pressure: demands.buffer_pressure,
            emergency: demands.emergency,
            forced_sync: demands.forced_sync,
            session_up,
            connect_exhausted,
            buffer_empty: demands.buffer_empty,
            idle_elapsed: has_elapsed(now, self.last_activity, self.idle_grace),
        };

        let next = transition(self.state, &signals);
        if next != self.state {
            self.enter(next, transport, &signals, now);
        }
        next
    }

    fn enter<T: Transport + ?Sized>(
        &mut self,
        next: ConnectivityState,
        transport: &mut T,
        signals: &Signals,
        now: Timestamp,
    ) {
        let previous = self.state;
        log_info!("Connectivity {} -> {}", previous, next);

        match next {
            ConnectivityState::RadioOff => {
                transport.disconnect();
                transport.radio_off();
                // Scheduled sync waits a full interval before trying again,
                // and an empty session going down counts as synced
                if signals.connect_exhausted || (previous.is_online() && signals.buffer_empty) {
                    self.last_sync_attempt = now;
                }
            }
            ConnectivityState::Connecting => {
                if previous == ConnectivityState::RadioOff {
                    transport.radio_on();
                    self.last_activity = now;
                }
                self.attempt = ConnectAttempt::new(self.budget);
            }
            ConnectivityState::OnlineIdle
            | ConnectivityState::OnlineSyncing
            | ConnectivityState::MaintenanceOnline => {
                if previous == ConnectivityState::Connecting {
                    self.last_activity = now;
                    self.last_sync_attempt = now;
                }
            }
        }
        self.state = next;
    }
}
