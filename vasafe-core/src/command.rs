//! Remote command handling
//!
//! Inbound messages on the command topic come in two encodings and both must
//! work:
//!
//! ```text
//! {"status_operacional":"APROVADO"}        -> SetStatus("APROVADO")
//! {"comando":"SYNC"}                       -> ForceSync
//! {"comando":"MANUTENCAO_ON"}              -> MaintenanceOn
//! please enter maintenance_off now         -> MaintenanceOff   (free text)
//! ```
//!
//! Parsing is pure. Parsed commands travel through a bounded single-consumer
//! [`CommandQueue`] that the engine drains exactly once per poll into
//! [`ModeFlags`], so no command is applied twice or lost between the moment
//! the broker delivers it and the tick that acts on it. Anything that does not
//! parse is dropped without touching state.

use alloc::string::String;

use heapless::{Deque, String as BoundedString, Vec as BoundedVec};
use serde::Deserialize;
use serde_json::Value;

use crate::constants::buffers::{COMMAND_QUEUE_DEPTH, STATUS_TEXT_CAPACITY};
use crate::constants::protocol::INITIAL_STATUS_TEXT;

/// Operator status text, truncated to a fixed capacity
pub type StatusText = BoundedString<STATUS_TEXT_CAPACITY>;

/// Keywords that switch maintenance mode off; checked before the "on" set
const MAINTENANCE_OFF_KEYWORDS: [&str; 2] = ["MANUTENCAO_OFF", "MAINTENANCE_OFF"];
const MAINTENANCE_ON_KEYWORDS: [&str; 2] = ["MANUTENCAO_ON", "MAINTENANCE_ON"];
const FORCE_SYNC_KEYWORD: &str = "SYNC";

/// A recognized remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the operator status text shown on the display
    SetStatus(StatusText),
    /// Connect and drain as soon as possible
    ForceSync,
    /// Stay online regardless of power-saving triggers
    MaintenanceOn,
    /// Leave maintenance mode and power down promptly
    MaintenanceOff,
}

/// Commands carried by one message (a JSON object may carry two)
pub type ParsedCommands = BoundedVec<Command, 2>;

#[derive(Deserialize)]
struct CommandDocument {
    #[serde(default)]
    status_operacional: Option<Value>,
    #[serde(default)]
    comando: Option<Value>,
}

/// Parse one inbound payload. Pure; unrecognized input yields nothing.
pub fn parse(payload: &[u8]) -> ParsedCommands {
    let mut commands = ParsedCommands::new();

    if let Ok(document) = serde_json::from_slice::<CommandDocument>(payload) {
        if let Some(Value::String(text)) = document.status_operacional {
            let _ = commands.push(Command::SetStatus(truncate_status(&text)));
        }
        if let Some(Value::String(keyword)) = document.comando {
            if let Some(command) = keyword_command(keyword.trim()) {
                let _ = commands.push(command);
            }
        }
        return commands;
    }

    if let Ok(text) = core::str::from_utf8(payload) {
        if let Some(command) = free_text_command(text) {
            let _ = commands.push(command);
        }
    }
    commands
}

fn keyword_command(keyword: &str) -> Option<Command> {
    let matches = |candidates: &[&str]| candidates.iter().any(|c| keyword.eq_ignore_ascii_case(c));
    if keyword.eq_ignore_ascii_case(FORCE_SYNC_KEYWORD) {
        Some(Command::ForceSync)
    } else if matches(&MAINTENANCE_ON_KEYWORDS) {
        Some(Command::MaintenanceOn)
    } else if matches(&MAINTENANCE_OFF_KEYWORDS) {
        Some(Command::MaintenanceOff)
    } else {
        None
    }
}

fn free_text_command(text: &str) -> Option<Command> {
    let upper: String = text.to_ascii_uppercase();
    if MAINTENANCE_OFF_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(Command::MaintenanceOff)
    } else if MAINTENANCE_ON_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(Command::MaintenanceOn)
    } else {
        None
    }
}

fn truncate_status(text: &str) -> StatusText {
    let mut status = StatusText::new();
    for c in text.chars() {
        if status.push(c).is_err() {
            break;
        }
    }
    status
}

/// Single-consumer queue between the command handler and the controller
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Deque<Command, COMMAND_QUEUE_DEPTH>,
}

impl CommandQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self { pending: Deque::new() }
    }

    /// Parse a payload and enqueue whatever it carries
    ///
    /// Returns how many commands were queued.
    pub fn ingest(&mut self, payload: &[u8]) -> usize {
        let commands = parse(payload);
        if commands.is_empty() {
            log_debug!("Ignoring unrecognized command payload ({} bytes)", payload.len());
        }
        commands.into_iter().filter(|command| self.push(command.clone())).count()
    }

    /// Enqueue one command; a full queue drops it
    pub fn push(&mut self, command: Command) -> bool {
        match self.pending.push_back(command) {
            Ok(()) => true,
            Err(_dropped) => {
                log_warn!("Command queue full, dropping {:?}", _dropped);
                false
            }
        }
    }

    /// Take the oldest pending command
    pub fn pop(&mut self) -> Option<Command> {
        self.pending.pop_front()
    }

    /// Pending command count
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Nothing pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Mode state the commands act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeFlags {
    /// Sync requested remotely; cleared only by a drain that empties the buffer
    pub forced_sync_requested: bool,
    /// Maintenance override active
    pub maintenance_mode: bool,
    /// Power down on the next controller step, whatever else is pending
    pub shutdown_requested: bool,
    /// Text from the collector for the display
    pub remote_status_text: StatusText,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            forced_sync_requested: false,
            maintenance_mode: false,
            shutdown_requested: false,
            remote_status_text: truncate_status(INITIAL_STATUS_TEXT),
        }
    }
}

impl ModeFlags {
    /// Apply one command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SetStatus(text) => {
                log_info!("Remote status: {}", text.as_str());
                self.remote_status_text = text;
            }
            Command::ForceSync => {
                log_info!("Remote sync requested");
                self.forced_sync_requested = true;
            }
            Command::MaintenanceOn => {
                log_info!("Maintenance mode on");
                self.maintenance_mode = true;
            }
            Command::MaintenanceOff => {
                log_info!("Maintenance mode off, shutting radio down");
                self.maintenance_mode = false;
                self.shutdown_requested = true;
            }
        }
    }

    /// Apply everything queued, oldest first
    pub fn apply_all(&mut self, queue: &mut CommandQueue) {
        while let Some(command) = queue.pop() {
            self.apply(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(payload: &str) -> Option<Command> {
        let commands = parse(payload.as_bytes());
        assert!(commands.len() <= 1, "expected at most one command from {:?}", payload);
        commands.first().cloned()
    }

    #[test]
    fn json_status() {
        let command = single(r#"{"status_operacional":"APROVADO"}"#).unwrap();
        assert_eq!(command, Command::SetStatus(truncate_status("APROVADO")));
    }

    #[test]
    fn json_commands() {
        assert_eq!(single(r#"{"comando":"SYNC"}"#), Some(Command::ForceSync));
        assert_eq!(single(r#"{"comando":"sync"}"#), Some(Command::ForceSync));
        assert_eq!(single(r#"{"comando":"MANUTENCAO_ON"}"#), Some(Command::MaintenanceOn));
        assert_eq!(single(r#"{"comando":"maintenance_off"}"#), Some(Command::MaintenanceOff));
    }

    #[test]
    fn json_with_both_keys() {
        let commands = parse(br#"{"status_operacional":"ALERTA","comando":"SYNC"}"#);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], Command::ForceSync);
    }

    #[test]
    fn free_text_maintenance() {
        assert_eq!(single("enter manutencao_on please"), Some(Command::MaintenanceOn));
        assert_eq!(single("MAINTENANCE_OFF"), Some(Command::MaintenanceOff));
    }

    #[test]
    fn malformed_payloads_are_ignored() {
        for payload in [
            "",
            "hello",
            "{",
            r#"{"comando":42}"#,
            r#"{"comando":"REBOOT"}"#,
            r#"{"status_operacional":null}"#,
            r#"{"other":"SYNC"}"#,
            "[1,2,3]",
        ] {
            assert!(parse(payload.as_bytes()).is_empty(), "payload {:?}", payload);
        }
        assert!(parse(&[0xff, 0xfe, 0x00]).is_empty());
    }

    #[test]
    fn long_status_is_truncated() {
        let long = "X".repeat(100);
        let payload = alloc::format!(r#"{{"status_operacional":"{}"}}"#, long);
        match single(&payload) {
            Some(Command::SetStatus(text)) => assert_eq!(text.len(), STATUS_TEXT_CAPACITY),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn queue_is_bounded_and_fifo() {
        let mut queue = CommandQueue::new();
        for _ in 0..COMMAND_QUEUE_DEPTH {
            assert!(queue.push(Command::ForceSync));
        }
        assert!(!queue.push(Command::MaintenanceOn));
        assert_eq!(queue.len(), COMMAND_QUEUE_DEPTH);
        assert_eq!(queue.pop(), Some(Command::ForceSync));
    }

    #[test]
    fn maintenance_off_raises_shutdown() {
        let mut flags = ModeFlags::default();
        let mut queue = CommandQueue::new();
        queue.ingest(br#"{"comando":"MANUTENCAO_ON"}"#);
        queue.ingest(b"MANUTENCAO_OFF");
        flags.apply_all(&mut queue);

        assert!(!flags.maintenance_mode);
        assert!(flags.shutdown_requested);
        assert!(queue.is_empty());
    }

    #[test]
    fn status_defaults_to_waiting() {
        assert_eq!(ModeFlags::default().remote_status_text.as_str(), "AGUARDANDO");
    }
}
