//! Topic Layout and Payload Literals
//!
//! Shared with the collector backend; changing any of these breaks ingestion.

/// Default topic namespace.
pub const DEFAULT_TOPIC_NAMESPACE: &str = "vasafe";

/// Last topic segment for outbound samples.
pub const TELEMETRY_TOPIC_SUFFIX: &str = "telemetry";

/// Last topic segment for inbound commands.
pub const COMMAND_TOPIC_SUFFIX: &str = "command";

/// `alerta` value while an emergency is active.
pub const ALERT_CRITICAL_EVENT: &str = "EVENTO_CRITICO";

/// `tipo` value for samples recorded under a forced sync.
pub const KIND_MANUAL_SYNC: &str = "SYNC_MANUAL";

/// `modo` value for samples recorded in maintenance mode.
pub const MODE_MAINTENANCE: &str = "MANUTENCAO";

/// Remote status text shown before the collector sends one.
pub const INITIAL_STATUS_TEXT: &str = "AGUARDANDO";

/// Defaults the key-value store hands out for missing keys.
pub const DEFAULT_BROKER_HOST: &str = "0.0.0.0";
/// Default broker port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;
/// Default device id.
pub const DEFAULT_DEVICE_ID: &str = "box_01";
