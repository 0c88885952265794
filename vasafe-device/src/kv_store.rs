//! Persistent configuration store
//!
//! Keeps the raw configuration record as a JSON object of strings in
//! `<CONFIG_DIR>/vasafe_cfg.json`. Environment variables stand in for the
//! captive portal: any `VASAFE_*` value that differs from the stored one
//! replaces it and the record is written back.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use vasafe_core::ConfigInputs;

const CONFIG_FILE: &str = "vasafe_cfg.json";

/// Environment overrides, keyed by the field they replace
const OVERRIDES: [(&str, Field); 5] = [
    ("VASAFE_SERVER", Field::BrokerHost),
    ("VASAFE_PORT", Field::BrokerPort),
    ("VASAFE_BOXID", Field::DeviceId),
    ("VASAFE_DURATION", Field::TripDuration),
    ("VASAFE_SYNC_MIN", Field::SyncPeriod),
];

#[derive(Debug, Clone, Copy)]
enum Field {
    BrokerHost,
    BrokerPort,
    DeviceId,
    TripDuration,
    SyncPeriod,
}

impl Field {
    fn slot(self, inputs: &mut ConfigInputs) -> &mut String {
        match self {
            Field::BrokerHost => &mut inputs.broker_host,
            Field::BrokerPort => &mut inputs.broker_port,
            Field::DeviceId => &mut inputs.device_id,
            Field::TripDuration => &mut inputs.trip_duration_hours,
            Field::SyncPeriod => &mut inputs.sync_period_minutes,
        }
    }
}

/// JSON file holding [`ConfigInputs`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store under `$CONFIG_DIR`, or the working directory when unset
    pub fn from_env() -> Self {
        let dir = env::var("CONFIG_DIR").unwrap_or_else(|_| ".".to_string());
        Self::in_dir(dir)
    }

    /// Store under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(CONFIG_FILE) }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record; `None` when nothing was ever saved
    pub fn load(&self) -> Result<Option<ConfigInputs>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let inputs = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(inputs))
    }

    /// Persist the record
    pub fn save(&self, inputs: &ConfigInputs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(inputs)?;
        let mut file = fs::File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Forget the stored record
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", self.path.display()))
            }
            _ => Ok(()),
        }
    }

    /// Boot-time load: stored record, environment overrides on top, persisted
    /// again when anything changed or nothing was stored yet
    pub fn load_or_init(&self) -> Result<ConfigInputs> {
        self.load_with(|key| env::var(key).ok())
    }

    fn load_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ConfigInputs> {
        let (mut inputs, stored) = match self.load() {
            Ok(Some(inputs)) => (inputs, true),
            Ok(None) => (ConfigInputs::default(), false),
            Err(e) => {
                warn!("Stored configuration unusable ({:#}), starting from defaults", e);
                (ConfigInputs::default(), false)
            }
        };

        let changed = apply_overrides(&mut inputs, lookup);
        if changed || !stored {
            self.save(&inputs)?;
            info!("Configuration saved to {}", self.path.display());
        }
        Ok(inputs)
    }
}

/// Apply every override `lookup` knows about; true when a value changed
fn apply_overrides(inputs: &mut ConfigInputs, lookup: impl Fn(&str) -> Option<String>) -> bool {
    let mut changed = false;
    for (key, field) in OVERRIDES {
        if let Some(value) = lookup(key) {
            let slot = field.slot(inputs);
            if *slot != value {
                info!("{} overrides stored value", key);
                *slot = value;
                changed = true;
            }
        }
    }
    changed
}
