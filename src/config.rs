//! Driver configuration parameters
//!
//! Timing knobs for the command state machine and the scan cooldown.
//! Values are fixed for the lifetime of a driver; individual commands
//! cannot override them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    // --- Command lifecycle ---
    /// How long to wait for a status notification after a write (milliseconds)
    pub command_timeout_ms: u32,
    /// Sleep between completion polls in synchronous mode (milliseconds)
    pub sync_poll_interval_ms: u32,

    // --- Discovery ---
    /// Cooldown after a connection teardown before scanning may resume (milliseconds)
    pub scan_interval_ms: u32,

    // --- Diagnostics ---
    /// Warn when this many transport events are waiting at drain time
    pub inbox_warn_depth: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 5_000,    // thermostat answers in ~100 ms
            sync_poll_interval_ms: 10,
            scan_interval_ms: 60_000,     // 1/min
            inbox_warn_depth: 8,
        }
    }
}

impl DriverConfig {
    /// Reject values the state machine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_ms == 0 {
            return Err(Error::Config("command_timeout_ms must be > 0"));
        }
        if self.sync_poll_interval_ms == 0 {
            return Err(Error::Config("sync_poll_interval_ms must be > 0"));
        }
        if self.sync_poll_interval_ms >= self.command_timeout_ms {
            return Err(Error::Config(
                "sync_poll_interval_ms must be below command_timeout_ms",
            ));
        }
        if self.scan_interval_ms == 0 {
            return Err(Error::Config("scan_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Parse a JSON document (missing fields take defaults) and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }
}
