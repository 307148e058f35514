use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn default_scan_interval_secs() -> u64 {
    180
}

/// Configuration for the ecobee integration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Thermostat document in the vendor's summary shape
    pub snapshot: PathBuf,

    /// Hold new setpoints indefinitely instead of until the next scheduled event
    #[serde(default)]
    pub hold_temp: bool,

    /// Seconds between polls (default: 180, the vendor's minimum)
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

impl Config {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }
}
