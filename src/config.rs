use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "PERF_MONITOR_CONFIG";
pub const POLL_SECS_ENV: &str = "PERF_MONITOR_POLL_SECS";

const MIN_POLL_SECS: u64 = 1;
const MAX_POLL_SECS: u64 = 3600;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
        }
    }
}

impl Config {
    /// Reads the file named by `PERF_MONITOR_CONFIG`, then applies
    /// `PERF_MONITOR_POLL_SECS`. Falls back to defaults on any error.
    pub fn load() -> Self {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(&path).unwrap_or_else(|err| {
                log::warn!(
                    "ignoring config {}: {err}",
                    Path::new(&path).display()
                );
                Self::default()
            }),
            None => Self::default(),
        };

        if let Ok(secs) = std::env::var(POLL_SECS_ENV) {
            match secs.trim().parse::<u64>() {
                Ok(secs) => config.poll_interval_secs = secs,
                Err(_) => log::warn!("ignoring {POLL_SECS_ENV}={secs:?}"),
            }
        }

        config.clamped()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.clamped())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.clamp(MIN_POLL_SECS, MAX_POLL_SECS))
    }

    fn clamped(mut self) -> Self {
        self.poll_interval_secs = self.poll_interval_secs.clamp(MIN_POLL_SECS, MAX_POLL_SECS);
        self
    }
}
