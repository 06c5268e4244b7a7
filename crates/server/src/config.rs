//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! the `SCADA_ADDR` environment variable, then command-line overrides applied
//! by the binary. `validate` runs last.

use scada_kernel::SimParams;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ADDR_ENV: &str = "SCADA_ADDR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid SCADA_ADDR value {0:?}")]
    BadAddr(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Wall-clock period of one simulation tick.
    pub tick_interval_ms: u64,
    /// Vehicle speed in map units per second.
    pub speed: f64,
    /// Fixed seed for a reproducible run; random when absent.
    pub seed: Option<u64>,
    /// Layout file; the built-in floor when absent.
    pub layout: Option<PathBuf>,
    /// Number of recent events kept for `/events`.
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            tick_interval_ms: 100,
            speed: 40.0,
            seed: None,
            layout: None,
            event_capacity: 1024,
        }
    }
}

impl ServerConfig {
    /// Read a YAML config file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `SCADA_ADDR` if set and non-blank.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(raw) = std::env::var(ADDR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::BadAddr(raw.clone()))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be positive".into(),
            ));
        }
        self.sim_params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Simulation parameters; one tick covers exactly one tick interval.
    pub fn sim_params(&self) -> SimParams {
        SimParams {
            speed: self.speed,
            tick_seconds: self.tick_interval_ms as f64 / 1000.0,
            ..SimParams::default()
        }
    }

    /// The configured seed, or a fresh random one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
