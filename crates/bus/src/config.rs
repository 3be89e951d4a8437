// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus configuration
//!
//! Loaded from TOML, optionally overridden by `EVT_BUS_*` environment
//! variables:
//!
//! ```toml
//! capacity = 1024
//! workers = 1
//! backpressure = "drop-oldest"
//! block_timeout = "5s"
//! drain_timeout = "10s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default queue capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// What `publish` does when the queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackpressurePolicy {
    /// Fail the publish with `QueueFull`
    #[default]
    Reject,
    /// Evict the queue head and admit the new envelope
    DropOldest,
    /// Wait for space up to `block_timeout`, then fail with `QueueFull`
    Block,
}

impl FromStr for BackpressurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "drop-oldest" | "drop_oldest" => Ok(Self::DropOldest),
            "block" => Ok(Self::Block),
            other => Err(format!("unknown backpressure policy: {other}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

/// Runtime settings for one bus instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Maximum queued envelopes
    pub capacity: usize,
    /// Worker tasks draining the queue.
    ///
    /// With one worker every handler sees envelopes in publish order, and a
    /// slow handler delays the handlers after it as well as later envelopes.
    /// With more than one, envelopes are dispatched concurrently and
    /// deliveries to different handlers (or the same handler) may interleave.
    pub workers: usize,
    pub backpressure: BackpressurePolicy,
    /// How long a blocked publish waits for space
    #[serde(with = "humantime_serde")]
    pub block_timeout: Duration,
    /// Default drain window for shutdown
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            workers: 1,
            backpressure: BackpressurePolicy::Reject,
            block_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(10),
        }
    }
}

impl BusConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|var| std::env::var(var).ok())
    }

    /// Apply `EVT_BUS_*` overrides using `lookup` to read variables
    pub fn apply_env_with(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("EVT_BUS_CAPACITY") {
            self.capacity = parse_env("EVT_BUS_CAPACITY", value, |v| v.parse().ok())?;
        }
        if let Some(value) = lookup("EVT_BUS_WORKERS") {
            self.workers = parse_env("EVT_BUS_WORKERS", value, |v| v.parse().ok())?;
        }
        if let Some(value) = lookup("EVT_BUS_BACKPRESSURE") {
            self.backpressure = parse_env("EVT_BUS_BACKPRESSURE", value, |v| v.parse().ok())?;
        }
        if let Some(value) = lookup("EVT_BUS_BLOCK_TIMEOUT") {
            self.block_timeout = parse_env("EVT_BUS_BLOCK_TIMEOUT", value, |v| {
                humantime::parse_duration(v).ok()
            })?;
        }
        if let Some(value) = lookup("EVT_BUS_DRAIN_TIMEOUT") {
            self.drain_timeout = parse_env("EVT_BUS_DRAIN_TIMEOUT", value, |v| {
                humantime::parse_duration(v).ok()
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        Ok(())
    }
}

pub(crate) fn parse_env<T>(
    var: &'static str,
    value: String,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parse(value.trim()).ok_or(ConfigError::Env { var, value })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
