// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline configuration loaded from `trib.toml`

use crate::join::JoinConfig;
use crate::record::StartPosition;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("unsupported broker address: {0} (expected file:///path or a directory)")]
    UnsupportedBroker(String),
}

/// Where a pipeline starts when it has no checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetPolicy {
    #[default]
    Earliest,
    Latest,
}

impl OffsetPolicy {
    pub fn start_position(self) -> StartPosition {
        match self {
            OffsetPolicy::Earliest => StartPosition::Earliest,
            OffsetPolicy::Latest => StartPosition::Latest,
        }
    }
}

/// Resolved broker endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerAddress {
    /// Directory-backed log store
    File(PathBuf),
}

/// Topic names used by the bundled pipelines
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicNames {
    pub stations: String,
    pub stations_table: String,
    pub stations_changelog: String,
    pub redis_server: String,
    pub stedi_events: String,
    pub risk_output: String,
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            stations: "org.chicago.cta.stations".to_string(),
            stations_table: "transformed_stations".to_string(),
            stations_changelog: "org.chicago.cta.stations.table.v1".to_string(),
            redis_server: "redis-server".to_string(),
            stedi_events: "stedi-events".to_string(),
            risk_output: "risk-scores-and-birthdays".to_string(),
        }
    }
}

/// Pipeline driver configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub broker_address: String,
    pub starting_offset_policy: OffsetPolicy,
    pub checkpoint_store: PathBuf,
    /// `"none"` disables expiry
    #[serde(deserialize_with = "deserialize_retention")]
    pub join_retention_window: Option<Duration>,
    pub join_max_pending: Option<usize>,
    pub sink_retry_limit: u32,
    #[serde(with = "humantime_serde")]
    pub sink_retry_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub sink_retry_backoff_max: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_poll_interval: Duration,
    /// Partition of every input owned by this driver instance
    pub partition: u32,
    pub topics: TopicNames,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            broker_address: "file://./broker".to_string(),
            starting_offset_policy: OffsetPolicy::Earliest,
            checkpoint_store: PathBuf::from("./checkpoints"),
            join_retention_window: None,
            join_max_pending: None,
            sink_retry_limit: 5,
            sink_retry_backoff: Duration::from_millis(200),
            sink_retry_backoff_max: Duration::from_secs(5),
            idle_poll_interval: Duration::from_millis(250),
            partition: 0,
            topics: TopicNames::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text)
    }

    /// Parse and validate TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sink_retry_limit == 0 {
            return Err(ConfigError::Invalid(
                "sink_retry_limit must be at least 1".to_string(),
            ));
        }
        if self.join_max_pending == Some(0) {
            return Err(ConfigError::Invalid(
                "join_max_pending must be at least 1".to_string(),
            ));
        }
        self.broker()?;
        Ok(())
    }

    /// Resolve `broker_address`
    pub fn broker(&self) -> Result<BrokerAddress, ConfigError> {
        let address = self.broker_address.trim();
        if let Some(path) = address.strip_prefix("file://") {
            if path.is_empty() {
                return Err(ConfigError::UnsupportedBroker(address.to_string()));
            }
            return Ok(BrokerAddress::File(PathBuf::from(path)));
        }
        if address.is_empty() || address.contains("://") {
            return Err(ConfigError::UnsupportedBroker(address.to_string()));
        }
        Ok(BrokerAddress::File(PathBuf::from(address)))
    }

    pub fn join(&self) -> JoinConfig {
        JoinConfig {
            retention: self.join_retention_window,
            max_pending: self.join_max_pending,
        }
    }

    /// Resolve relative paths against `base` (the config file's directory)
    pub fn rebase(mut self, base: &Path) -> Self {
        if self.checkpoint_store.is_relative() {
            self.checkpoint_store = base.join(&self.checkpoint_store);
        }
        if let Ok(BrokerAddress::File(path)) = self.broker() {
            if path.is_relative() {
                self.broker_address = format!("file://{}", base.join(path).display());
            }
        }
        self
    }
}

fn deserialize_retention<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let text = text.trim();
    if text.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    humantime::parse_duration(text)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
