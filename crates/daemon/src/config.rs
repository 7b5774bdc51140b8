// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static bootstrap configuration (spec AMBIENT STACK): socket path,
//! persistence directory, log level, checkpoint interval. Loaded once at
//! startup from a TOML file; nothing here is mutated at runtime — that's
//! what `Manager::node_setting` and friends are for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

fn default_socket_path() -> PathBuf {
    PathBuf::from("/run/gatewayd/gateway.sock")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/gatewayd")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_checkpoint_interval_secs() -> u64 {
    60
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            checkpoint_interval_secs: default_checkpoint_interval_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
