// SPDX-License-Identifier: MIT

//! Daemon configuration (SPEC_FULL §9 design notes): a `toml`-based
//! `DaemonConfig` with a `[daq]` sub-table mirroring the original's
//! optional `daq` config node. Missing file → built-in defaults ("DAQ
//! config is optional; defaults will work just fine", `daq_control.cc`).

use daq_engine::Action;
use daq_files::ChannelMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn default_duration_ms() -> u64 {
    1000
}

fn default_startup_activation_delay_ms() -> u64 {
    250
}

fn default_restart_delay_ms() -> u64 {
    400
}

fn default_reactivate_delay_ms() -> u64 {
    50
}

fn default_file_root() -> PathBuf {
    PathBuf::from(".")
}

/// The `[daq]` sub-table: run-duration policy, startup behaviour, and the
/// channel metadata installed on every stream at `prepare_all` time (spec
/// §4.3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaqConfig {
    pub duration_ms: u64,
    pub activate_at_startup: bool,
    pub startup_activation_delay_ms: u64,
    pub restart_delay_ms: u64,
    pub reactivate_delay_ms: u64,
    pub use_monarch: bool,
    pub file_root: PathBuf,
    pub channels: Vec<ChannelMetadata>,
}

impl Default for DaqConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            activate_at_startup: false,
            startup_activation_delay_ms: default_startup_activation_delay_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            reactivate_delay_ms: default_reactivate_delay_ms(),
            use_monarch: false,
            file_root: default_file_root(),
            channels: Vec::new(),
        }
    }
}

/// Top-level daemon configuration. `presets` holds raw param trees handed
/// to `PresetRegistry::register` verbatim (spec §4.1); `active_preset` and
/// `node_configs` are the arguments to `StreamManager::configure` (spec
/// §4.2); `batch` is the scripted startup action list consumed by the
/// batch executor (spec §4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub daq: DaqConfig,
    pub presets: Vec<serde_json::Value>,
    pub active_preset: Option<String>,
    pub node_configs: HashMap<String, serde_json::Value>,
    pub batch: Vec<Action>,
}

impl DaemonConfig {
    /// Load from `path`. A missing file is not an error — it yields
    /// built-in defaults, matching the original's "DAQ config is
    /// optional" behaviour. A present-but-malformed file is reported via
    /// `Err` so the caller can decide whether to abort startup.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no daemon config file found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
