use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a deployment config file, kept distinct from the
/// generic `anyhow::Error` used at the process boundary so callers can
/// tell a missing file from a malformed one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Deployment configuration for the two socket addresses and the
/// ambient stack (logging, stats). The geofence polygon and the home
/// position are *not* here; they are compile-time policy constants
/// (see `policy::constants`), and operator configuration of the policy
/// itself is by recompilation, per spec.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// GCS-facing TCP server (the "VM" side).
    #[serde(default)]
    pub vm: VmConfig,

    /// PX4-facing TCP client.
    #[serde(default)]
    pub px4: Px4Config,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Stats logging interval in seconds (0 = disabled).
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VmConfig {
    /// Address the VM-facing server binds and listens on.
    #[serde(default = "default_vm_bind_addr")]
    pub bind_addr: String,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_vm_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Px4Config {
    /// Address the PX4-facing client connects to.
    #[serde(default = "default_px4_connect_addr")]
    pub connect_addr: String,
}

impl Default for Px4Config {
    fn default() -> Self {
        Self {
            connect_addr: default_px4_connect_addr(),
        }
    }
}

fn default_vm_bind_addr() -> String {
    "192.168.1.2:7000".to_string()
}

fn default_px4_connect_addr() -> String {
    "172.17.0.1:7000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_interval() -> u64 {
    30
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// The deployment's compiled-in defaults, matching spec.md §6.
    pub fn example() -> Self {
        Self {
            vm: VmConfig::default(),
            px4: Px4Config::default(),
            log_level: default_log_level(),
            stats_interval_secs: default_stats_interval(),
        }
    }
}
