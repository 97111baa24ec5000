//! # Daemon Configuration
//!
//! Loaded from the `[daemon]` table of a TOML file. Every field has a
//! default, so an absent file or an empty table yields a usable setup.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use dlt_filter::{MessageFilter, TomlFilterConfig};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::DaemonError;

/// Longest readiness wait `poll(2)` accepts, in milliseconds.
pub const MAX_POLL_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Name of the built-in filter used without a filter configuration.
pub const BUILTIN_FILTER: &str = "Builtin";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Identifier of this ECU.
    pub ecu_id: String,
    /// TCP port log consumers connect to.
    pub port: u16,
    /// Addresses to listen on. Empty means the wildcard address.
    pub bind_addresses: Vec<IpAddr>,
    /// Unix socket applications connect to.
    pub app_socket: PathBuf,
    /// Unix socket control clients connect to.
    pub control_socket: PathBuf,
    pub serial_device: Option<PathBuf>,
    pub poll_timeout_ms: u64,
    /// Watchdog period; no watchdog timer when unset.
    pub watchdog_interval_secs: Option<u64>,
    pub filter_config: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            ecu_id: "ECU1".to_string(),
            port: 3490,
            bind_addresses: Vec::new(),
            app_socket: PathBuf::from("/tmp/dlt"),
            control_socket: PathBuf::from("/tmp/dlt-ctrl.sock"),
            serial_device: None,
            poll_timeout_ms: 1000,
            watchdog_interval_secs: None,
            filter_config: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    daemon: DaemonConfig,
}

impl DaemonConfig {
    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DaemonError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::parse(&contents)?;
        info!(path = %path.display(), "Loaded daemon configuration");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, DaemonError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| DaemonError::Config(e.to_string()))?;
        file.daemon.validate()?;
        Ok(file.daemon)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.poll_timeout_ms == 0 {
            return Err(DaemonError::Config("poll_timeout_ms must be positive".into()));
        }
        if self.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(DaemonError::Config(format!(
                "poll_timeout_ms must not exceed {MAX_POLL_TIMEOUT_MS}"
            )));
        }
        if self.watchdog_interval_secs == Some(0) {
            return Err(DaemonError::Config(
                "watchdog_interval_secs must be positive".into(),
            ));
        }
        if self.ecu_id.is_empty() || self.ecu_id.len() > 4 {
            return Err(DaemonError::Config(format!(
                "ecu_id '{}' must be 1 to 4 characters",
                self.ecu_id
            )));
        }
        Ok(())
    }

    /// Addresses the client listener binds to.
    pub fn listen_addresses(&self) -> Vec<IpAddr> {
        if self.bind_addresses.is_empty() {
            vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED)]
        } else {
            self.bind_addresses.clone()
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Build the message filter named by `filter_config`, or the permissive
    /// built-in one.
    pub fn load_filter(&self) -> Result<MessageFilter, DaemonError> {
        match &self.filter_config {
            Some(path) => {
                let provider = TomlFilterConfig::load(path)?;
                Ok(MessageFilter::from_provider(&provider)?)
            }
            None => {
                warn!("No filter configuration given, every connection is allowed");
                Ok(MessageFilter::permissive(BUILTIN_FILTER)?)
            }
        }
    }
}
