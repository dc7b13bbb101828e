//! Server configuration.
//!
//! Read from a YAML file, `/etc/nfv-test-api.yaml` by default. Every key is
//! optional:
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! command_timeout_secs: 10
//! hostname_for_dns_lookup: example.com
//! connection_config:
//!   timeout_dns_lookup_in_ms: 2000
//! iperf3_server: 10.0.0.5
//! duration_bandwidth_test_in_sec: 5
//! ran:
//!   gnb_config_folder: /etc/ueransim
//!   srsenb_bin: /usr/local/bin/srsenb
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actions::ActionSettings;
use crate::error::{Error, Result};
use crate::types::Hostname;

/// Path read when no config file is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nfv-test-api.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Budget for each `ip` command.
    pub command_timeout_secs: u64,
    /// Name resolved by DNS lookups that do not give one.
    pub hostname_for_dns_lookup: String,
    pub connection_config: ConnectionConfig,
    /// Default iperf3 server for bandwidth tests.
    pub iperf3_server: Option<String>,
    pub duration_bandwidth_test_in_sec: u64,
    pub ran: RanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            command_timeout_secs: 10,
            hostname_for_dns_lookup: "example.com".to_string(),
            connection_config: ConnectionConfig::default(),
            iperf3_server: None,
            duration_bandwidth_test_in_sec: 5,
            ran: RanConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub timeout_dns_lookup_in_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_dns_lookup_in_ms: 2000,
        }
    }
}

/// Folders, templates and binaries of the simulator nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RanConfig {
    pub gnb_config_folder: PathBuf,
    pub gnb_log_folder: PathBuf,
    pub ue_config_folder: PathBuf,
    pub ue_log_folder: PathBuf,
    pub enb_config_folder: PathBuf,
    pub enb_log_folder: PathBuf,
    pub ue_4g_config_folder: PathBuf,
    pub ue_4g_log_folder: PathBuf,
    pub enb_template: PathBuf,
    pub ue_4g_template: PathBuf,
    pub nr_gnb_bin: String,
    pub nr_ue_bin: String,
    pub nr_cli_bin: String,
    pub srsenb_bin: String,
    pub srsue_bin: String,
}

impl Default for RanConfig {
    fn default() -> Self {
        Self {
            gnb_config_folder: "/etc/ueransim".into(),
            gnb_log_folder: "/var/log/ueransim".into(),
            ue_config_folder: "/etc/ueransim".into(),
            ue_log_folder: "/var/log/ueransim".into(),
            enb_config_folder: "/etc/srsran".into(),
            enb_log_folder: "/var/log/srsran".into(),
            ue_4g_config_folder: "/etc/srsran".into(),
            ue_4g_log_folder: "/var/log/srsran".into(),
            enb_template: "/etc/srsran/enb_template.conf".into(),
            ue_4g_template: "/etc/srsran/ue_template.conf".into(),
            nr_gnb_bin: "nr-gnb".into(),
            nr_ue_bin: "nr-ue".into(),
            nr_cli_bin: "nr-cli".into(),
            srsenb_bin: "/srsRAN_4G/build/srsenb/src/srsenb".into(),
            srsue_bin: "/srsRAN_4G/build/srsue/src/srsue".into(),
        }
    }
}

impl Config {
    /// Parse a config from YAML text. An empty document gives the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", path.display(), e),
            ))
        })?;
        Self::from_yaml(&text)
    }

    /// Load `path`, or the default path if it exists, or fall back to defaults.
    ///
    /// An explicit path must exist. A missing default file is only logged.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => {
                tracing::warn!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::InvalidInput("port must not be 0".into()));
        }
        if self.command_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "command_timeout_secs must not be 0".into(),
            ));
        }
        if self.connection_config.timeout_dns_lookup_in_ms == 0 {
            return Err(Error::InvalidInput(
                "connection_config.timeout_dns_lookup_in_ms must not be 0".into(),
            ));
        }
        if self.duration_bandwidth_test_in_sec == 0 {
            return Err(Error::InvalidInput(
                "duration_bandwidth_test_in_sec must not be 0".into(),
            ));
        }
        Hostname::new(self.hostname_for_dns_lookup.as_str())?;
        Ok(())
    }

    /// `host:port` to listen on.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn action_settings(&self) -> ActionSettings {
        ActionSettings {
            dns_hostname: self.hostname_for_dns_lookup.clone(),
            dns_timeout: Duration::from_millis(self.connection_config.timeout_dns_lookup_in_ms),
            iperf3_server: self.iperf3_server.clone(),
            bandwidth_duration: Duration::from_secs(self.duration_bandwidth_test_in_sec),
        }
    }
}
