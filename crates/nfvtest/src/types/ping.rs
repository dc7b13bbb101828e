//! Ping request and result records.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::common::{Hostname, SafeName};
use crate::error::{Error, Result};

/// Request to ping a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingRequest {
    /// Host name or IP address.
    pub destination: String,
    /// Source interface name or address (`ping -I`).
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Seconds between packets.
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Deadline in seconds (`ping -w`).
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

fn default_count() -> u32 {
    4
}

fn default_interval() -> f64 {
    0.5
}

fn default_timeout() -> u32 {
    8
}

impl PingRequest {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            interface: None,
            count: default_count(),
            interval: default_interval(),
            timeout: default_timeout(),
        }
    }

    /// Reject values that would let the request smuggle extra ping options.
    pub fn validate(&self) -> Result<()> {
        validate_destination(&self.destination)?;
        if let Some(iface) = &self.interface {
            let is_addr = iface.parse::<IpAddr>().is_ok()
                || iface.parse::<ipnet::IpNet>().is_ok();
            if !is_addr {
                SafeName::new(iface.as_str())?;
            }
        }
        if self.count == 0 {
            return Err(Error::InvalidInput("count must be at least 1".into()));
        }
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(Error::InvalidInput("interval must be a positive number".into()));
        }
        if self.timeout == 0 {
            return Err(Error::InvalidInput("timeout must be at least 1 second".into()));
        }
        Ok(())
    }
}

/// Accept a host name or an IP address.
pub(crate) fn validate_destination(destination: &str) -> Result<()> {
    if destination.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    Hostname::new(destination).map(|_| ())
}

/// Parsed ping statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub destination: String,
    pub packet_transmit: u32,
    pub packet_receive: u32,
    pub packet_loss_count: u32,
    /// Percent.
    pub packet_loss_rate: f64,
    pub packet_duplicate_count: u32,
    /// Percent of received packets, absent when nothing was received.
    pub packet_duplicate_rate: Option<f64>,
    pub rtt_min: Option<f64>,
    pub rtt_avg: Option<f64>,
    pub rtt_max: Option<f64>,
    pub rtt_mdev: Option<f64>,
}
