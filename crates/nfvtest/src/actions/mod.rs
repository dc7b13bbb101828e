//! One-shot network tools: ping, traceroute, DNS lookup and bandwidth test.
//!
//! Each action runs its tool on a [`Host`], so it can be aimed at the root
//! namespace or any named one, and parses the tool output into a record.

pub mod bandwidth;
pub mod dns;
pub mod ping;
pub mod traceroute;

pub use bandwidth::{Bandwidth, BandwidthRequest};
pub use dns::{DnsLookup, DnsLookupRequest};
pub use traceroute::{Hop, Traceroute, TracerouteRequest};

use std::time::Duration;

use crate::host::Host;

/// Defaults for actions whose requests may leave them out.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    /// Name resolved by a DNS lookup that does not give one.
    pub dns_hostname: String,
    /// Budget for a DNS lookup.
    pub dns_timeout: Duration,
    /// iperf3 server used when a bandwidth request does not give one.
    pub iperf3_server: Option<String>,
    /// Length of a bandwidth test.
    pub bandwidth_duration: Duration,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            dns_hostname: "example.com".to_string(),
            dns_timeout: Duration::from_millis(2000),
            iperf3_server: None,
            bandwidth_duration: Duration::from_secs(5),
        }
    }
}

/// Runs actions on one host.
#[derive(Debug, Clone)]
pub struct ActionsService {
    host: Host,
    settings: ActionSettings,
}

impl ActionsService {
    pub fn new(host: &Host, settings: ActionSettings) -> Self {
        Self {
            host: host.clone(),
            settings,
        }
    }

    pub fn settings(&self) -> &ActionSettings {
        &self.settings
    }
}
