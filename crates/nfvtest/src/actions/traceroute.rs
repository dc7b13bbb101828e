//! `traceroute` in numeric mode.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ActionsService;
use crate::error::{Error, Result};
use crate::types::ping::validate_destination;

const MAX_HOPS_LIMIT: u8 = 64;

/// Request to trace the path to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerouteRequest {
    pub destination: String,
    /// Seconds to wait for each probe (`traceroute -w`).
    #[serde(default = "default_wait")]
    pub wait: u32,
    #[serde(default = "default_max_hops")]
    pub max_hops: u8,
}

fn default_wait() -> u32 {
    2
}

fn default_max_hops() -> u8 {
    30
}

impl TracerouteRequest {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            wait: default_wait(),
            max_hops: default_max_hops(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_destination(&self.destination)?;
        if self.wait == 0 {
            return Err(Error::InvalidInput("wait must be at least 1 second".into()));
        }
        if self.max_hops == 0 || self.max_hops > MAX_HOPS_LIMIT {
            return Err(Error::InvalidInput(format!(
                "max_hops must be between 1 and {}",
                MAX_HOPS_LIMIT
            )));
        }
        Ok(())
    }

    /// Worst case run time: three unanswered probes per hop.
    fn budget(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_hops) * u64::from(self.wait) * 3 + 2)
    }
}

/// One line of traceroute output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub hop: u8,
    /// First address that answered, `None` when every probe timed out.
    pub address: Option<IpAddr>,
    pub rtts_ms: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traceroute {
    pub destination: String,
    pub destination_ip: Option<IpAddr>,
    pub hops: Vec<Hop>,
}

impl ActionsService {
    pub async fn traceroute(&self, req: &TracerouteRequest) -> Result<Traceroute> {
        req.validate()?;

        let argv = vec![
            "traceroute".to_string(),
            "-n".to_string(),
            "-w".to_string(),
            req.wait.to_string(),
            "-m".to_string(),
            req.max_hops.to_string(),
            req.destination.clone(),
        ];
        let output = self.host.exec_with_timeout(&argv, req.budget()).await?;

        if output.stdout.trim().is_empty() || !output.success() {
            return Err(Error::command_failed(
                &self.host.command_line(&argv),
                output.stderr,
            ));
        }

        parse_traceroute(&req.destination, &output.stdout)
    }
}

/// Parse numeric (`-n`) traceroute output.
pub fn parse_traceroute(destination: &str, stdout: &str) -> Result<Traceroute> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| Error::Parse("empty traceroute output".into()))?;
    if !header.starts_with("traceroute to ") {
        return Err(Error::Parse(format!("unexpected traceroute header {:?}", header)));
    }
    let destination_ip = header
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .and_then(|(ip, _)| ip.parse().ok());

    let mut hops = Vec::new();
    for line in lines {
        let mut tokens = line.split_whitespace().peekable();
        let Some(hop) = tokens.next().and_then(|t| t.parse::<u8>().ok()) else {
            tracing::debug!(line, "skipping traceroute line");
            continue;
        };

        let mut address = None;
        let mut rtts_ms = Vec::new();
        while let Some(token) = tokens.next() {
            if let Ok(ip) = token.parse::<IpAddr>() {
                address.get_or_insert(ip);
            } else if let Ok(rtt) = token.parse::<f64>()
                && tokens.peek() == Some(&"ms")
            {
                rtts_ms.push(rtt);
                tokens.next();
            }
        }
        hops.push(Hop {
            hop,
            address,
            rtts_ms,
        });
    }

    Ok(Traceroute {
        destination: destination.to_string(),
        destination_ip,
        hops,
    })
}
