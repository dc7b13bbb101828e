//! A-record lookups through `dig`.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::ActionsService;
use crate::error::{Error, Result};
use crate::types::Hostname;

/// Resolve a name against a given DNS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsLookupRequest {
    pub dns_server: IpAddr,
    /// Name to resolve, the configured lookup hostname when absent.
    #[serde(default)]
    pub hostname: Option<Hostname>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsLookup {
    pub dns_server: IpAddr,
    pub hostname: String,
    /// Answer section lines, one per record.
    pub a_records: Vec<String>,
    pub query_time_msec: Option<u64>,
}

impl ActionsService {
    pub async fn dns_lookup(&self, req: &DnsLookupRequest) -> Result<DnsLookup> {
        let hostname = match &req.hostname {
            Some(name) => name.as_str().to_string(),
            None => self.settings.dns_hostname.clone(),
        };

        let argv = vec![
            "dig".to_string(),
            format!("@{}", req.dns_server),
            "+noall".to_string(),
            "+answer".to_string(),
            "+stats".to_string(),
            hostname.clone(),
            "A".to_string(),
        ];
        let output = self
            .host
            .exec_with_timeout(&argv, self.settings.dns_timeout)
            .await
            .map_err(|e| {
                e.with_context(format!(
                    "DNS lookup for {} on {}",
                    hostname, req.dns_server
                ))
            })?;

        if !output.success() {
            return Err(Error::command_failed(
                &self.host.command_line(&argv),
                output.stderr,
            )
            .with_context(format!("DNS lookup for {} on {}", hostname, req.dns_server)));
        }

        let (a_records, query_time_msec) = parse_dig(&output.stdout)?;
        Ok(DnsLookup {
            dns_server: req.dns_server,
            hostname,
            a_records,
            query_time_msec,
        })
    }
}

/// Split `dig +noall +answer +stats` output into answer lines and query time.
pub fn parse_dig(stdout: &str) -> Result<(Vec<String>, Option<u64>)> {
    let mut records = Vec::new();
    let mut query_time = None;

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(";; Query time:") {
            let msec = rest.trim().trim_end_matches("msec").trim();
            query_time = Some(
                msec.parse()
                    .map_err(|_| Error::Parse(format!("invalid dig query time {:?}", rest)))?,
            );
        } else if !line.starts_with(";;") {
            records.push(line.to_string());
        }
    }

    Ok((records, query_time))
}
