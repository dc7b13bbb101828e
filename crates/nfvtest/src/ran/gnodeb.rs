//! UERANSIM gNodeBs, identified by their NR cell identity.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{NodeFiles, ProcessRegistry, ProcessState, Slice, string_or_number, validate_plmn};
use crate::config::RanConfig;
use crate::error::{Error, Result};
use crate::host::Host;

/// Width of an NR cell identity in bits.
const NCI_BITS: u8 = 36;

/// A 36-bit NR cell identity written as `0x` and 1 to 9 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nci(String);

impl Nci {
    pub fn new(nci: impl Into<String>) -> Result<Self> {
        let nci = nci.into();
        let valid = nci
            .strip_prefix("0x")
            .is_some_and(|hex| (1..=9).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(Error::InvalidInput(format!(
                "nci {:?} must be 0x followed by 1 to 9 hex digits",
                nci
            )));
        }
        Ok(Self(nci))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> u64 {
        // Validated as at most 9 hex digits.
        u64::from_str_radix(&self.0[2..], 16).unwrap_or_default()
    }
}

impl TryFrom<String> for Nci {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl FromStr for Nci {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Nci> for String {
    fn from(nci: Nci) -> Self {
        nci.0
    }
}

impl fmt::Display for Nci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmfConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// A gNodeB config file, `gnb_<nci>.yml`.
///
/// Keys not modelled here are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GNodeB {
    #[serde(deserialize_with = "string_or_number")]
    pub mcc: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mnc: String,
    pub nci: Nci,
    /// gNB id length in bits, 22 to 32.
    pub id_length: u8,
    pub tac: u32,
    pub link_ip: IpAddr,
    pub ngap_ip: IpAddr,
    pub gtp_ip: IpAddr,
    pub amf_configs: Vec<AmfConfig>,
    pub slices: Vec<Slice>,
    pub ignore_stream_ids: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GNodeB {
    pub fn validate(&self) -> Result<()> {
        validate_plmn(&self.mcc, &self.mnc)?;
        if !(22..=32).contains(&self.id_length) {
            return Err(Error::InvalidInput(format!(
                "idLength must be between 22 and 32, got {}",
                self.id_length
            )));
        }
        Ok(())
    }

    /// The gNB id: the leading `idLength` bits of the cell identity.
    pub fn gnb_id(&self) -> u64 {
        self.nci.value() >> (NCI_BITS - self.id_length.min(NCI_BITS))
    }

    /// Name UERANSIM registers the node under, `UERANSIM-gnb-<mcc>-<mnc>-<gnbId>`.
    pub fn node_name(&self) -> String {
        format!(
            "UERANSIM-gnb-{}-{}-{}",
            without_leading_zeros(&self.mcc),
            without_leading_zeros(&self.mnc),
            self.gnb_id()
        )
    }
}

fn without_leading_zeros(digits: &str) -> &str {
    match digits.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    }
}

/// Status of a started gNodeB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GNodeBStatus {
    /// `None` once the process has exited.
    pub pid: Option<u32>,
    /// Output of `nr-cli <node> --exec status`.
    pub status: Value,
    pub logs: Vec<String>,
}

/// Stores gNodeB configs and runs `nr-gnb`.
#[derive(Debug, Clone)]
pub struct GNodeBService {
    host: Host,
    files: NodeFiles,
    processes: Arc<ProcessRegistry>,
    gnb_bin: String,
    cli_bin: String,
}

impl GNodeBService {
    pub fn new(host: &Host, config: &RanConfig, processes: Arc<ProcessRegistry>) -> Self {
        Self {
            host: host.clone(),
            files: NodeFiles::new(&config.gnb_config_folder, &config.gnb_log_folder, "gnb_", "yml"),
            processes,
            gnb_bin: config.nr_gnb_bin.clone(),
            cli_bin: config.nr_cli_bin.clone(),
        }
    }

    /// Every parsable gNodeB config. Files that fail to parse are logged and skipped.
    pub async fn get_all(&self) -> Result<Vec<GNodeB>> {
        let mut gnbs = Vec::new();
        for id in self.files.config_ids().await? {
            let Ok(id) = Nci::new(id.as_str()) else {
                tracing::debug!(id = %id, "skipping config with an invalid identifier");
                continue;
            };
            match self.get_one_or_default(&id).await {
                Ok(Some(gnb)) => gnbs.push(gnb),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to parse gNodeB config");
                }
            }
        }
        Ok(gnbs)
    }

    pub async fn get_one_or_default(&self, nci: &Nci) -> Result<Option<GNodeB>> {
        match self.files.read_config(nci.as_str()).await? {
            Some(text) => Ok(Some(serde_yaml::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub async fn get_one(&self, nci: &Nci) -> Result<GNodeB> {
        self.get_one_or_default(nci)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find gNodeB with nci {}", nci)))
    }

    pub async fn create(&self, gnb: &GNodeB) -> Result<GNodeB> {
        gnb.validate()?;
        if self.get_one_or_default(&gnb.nci).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a gNodeB config with nci {} already exists",
                gnb.nci
            )));
        }
        self.write(gnb).await
    }

    /// Create or replace the config of gNodeB `nci`.
    pub async fn put(&self, nci: &Nci, gnb: &GNodeB) -> Result<GNodeB> {
        if &gnb.nci != nci {
            return Err(Error::InvalidInput(format!(
                "nci {} in the body does not match {} in the path",
                gnb.nci, nci
            )));
        }
        gnb.validate()?;
        self.write(gnb).await
    }

    /// Delete a config. Fails with a conflict while its process is registered.
    pub async fn delete(&self, nci: &Nci) -> Result<()> {
        self.get_one(nci).await?;
        if self.processes.contains(nci.as_str()) {
            return Err(Error::Conflict(format!(
                "the gNodeB {} is still running",
                nci
            )));
        }
        self.files.remove_config(nci.as_str()).await?;
        tracing::info!(nci = %nci, "deleted gNodeB config");
        Ok(())
    }

    pub async fn start(&self, nci: &Nci) -> Result<u32> {
        self.get_one(nci).await?;
        let argv = vec![
            self.gnb_bin.clone(),
            "-c".to_string(),
            self.files.config_path(nci.as_str()).display().to_string(),
        ];
        let log = self.files.prepare_log(nci.as_str()).await?;
        self.processes.start(nci.as_str(), &argv, &log)
    }

    pub async fn stop(&self, nci: &Nci) -> Result<()> {
        self.get_one(nci).await?;
        self.processes.stop(nci.as_str()).await.map(|_| ())
    }

    /// Report a started gNodeB.
    ///
    /// A process that has exited is reaped here and its exit code appended
    /// to the logs, so the next call fails with not found.
    pub async fn status(&self, nci: &Nci) -> Result<GNodeBStatus> {
        let gnb = self.get_one(nci).await?;
        let info = self.processes.poll(nci.as_str())?;

        let mut status = GNodeBStatus {
            pid: None,
            status: Value::Object(Default::default()),
            logs: Vec::new(),
        };
        let mut notes = Vec::new();

        match info.state {
            ProcessState::Exited(code) => {
                self.processes.stop(nci.as_str()).await?;
                notes.push(format!("The gnodeB process failed with return code {}.", code));
                notes.push(
                    "Killing zombie process, next call to status will raise Not Found.".to_string(),
                );
            }
            ProcessState::Running => {
                status.pid = Some(info.pid);
                let node = gnb.node_name();
                let argv = [self.cli_bin.as_str(), node.as_str(), "--exec", "status"];
                let output = self.host.exec(&argv).await?;
                if output.has_stderr() {
                    return Err(Error::NotFound(format!(
                        "failed to fetch gNodeB status: {}",
                        output.stderr.trim_end()
                    )));
                }
                status.status = parse_cli_status(&output.stdout)?;
            }
        }

        status.logs = self.files.read_log(nci.as_str()).await?;
        status.logs.extend(notes);
        Ok(status)
    }

    async fn write(&self, gnb: &GNodeB) -> Result<GNodeB> {
        let text = serde_yaml::to_string(gnb)?;
        self.files.write_config(gnb.nci.as_str(), &text).await?;
        tracing::info!(nci = %gnb.nci, "wrote gNodeB config");
        self.get_one_or_default(&gnb.nci).await?.ok_or_else(|| {
            Error::Unexpected(format!(
                "gNodeB config {} should exist but can not be found",
                gnb.nci
            ))
        })
    }
}

/// Parse `nr-cli --exec status` output, an empty document giving `{}`.
pub(crate) fn parse_cli_status(stdout: &str) -> Result<Value> {
    if stdout.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_yaml::from_str(stdout)?;
    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}
