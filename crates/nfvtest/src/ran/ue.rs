//! UERANSIM 5G UEs, identified by their SUPI.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::gnodeb::parse_cli_status;
use super::{NodeFiles, ProcessRegistry, ProcessState, Slice, string_or_number, validate_plmn};
use crate::config::RanConfig;
use crate::error::{Error, Result};
use crate::host::Host;

/// `imsi-` followed by the 15 IMSI digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Supi(String);

impl Supi {
    pub fn new(supi: impl Into<String>) -> Result<Self> {
        let supi = supi.into();
        let valid = supi
            .strip_prefix("imsi-")
            .is_some_and(|imsi| imsi.len() == 15 && imsi.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(Error::InvalidInput(format!(
                "supi {:?} must be imsi- followed by 15 digits",
                supi
            )));
        }
        Ok(Self(supi))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Supi {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl FromStr for Supi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Supi> for String {
    fn from(supi: Supi) -> Self {
        supi.0
    }
}

impl fmt::Display for Supi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpType {
    #[serde(rename = "OP")]
    Op,
    #[serde(rename = "OPC")]
    Opc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "IPv4")]
    Ipv4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxRate {
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "64kbps")]
    Kbps64,
}

/// UAC access identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UacAic {
    pub mps: bool,
    pub mcs: bool,
}

/// UAC access control class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UacAcc {
    pub normal_class: u8,
    pub class11: bool,
    pub class12: bool,
    pub class13: bool,
    pub class14: bool,
    pub class15: bool,
}

/// A PDU session established at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<Slice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Integrity {
    pub IA1: bool,
    pub IA2: bool,
    pub IA3: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Ciphering {
    pub EA1: bool,
    pub EA2: bool,
    pub EA3: bool,
}

/// User plane integrity protection rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityMaxRate {
    pub uplink: MaxRate,
    pub downlink: MaxRate,
}

/// A UE config file, `ue_<supi>.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ue {
    pub supi: Supi,
    #[serde(deserialize_with = "string_or_number")]
    pub mcc: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mnc: String,
    /// Subscriber key, hex.
    pub key: String,
    /// Operator code, hex.
    pub op: String,
    pub op_type: OpType,
    pub amf: String,
    pub imei: String,
    pub imei_sv: String,
    pub gnb_search_list: Vec<IpAddr>,
    pub uac_aic: UacAic,
    pub uac_acc: UacAcc,
    pub sessions: Vec<Session>,
    #[serde(rename = "configured-nssai")]
    pub configured_nssai: Vec<Slice>,
    #[serde(rename = "default-nssai")]
    pub default_nssai: Vec<Slice>,
    pub integrity: Integrity,
    pub ciphering: Ciphering,
    pub integrity_max_rate: IntegrityMaxRate,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Ue {
    pub fn validate(&self) -> Result<()> {
        validate_plmn(&self.mcc, &self.mnc)?;
        for (field, value) in [("key", &self.key), ("op", &self.op), ("amf", &self.amf)] {
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidInput(format!(
                    "{} must be a hex string, got {:?}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

/// Status of a started UE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeStatus {
    pub pid: u32,
    /// Output of `nr-cli <supi> --exec status`, `{}` when unavailable.
    pub status: Value,
    /// Whether the process has exited without being stopped.
    pub terminated: bool,
    pub logs: Vec<String>,
}

/// Stores UE configs and runs `nr-ue`.
#[derive(Debug, Clone)]
pub struct UeService {
    host: Host,
    files: NodeFiles,
    processes: Arc<ProcessRegistry>,
    ue_bin: String,
    cli_bin: String,
}

impl UeService {
    pub fn new(host: &Host, config: &RanConfig, processes: Arc<ProcessRegistry>) -> Self {
        Self {
            host: host.clone(),
            files: NodeFiles::new(&config.ue_config_folder, &config.ue_log_folder, "ue_", "yml"),
            processes,
            ue_bin: config.nr_ue_bin.clone(),
            cli_bin: config.nr_cli_bin.clone(),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Ue>> {
        let mut ues = Vec::new();
        for id in self.files.config_ids().await? {
            let Ok(id) = Supi::new(id.as_str()) else {
                tracing::debug!(id = %id, "skipping config with an invalid identifier");
                continue;
            };
            match self.get_one_or_default(&id).await {
                Ok(Some(ue)) => ues.push(ue),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to parse UE config");
                }
            }
        }
        Ok(ues)
    }

    pub async fn get_one_or_default(&self, supi: &Supi) -> Result<Option<Ue>> {
        match self.files.read_config(supi.as_str()).await? {
            Some(text) => Ok(Some(serde_yaml::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub async fn get_one(&self, supi: &Supi) -> Result<Ue> {
        self.get_one_or_default(supi)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find UE with supi {}", supi)))
    }

    pub async fn create(&self, ue: &Ue) -> Result<Ue> {
        ue.validate()?;
        if self.get_one_or_default(&ue.supi).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a UE config with supi {} already exists",
                ue.supi
            )));
        }
        self.write(ue).await
    }

    /// Create or replace the config of UE `supi`.
    pub async fn put(&self, supi: &Supi, ue: &Ue) -> Result<Ue> {
        if &ue.supi != supi {
            return Err(Error::InvalidInput(format!(
                "supi {} in the body does not match {} in the path",
                ue.supi, supi
            )));
        }
        ue.validate()?;
        self.write(ue).await
    }

    pub async fn delete(&self, supi: &Supi) -> Result<()> {
        self.get_one(supi).await?;
        if self.processes.contains(supi.as_str()) {
            return Err(Error::Conflict(format!("the UE {} is still running", supi)));
        }
        self.files.remove_config(supi.as_str()).await?;
        tracing::info!(supi = %supi, "deleted UE config");
        Ok(())
    }

    pub async fn start(&self, supi: &Supi) -> Result<u32> {
        self.get_one(supi).await?;
        let argv = vec![
            self.ue_bin.clone(),
            "-c".to_string(),
            self.files.config_path(supi.as_str()).display().to_string(),
        ];
        let log = self.files.prepare_log(supi.as_str()).await?;
        self.processes.start(supi.as_str(), &argv, &log)
    }

    pub async fn stop(&self, supi: &Supi) -> Result<()> {
        self.get_one(supi).await?;
        self.processes.stop(supi.as_str()).await.map(|_| ())
    }

    /// Report a started UE.
    ///
    /// An exited process stays registered and is reported as terminated
    /// until it is stopped.
    pub async fn status(&self, supi: &Supi) -> Result<UeStatus> {
        self.get_one(supi).await?;
        let info = self.processes.poll(supi.as_str())?;

        let mut status = UeStatus {
            pid: info.pid,
            status: Value::Object(Default::default()),
            terminated: false,
            logs: self.files.read_log(supi.as_str()).await?,
        };

        if let ProcessState::Exited(code) = info.state {
            status.terminated = true;
            status.logs.push(format!("The ue process failed with return code {}.", code));
            status.logs.push(
                "The process is still living as zombie process, please call stop to terminate it properly."
                    .to_string(),
            );
            return Ok(status);
        }

        let argv = [self.cli_bin.as_str(), supi.as_str(), "--exec", "status"];
        let output = self.host.exec(&argv).await?;
        status.status = parse_cli_status(&output.stdout).unwrap_or_else(|e| {
            tracing::warn!(supi = %supi, error = %e, "unparsable nr-cli status");
            Value::Object(Default::default())
        });
        if output.has_stderr() {
            status.logs.extend(output.stderr.lines().map(str::to_string));
        }
        Ok(status)
    }

    async fn write(&self, ue: &Ue) -> Result<Ue> {
        let text = serde_yaml::to_string(ue)?;
        self.files.write_config(ue.supi.as_str(), &text).await?;
        tracing::info!(supi = %ue.supi, "wrote UE config");
        self.get_one_or_default(&ue.supi).await?.ok_or_else(|| {
            Error::Unexpected(format!("UE config {} should exist but can not be found", ue.supi))
        })
    }
}
