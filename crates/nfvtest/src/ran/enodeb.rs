//! srsRAN eNodeBs, identified by their eNB id.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NodeFiles, ProcessRegistry, ProcessState, srsran, string_or_number, validate_plmn};
use crate::config::RanConfig;
use crate::error::{Error, Result};

const SECTION: &str = "enb";
const KEYS: [&str; 8] = [
    "enb_id",
    "mcc",
    "mnc",
    "mme_addr",
    "gtp_bind_addr",
    "s1c_bind_addr",
    "s1c_bind_port",
    "n_prb",
];

/// Log line srsenb prints once it is serving.
const STARTED_LINE: &str = "==== eNodeB started ===";

/// Check an eNB id, `0x` and hex digits or plain decimal.
pub fn validate_enb_id(id: &str) -> Result<()> {
    let valid = match id.strip_prefix("0x") {
        Some(hex) => !hex.is_empty() && hex.len() <= 5 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !id.is_empty() && id.len() <= 7 && id.chars().all(|c| c.is_ascii_digit()),
    };
    if !valid {
        return Err(Error::InvalidInput(format!(
            "enb_id {:?} must be 0x followed by hex digits or a decimal number",
            id
        )));
    }
    Ok(())
}

/// The `[enb]` section of `enb_<enb_id>.conf`.
///
/// Other keys of the section, usually inherited from the template, are
/// kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ENodeB {
    pub enb_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mcc: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mnc: String,
    pub mme_addr: IpAddr,
    pub gtp_bind_addr: IpAddr,
    pub s1c_bind_addr: IpAddr,
    pub s1c_bind_port: u16,
    /// Number of physical resource blocks.
    pub n_prb: u16,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ENodeB {
    pub fn validate(&self) -> Result<()> {
        validate_enb_id(&self.enb_id)?;
        validate_plmn(&self.mcc, &self.mnc)?;
        if let Some(key) = self.extra.keys().find(|k| k.is_empty() || k.contains(['=', '[', ']', '\n'])) {
            return Err(Error::InvalidInput(format!("invalid [enb] key {:?}", key)));
        }
        Ok(())
    }

    fn from_ini(ini: &ini::Ini) -> Result<Option<Self>> {
        let Some(props) = ini.section(Some(SECTION)) else {
            return Ok(None);
        };
        Ok(Some(Self {
            enb_id: srsran::field(props, SECTION, "enb_id")?,
            mcc: srsran::field(props, SECTION, "mcc")?,
            mnc: srsran::field(props, SECTION, "mnc")?,
            mme_addr: srsran::field(props, SECTION, "mme_addr")?,
            gtp_bind_addr: srsran::field(props, SECTION, "gtp_bind_addr")?,
            s1c_bind_addr: srsran::field(props, SECTION, "s1c_bind_addr")?,
            s1c_bind_port: srsran::field(props, SECTION, "s1c_bind_port")?,
            n_prb: srsran::field(props, SECTION, "n_prb")?,
            extra: srsran::extra_fields(props, &KEYS),
        }))
    }

    fn write_into(&self, ini: &mut ini::Ini) {
        let mut section = ini.with_section(Some(SECTION));
        for (key, value) in &self.extra {
            section.set(key.as_str(), value.as_str());
        }
        section
            .set("enb_id", self.enb_id.as_str())
            .set("mcc", self.mcc.as_str())
            .set("mnc", self.mnc.as_str())
            .set("mme_addr", self.mme_addr.to_string())
            .set("gtp_bind_addr", self.gtp_bind_addr.to_string())
            .set("s1c_bind_addr", self.s1c_bind_addr.to_string())
            .set("s1c_bind_port", self.s1c_bind_port.to_string())
            .set("n_prb", self.n_prb.to_string());
    }
}

/// Status of a started eNodeB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ENodeBStatus {
    pub pid: u32,
    /// Whether srsenb reported it is serving.
    pub started: bool,
    /// Whether the process has exited without being stopped.
    pub terminated: bool,
    pub logs: Vec<String>,
}

/// Stores eNodeB configs and runs `srsenb`.
#[derive(Debug, Clone)]
pub struct ENodeBService {
    files: NodeFiles,
    template: PathBuf,
    processes: Arc<ProcessRegistry>,
    enb_bin: String,
}

impl ENodeBService {
    pub fn new(config: &RanConfig, processes: Arc<ProcessRegistry>) -> Self {
        Self {
            files: NodeFiles::new(&config.enb_config_folder, &config.enb_log_folder, "enb_", "conf"),
            template: config.enb_template.clone(),
            processes,
            enb_bin: config.srsenb_bin.clone(),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<ENodeB>> {
        let mut enbs = Vec::new();
        for id in self.files.config_ids().await? {
            if validate_enb_id(&id).is_err() {
                tracing::debug!(id = %id, "skipping config with an invalid identifier");
                continue;
            }
            match self.get_one_or_default(&id).await {
                Ok(Some(enb)) => enbs.push(enb),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to parse eNodeB config");
                }
            }
        }
        Ok(enbs)
    }

    /// The eNodeB config, `None` when the file or its `[enb]` section is missing.
    pub async fn get_one_or_default(&self, enb_id: &str) -> Result<Option<ENodeB>> {
        match self.files.read_config(enb_id).await? {
            Some(text) => ENodeB::from_ini(&srsran::parse(&text)?),
            None => Ok(None),
        }
    }

    pub async fn get_one(&self, enb_id: &str) -> Result<ENodeB> {
        self.get_one_or_default(enb_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find eNodeB with enb_id {}", enb_id)))
    }

    pub async fn create(&self, enb: &ENodeB) -> Result<ENodeB> {
        enb.validate()?;
        if self.get_one_or_default(&enb.enb_id).await?.is_some() {
            return Err(Error::Conflict(format!(
                "an eNodeB config with enb_id {} already exists",
                enb.enb_id
            )));
        }
        self.put(&enb.enb_id, enb).await
    }

    /// Write the template with the `[enb]` section set from `enb`.
    pub async fn put(&self, enb_id: &str, enb: &ENodeB) -> Result<ENodeB> {
        if enb.enb_id != enb_id {
            return Err(Error::InvalidInput(format!(
                "enb_id {} in the body does not match {} in the path",
                enb.enb_id, enb_id
            )));
        }
        enb.validate()?;

        let mut ini = srsran::load_template(&self.template).await?;
        enb.write_into(&mut ini);
        self.files
            .write_config(enb_id, &srsran::render(&ini)?)
            .await?;
        tracing::info!(enb_id, "wrote eNodeB config");

        self.get_one_or_default(enb_id).await?.ok_or_else(|| {
            Error::Unexpected(format!("eNodeB config {} should exist but can not be found", enb_id))
        })
    }

    pub async fn delete(&self, enb_id: &str) -> Result<()> {
        self.get_one(enb_id).await?;
        if self.processes.contains(enb_id) {
            return Err(Error::Conflict(format!("the eNodeB {} is still running", enb_id)));
        }
        self.files.remove_config(enb_id).await?;
        tracing::info!(enb_id, "deleted eNodeB config");
        Ok(())
    }

    pub async fn start(&self, enb_id: &str) -> Result<u32> {
        self.get_one(enb_id).await?;
        let argv = vec![
            self.enb_bin.clone(),
            self.files.config_path(enb_id).display().to_string(),
        ];
        let log = self.files.prepare_log(enb_id).await?;
        self.processes.start(enb_id, &argv, &log)
    }

    pub async fn stop(&self, enb_id: &str) -> Result<()> {
        self.get_one(enb_id).await?;
        self.processes.stop(enb_id).await.map(|_| ())
    }

    pub async fn status(&self, enb_id: &str) -> Result<ENodeBStatus> {
        self.get_one(enb_id).await?;
        let info = self.processes.poll(enb_id)?;

        let mut logs = self.files.read_log(enb_id).await?;
        let started = logs.iter().any(|l| l == STARTED_LINE);
        let terminated = match info.state {
            ProcessState::Exited(code) => {
                logs.push(format!("The eNodeB process failed with return code {}.", code));
                logs.push(
                    "The process is still living as zombie process, please call stop to terminate it properly."
                        .to_string(),
                );
                true
            }
            ProcessState::Running => false,
        };

        Ok(ENodeBStatus {
            pid: info.pid,
            started,
            terminated,
            logs,
        })
    }
}
