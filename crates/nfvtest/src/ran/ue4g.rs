//! srsRAN 4G UEs, identified by their IMEI.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NodeFiles, ProcessRegistry, ProcessState, srsran, validate_digits};
use crate::config::RanConfig;
use crate::error::{Error, Result};

const SECTION: &str = "usim";
const KEYS: [&str; 6] = ["imsi", "imei", "op", "k", "mode", "algo"];

/// The `[usim]` section of `ue_4g_<imei>.conf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ue4g {
    /// 15 digit subscriber identity.
    pub imsi: String,
    /// 15 digit equipment identity.
    pub imei: String,
    /// Operator variant, 128 bit hex.
    pub op: String,
    /// Subscriber key, 128 bit hex.
    pub k: String,
    /// `soft` or `pcsc`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// `milenage` or `xor`.
    #[serde(default = "default_algo")]
    pub algo: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn default_mode() -> String {
    "soft".to_string()
}

fn default_algo() -> String {
    "milenage".to_string()
}

impl Ue4g {
    pub fn validate(&self) -> Result<()> {
        validate_digits("imsi", &self.imsi, 15)?;
        validate_digits("imei", &self.imei, 15)?;
        for (field, value) in [("op", &self.op), ("k", &self.k)] {
            if value.len() != 32 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidInput(format!(
                    "{} must be 32 hex digits, got {:?}",
                    field, value
                )));
            }
        }
        if !matches!(self.mode.as_str(), "soft" | "pcsc") {
            return Err(Error::InvalidInput(format!(
                "mode must be soft or pcsc, got {:?}",
                self.mode
            )));
        }
        if !matches!(self.algo.as_str(), "milenage" | "xor") {
            return Err(Error::InvalidInput(format!(
                "algo must be milenage or xor, got {:?}",
                self.algo
            )));
        }
        Ok(())
    }

    fn from_ini(ini: &ini::Ini) -> Result<Option<Self>> {
        let Some(props) = ini.section(Some(SECTION)) else {
            return Ok(None);
        };
        Ok(Some(Self {
            imsi: srsran::field(props, SECTION, "imsi")?,
            imei: srsran::field(props, SECTION, "imei")?,
            op: srsran::field(props, SECTION, "op")?,
            k: srsran::field(props, SECTION, "k")?,
            mode: props.get("mode").map_or_else(default_mode, str::to_string),
            algo: props.get("algo").map_or_else(default_algo, str::to_string),
            extra: srsran::extra_fields(props, &KEYS),
        }))
    }

    fn write_into(&self, ini: &mut ini::Ini) {
        let mut section = ini.with_section(Some(SECTION));
        for (key, value) in &self.extra {
            section.set(key.as_str(), value.as_str());
        }
        section
            .set("imsi", self.imsi.as_str())
            .set("imei", self.imei.as_str())
            .set("op", self.op.as_str())
            .set("k", self.k.as_str())
            .set("mode", self.mode.as_str())
            .set("algo", self.algo.as_str());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ue4gStatus {
    pub pid: u32,
    pub terminated: bool,
    pub logs: Vec<String>,
}

/// Stores 4G UE configs and runs `srsue`.
#[derive(Debug, Clone)]
pub struct Ue4gService {
    files: NodeFiles,
    template: PathBuf,
    processes: Arc<ProcessRegistry>,
    ue_bin: String,
}

impl Ue4gService {
    pub fn new(config: &RanConfig, processes: Arc<ProcessRegistry>) -> Self {
        Self {
            files: NodeFiles::new(
                &config.ue_4g_config_folder,
                &config.ue_4g_log_folder,
                "ue_4g_",
                "conf",
            ),
            template: config.ue_4g_template.clone(),
            processes,
            ue_bin: config.srsue_bin.clone(),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Ue4g>> {
        let mut ues = Vec::new();
        for id in self.files.config_ids().await? {
            if validate_digits("imei", &id, 15).is_err() {
                tracing::debug!(id = %id, "skipping config with an invalid identifier");
                continue;
            }
            match self.get_one_or_default(&id).await {
                Ok(Some(ue)) => ues.push(ue),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "failed to parse 4G UE config");
                }
            }
        }
        Ok(ues)
    }

    pub async fn get_one_or_default(&self, imei: &str) -> Result<Option<Ue4g>> {
        match self.files.read_config(imei).await? {
            Some(text) => Ue4g::from_ini(&srsran::parse(&text)?),
            None => Ok(None),
        }
    }

    pub async fn get_one(&self, imei: &str) -> Result<Ue4g> {
        self.get_one_or_default(imei)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find 4G UE with imei {}", imei)))
    }

    pub async fn create(&self, ue: &Ue4g) -> Result<Ue4g> {
        ue.validate()?;
        if self.get_one_or_default(&ue.imei).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a 4G UE config with imei {} already exists",
                ue.imei
            )));
        }
        self.put(&ue.imei, ue).await
    }

    /// Write the template with the `[usim]` section set from `ue`.
    pub async fn put(&self, imei: &str, ue: &Ue4g) -> Result<Ue4g> {
        if ue.imei != imei {
            return Err(Error::InvalidInput(format!(
                "imei {} in the body does not match {} in the path",
                ue.imei, imei
            )));
        }
        ue.validate()?;

        let mut ini = srsran::load_template(&self.template).await?;
        ue.write_into(&mut ini);
        self.files.write_config(imei, &srsran::render(&ini)?).await?;
        tracing::info!(imei, "wrote 4G UE config");

        self.get_one_or_default(imei).await?.ok_or_else(|| {
            Error::Unexpected(format!("4G UE config {} should exist but can not be found", imei))
        })
    }

    pub async fn delete(&self, imei: &str) -> Result<()> {
        self.get_one(imei).await?;
        if self.processes.contains(imei) {
            return Err(Error::Conflict(format!("the 4G UE {} is still running", imei)));
        }
        self.files.remove_config(imei).await?;
        tracing::info!(imei, "deleted 4G UE config");
        Ok(())
    }

    pub async fn start(&self, imei: &str) -> Result<u32> {
        self.get_one(imei).await?;
        let argv = vec![
            self.ue_bin.clone(),
            self.files.config_path(imei).display().to_string(),
        ];
        let log = self.files.prepare_log(imei).await?;
        self.processes.start(imei, &argv, &log)
    }

    pub async fn stop(&self, imei: &str) -> Result<()> {
        self.get_one(imei).await?;
        self.processes.stop(imei).await.map(|_| ())
    }

    pub async fn status(&self, imei: &str) -> Result<Ue4gStatus> {
        self.get_one(imei).await?;
        let info = self.processes.poll(imei)?;

        let mut logs = self.files.read_log(imei).await?;
        let terminated = match info.state {
            ProcessState::Exited(code) => {
                logs.push(format!(
                    "The 4G user equipment process failed with return code {}.",
                    code
                ));
                logs.push(
                    "The process is still living as zombie process, please call stop to terminate it properly."
                        .to_string(),
                );
                true
            }
            ProcessState::Running => false,
        };

        Ok(Ue4gStatus {
            pid: info.pid,
            terminated,
            logs,
        })
    }
}
