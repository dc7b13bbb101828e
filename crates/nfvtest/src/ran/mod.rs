//! Radio access network simulator nodes.
//!
//! Four node kinds are managed: UERANSIM gNodeBs and 5G UEs, configured
//! with YAML files, and srsRAN eNodeBs and 4G UEs, configured with INI
//! files derived from a template. For each kind a service stores configs
//! under a folder, one file per node, and a [`ProcessRegistry`] tracks the
//! simulator processes it started.
//!
//! Process tracking lives in memory only. Children are spawned with
//! `kill_on_drop`, so nothing outlives the server.

pub mod enodeb;
pub mod gnodeb;
mod srsran;
pub mod ue;
pub mod ue4g;

pub use enodeb::{ENodeB, ENodeBService, ENodeBStatus};
pub use gnodeb::{AmfConfig, GNodeB, GNodeBService, GNodeBStatus, Nci};
pub use ue::{Supi, Ue, UeService, UeStatus};
pub use ue4g::{Ue4g, Ue4gService, Ue4gStatus};

use std::collections::HashMap;
use std::fs::File;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::process::{Child, Command};

use crate::error::{Error, Result};

/// A network slice (S-NSSAI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<u32>,
}

/// What a registered process is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    /// Exited with the given code, negative for a signal.
    Exited(i32),
}

/// Pid and state of a registered process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub state: ProcessState,
}

impl ProcessInfo {
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }
}

struct Managed {
    child: Child,
    pid: u32,
}

/// How long a stopped process gets to exit after SIGTERM before SIGKILL.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Simulator processes of one node kind, keyed by node identifier.
pub struct ProcessRegistry {
    kind: &'static str,
    id_field: &'static str,
    grace: Duration,
    processes: Mutex<HashMap<String, Managed>>,
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("kind", &self.kind)
            .field("running", &self.ids())
            .finish()
    }
}

impl ProcessRegistry {
    /// Create an empty registry. `kind` and `id_field` only shape messages.
    pub fn new(kind: &'static str, id_field: &'static str) -> Self {
        Self {
            kind,
            id_field,
            grace: DEFAULT_STOP_GRACE,
            processes: Mutex::new(HashMap::new()),
        }
    }

    /// Set how long [`stop`](Self::stop) waits after SIGTERM before SIGKILL.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Spawn `argv` for node `id` with stdout and stderr sent to `log`.
    ///
    /// The log file is truncated. Fails with a conflict when a process is
    /// already registered for `id`, even one that has exited.
    pub fn start(&self, id: &str, argv: &[String], log: &Path) -> Result<u32> {
        let mut processes = self.lock();
        if processes.contains_key(id) {
            return Err(Error::Conflict(format!(
                "a {} with {} {} is already running",
                self.kind, self.id_field, id
            )));
        }

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::InvalidInput("empty command line".into()))?;

        let out = File::create(log)?;
        let err = out.try_clone()?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .kill_on_drop(true)
            .spawn()?;
        let pid = child
            .id()
            .ok_or_else(|| Error::Unexpected(format!("{} exited before it got a pid", program)))?;

        tracing::info!(kind = self.kind, id, pid, command = %argv.join(" "), "started process");
        processes.insert(id.to_string(), Managed { child, pid });
        Ok(pid)
    }

    /// Poll the process of node `id` without blocking.
    pub fn poll(&self, id: &str) -> Result<ProcessInfo> {
        let mut processes = self.lock();
        let managed = processes.get_mut(id).ok_or_else(|| self.not_running(id))?;
        let state = match managed.child.try_wait()? {
            Some(status) => ProcessState::Exited(exit_code(status)),
            None => ProcessState::Running,
        };
        Ok(ProcessInfo {
            pid: managed.pid,
            state,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Identifiers with a registered process, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Terminate the process of node `id`, wait for it and forget it.
    ///
    /// Returns the exit code. Fails with not found when nothing is registered.
    pub async fn stop(&self, id: &str) -> Result<i32> {
        let managed = self
            .lock()
            .remove(id)
            .ok_or_else(|| self.not_running(id))?;
        let code = terminate(managed, self.grace).await?;
        tracing::info!(kind = self.kind, id, code, "stopped process");
        Ok(code)
    }

    /// Terminate every registered process.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, Managed)> = self.lock().drain().collect();
        for (id, managed) in drained {
            match terminate(managed, self.grace).await {
                Ok(code) => tracing::info!(kind = self.kind, id = %id, code, "stopped process"),
                Err(e) => tracing::warn!(kind = self.kind, id = %id, error = %e, "failed to stop process"),
            }
        }
    }

    fn not_running(&self, id: &str) -> Error {
        Error::NotFound(format!(
            "no process running for {} with {} {}",
            self.kind, self.id_field, id
        ))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Managed>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Send SIGTERM unless the child already exited, then reap it.
///
/// A child still running after `grace` is killed with SIGKILL.
async fn terminate(mut managed: Managed, grace: Duration) -> Result<i32> {
    if let Some(status) = managed.child.try_wait()? {
        return Ok(exit_code(status));
    }

    let pid = libc::pid_t::try_from(managed.pid)
        .map_err(|_| Error::Unexpected(format!("pid {} out of range", managed.pid)))?;
    // SAFETY: the child has not been reaped, so the pid still belongs to it.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        let err = std::io::Error::last_os_error();
        tracing::warn!(pid, error = %err, "SIGTERM failed, killing");
        managed.child.start_kill()?;
    }

    match tokio::time::timeout(grace, managed.child.wait()).await {
        Ok(status) => Ok(exit_code(status?)),
        Err(_) => {
            tracing::warn!(pid, grace_ms = grace.as_millis() as u64, "no exit after SIGTERM, killing");
            managed.child.start_kill()?;
            Ok(exit_code(managed.child.wait().await?))
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or_default()
}

/// The four registries shared by the services and the server.
#[derive(Debug, Clone)]
pub struct RanProcesses {
    pub gnodeb: Arc<ProcessRegistry>,
    pub ue: Arc<ProcessRegistry>,
    pub enodeb: Arc<ProcessRegistry>,
    pub ue_4g: Arc<ProcessRegistry>,
}

impl Default for RanProcesses {
    fn default() -> Self {
        Self {
            gnodeb: Arc::new(ProcessRegistry::new("gNodeB", "nci")),
            ue: Arc::new(ProcessRegistry::new("UE", "supi")),
            enodeb: Arc::new(ProcessRegistry::new("eNodeB", "enb_id")),
            ue_4g: Arc::new(ProcessRegistry::new("4G UE", "imei")),
        }
    }
}

impl RanProcesses {
    /// Terminate every simulator process.
    pub async fn shutdown(&self) {
        for registry in [&self.gnodeb, &self.ue, &self.enodeb, &self.ue_4g] {
            registry.shutdown().await;
        }
    }
}

/// Where one node kind keeps its config and log files.
///
/// Node `id` uses `<config_folder>/<prefix><id>.<extension>` and
/// `<log_folder>/<prefix><id>.log`.
#[derive(Debug, Clone)]
pub struct NodeFiles {
    config_folder: PathBuf,
    log_folder: PathBuf,
    prefix: &'static str,
    extension: &'static str,
}

impl NodeFiles {
    pub fn new(
        config_folder: impl Into<PathBuf>,
        log_folder: impl Into<PathBuf>,
        prefix: &'static str,
        extension: &'static str,
    ) -> Self {
        Self {
            config_folder: config_folder.into(),
            log_folder: log_folder.into(),
            prefix,
            extension,
        }
    }

    pub fn config_path(&self, id: &str) -> PathBuf {
        self.config_folder
            .join(format!("{}{}.{}", self.prefix, id, self.extension))
    }

    pub fn log_path(&self, id: &str) -> PathBuf {
        self.log_folder.join(format!("{}{}.log", self.prefix, id))
    }

    /// Create the log folder if needed and return the log path of node `id`.
    pub async fn prepare_log(&self, id: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.log_folder).await?;
        Ok(self.log_path(id))
    }

    /// Identifiers of the stored configs, sorted. A missing folder is empty.
    pub async fn config_ids(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.config_folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", self.extension);
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(self.prefix))
                .and_then(|n| n.strip_suffix(suffix.as_str()))
                && !id.is_empty()
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Read a config, `None` when the file does not exist.
    pub async fn read_config(&self, id: &str) -> Result<Option<String>> {
        read_optional(&self.config_path(id)).await
    }

    pub async fn write_config(&self, id: &str, contents: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.config_folder).await?;
        let path = self.config_path(id);
        tokio::fs::write(&path, contents).await?;
        tracing::debug!(path = %path.display(), "wrote config");
        Ok(())
    }

    pub async fn remove_config(&self, id: &str) -> Result<()> {
        let path = self.config_path(id);
        tokio::fs::remove_file(&path).await?;
        tracing::debug!(path = %path.display(), "removed config");
        Ok(())
    }

    /// Lines of the node's log file, empty when there is none yet.
    pub async fn read_log(&self, id: &str) -> Result<Vec<String>> {
        Ok(read_optional(&self.log_path(id))
            .await?
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Accept a YAML or JSON string or number as a string, e.g. `mcc: 001`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

/// Check a mobile country and network code pair.
pub(crate) fn validate_plmn(mcc: &str, mnc: &str) -> Result<()> {
    let digits = |s: &str, range: std::ops::RangeInclusive<usize>| {
        range.contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };
    if !digits(mcc, 3..=3) {
        return Err(Error::InvalidInput(format!("mcc {:?} must be 3 digits", mcc)));
    }
    if !digits(mnc, 2..=3) {
        return Err(Error::InvalidInput(format!("mnc {:?} must be 2 or 3 digits", mnc)));
    }
    Ok(())
}

/// Check that `value` is `len` ASCII digits.
pub(crate) fn validate_digits(field: &str, value: &str, len: usize) -> Result<()> {
    if value.len() != len || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "{} {:?} must be {} digits",
            field, value, len
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_start_poll_stop() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new("gNodeB", "nci");
        let log = dir.path().join("a.log");

        let pid = registry
            .start("0x1", &argv(&["sh", "-c", "echo hello; exec sleep 30"]), &log)
            .unwrap();
        assert!(registry.contains("0x1"));

        let info = registry.poll("0x1").unwrap();
        assert_eq!(info.pid, pid);
        assert!(info.is_running());

        let err = registry
            .start("0x1", &argv(&["sleep", "30"]), &log)
            .unwrap_err();
        assert!(err.is_conflict());

        let code = registry.stop("0x1").await.unwrap();
        assert_eq!(code, -libc::SIGTERM);
        assert!(!registry.contains("0x1"));
        assert!(registry.stop("0x1").await.unwrap_err().is_not_found());
        assert!(registry.poll("0x1").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_exited_process_is_reported() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new("UE", "supi");
        let log = dir.path().join("b.log");

        registry
            .start("x", &argv(&["sh", "-c", "echo bye >&2; exit 3"]), &log)
            .unwrap();

        let mut state = registry.poll("x").unwrap().state;
        for _ in 0..50 {
            if state != ProcessState::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            state = registry.poll("x").unwrap().state;
        }
        assert_eq!(state, ProcessState::Exited(3));
        // Still registered until stopped.
        assert!(registry.contains("x"));
        assert_eq!(registry.stop("x").await.unwrap(), 3);

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "bye\n");
    }

    #[tokio::test]
    async fn test_stop_kills_after_grace() {
        let dir = TempDir::new().unwrap();
        let registry =
            ProcessRegistry::new("gNodeB", "nci").with_stop_grace(Duration::from_millis(200));
        registry
            .start(
                "a",
                &argv(&["sh", "-c", "trap '' TERM; while :; do sleep 1; done"]),
                &dir.path().join("a.log"),
            )
            .unwrap();
        // Let the shell install its trap before it is signalled.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let code = tokio::time::timeout(Duration::from_secs(5), registry.stop("a"))
            .await
            .expect("stop must not hang on a process ignoring SIGTERM")
            .unwrap();
        assert_eq!(code, -libc::SIGKILL);
        assert!(!registry.contains("a"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new("eNodeB", "enb_id");
        registry
            .start("a", &argv(&["sleep", "30"]), &dir.path().join("a.log"))
            .unwrap();
        registry
            .start("b", &argv(&["sleep", "30"]), &dir.path().join("b.log"))
            .unwrap();
        assert_eq!(registry.ids(), vec!["a", "b"]);

        registry.shutdown().await;
        assert!(registry.ids().is_empty());
    }

    #[tokio::test]
    async fn test_start_missing_binary() {
        let dir = TempDir::new().unwrap();
        let registry = ProcessRegistry::new("gNodeB", "nci");
        let err = registry
            .start("x", &argv(&["/nonexistent/nr-gnb"]), &dir.path().join("x.log"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!registry.contains("x"));
    }

    #[tokio::test]
    async fn test_node_files() {
        let dir = TempDir::new().unwrap();
        let files = NodeFiles::new(dir.path(), dir.path(), "gnb_", "yml");
        assert_eq!(files.config_path("0x10"), dir.path().join("gnb_0x10.yml"));
        assert_eq!(files.log_path("0x10"), dir.path().join("gnb_0x10.log"));

        assert!(files.read_config("0x10").await.unwrap().is_none());
        files.write_config("0x10", "a: 1\n").await.unwrap();
        files.write_config("0x2", "a: 2\n").await.unwrap();
        std::fs::write(dir.path().join("ue_imsi-001010000000001.yml"), "").unwrap();
        std::fs::write(dir.path().join("gnb_0x3.log"), "one\ntwo\n").unwrap();

        assert_eq!(files.config_ids().await.unwrap(), vec!["0x10", "0x2"]);
        assert_eq!(files.read_log("0x3").await.unwrap(), vec!["one", "two"]);
        assert!(files.read_log("0x4").await.unwrap().is_empty());

        files.remove_config("0x2").await.unwrap();
        assert_eq!(files.config_ids().await.unwrap(), vec!["0x10"]);

        let missing = NodeFiles::new(dir.path().join("nope"), dir.path(), "gnb_", "yml");
        assert!(missing.config_ids().await.unwrap().is_empty());
    }

    #[test]
    fn test_validate_plmn() {
        assert!(validate_plmn("001", "01").is_ok());
        assert!(validate_plmn("208", "930").is_ok());
        assert!(validate_plmn("01", "01").is_err());
        assert!(validate_plmn("001", "1").is_err());
        assert!(validate_plmn("00a", "01").is_err());
    }
}
