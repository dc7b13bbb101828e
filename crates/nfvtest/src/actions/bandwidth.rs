//! Throughput test against an iperf3 server.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ActionsService;
use crate::error::{Error, Result};
use crate::types::ping::validate_destination;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthRequest {
    /// iperf3 server, the configured one when absent.
    #[serde(default)]
    pub server: Option<String>,
    /// Test length in seconds, the configured one when absent.
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub server: String,
    pub bandwidth_bits_per_sec: f64,
}

impl ActionsService {
    pub async fn bandwidth(&self, req: &BandwidthRequest) -> Result<Bandwidth> {
        let server = req
            .server
            .clone()
            .or_else(|| self.settings.iperf3_server.clone())
            .ok_or_else(|| {
                Error::InvalidInput("no iperf3 server given and none configured".into())
            })?;
        validate_destination(&server)?;

        let duration = match req.duration {
            Some(0) => {
                return Err(Error::InvalidInput("duration must be at least 1 second".into()));
            }
            Some(secs) => Duration::from_secs(u64::from(secs)),
            None => self.settings.bandwidth_duration,
        };

        let argv = vec![
            "iperf3".to_string(),
            "-c".to_string(),
            server.clone(),
            "-t".to_string(),
            duration.as_secs().to_string(),
            "-J".to_string(),
        ];
        let output = self
            .host
            .exec_with_timeout(&argv, duration + Duration::from_secs(2))
            .await
            .map_err(|e| e.with_context(format!("bandwidth test towards {}", server)))?;

        // iperf3 -J reports its own failures inside the JSON document.
        if !output.success() && output.stdout.trim().is_empty() {
            return Err(Error::command_failed(
                &self.host.command_line(&argv),
                output.stderr,
            )
            .with_context(format!("bandwidth test towards {}", server)));
        }

        let bandwidth_bits_per_sec = parse_iperf3(&output.stdout)?;
        Ok(Bandwidth {
            server,
            bandwidth_bits_per_sec,
        })
    }
}

/// Extract `end.sum_received.bits_per_second` from `iperf3 -J` output.
pub fn parse_iperf3(stdout: &str) -> Result<f64> {
    let report: Value = serde_json::from_str(stdout)?;
    if let Some(error) = report.get("error").and_then(Value::as_str) {
        return Err(Error::CommandFailed {
            command: "iperf3".into(),
            stderr: error.to_string(),
        });
    }
    report
        .pointer("/end/sum_received/bits_per_second")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Parse("iperf3 report has no end.sum_received.bits_per_second".into()))
}
