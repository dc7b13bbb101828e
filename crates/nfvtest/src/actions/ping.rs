//! `ping` and its statistics parser.

use std::time::Duration;

use super::ActionsService;
use crate::error::{Error, Result};
use crate::types::{Ping, PingRequest};

impl ActionsService {
    /// Ping `req.destination` and parse the summary.
    ///
    /// Output on stderr is only fatal when ping printed nothing on stdout;
    /// otherwise it is logged and the statistics are still parsed.
    pub async fn ping(&self, req: &PingRequest) -> Result<Ping> {
        req.validate()?;

        let mut argv = vec![
            "ping".to_string(),
            "-c".to_string(),
            req.count.to_string(),
            "-w".to_string(),
            req.timeout.to_string(),
            "-i".to_string(),
            req.interval.to_string(),
        ];
        if let Some(iface) = &req.interface {
            argv.extend(["-I".to_string(), iface.clone()]);
        }
        argv.push(req.destination.clone());

        let budget = Duration::from_secs(u64::from(req.timeout) + 2);
        let output = self.host.exec_with_timeout(&argv, budget).await?;

        if output.has_stderr() {
            if output.stdout.trim().is_empty() {
                return Err(Error::command_failed(
                    &self.host.command_line(&argv),
                    output.stderr,
                ));
            }
            tracing::warn!(destination = %req.destination, stderr = %output.stderr.trim_end(), "ping reported errors");
        }

        parse_ping(&req.destination, &output.stdout).inspect_err(|_| {
            tracing::error!(stdout = %output.stdout, "failed to parse ping output");
        })
    }
}

/// Parse the statistics block printed by iputils or busybox ping.
pub fn parse_ping(destination: &str, stdout: &str) -> Result<Ping> {
    let stats = stdout
        .lines()
        .find(|l| l.contains("packets transmitted"))
        .ok_or_else(|| Error::Parse("no packet statistics in ping output".into()))?;

    let mut transmit = None;
    let mut receive = None;
    let mut duplicates = 0;
    for part in stats.split(',') {
        let part = part.trim();
        let mut words = part.split_whitespace();
        let (Some(first), Some(second)) = (words.next(), words.next()) else {
            continue;
        };
        match (second, first.strip_prefix('+')) {
            ("packets", None) if part.ends_with("transmitted") => {
                transmit = Some(parse_count(first)?);
            }
            ("received", None) => receive = Some(parse_count(first)?),
            ("packets", None) if part.ends_with("received") => {
                receive = Some(parse_count(first)?);
            }
            (_, Some(n)) if second.starts_with("duplicate") => {
                duplicates = parse_count(n)?;
            }
            _ => {}
        }
    }

    let packet_transmit =
        transmit.ok_or_else(|| Error::Parse(format!("no transmitted count in {:?}", stats)))?;
    let packet_receive =
        receive.ok_or_else(|| Error::Parse(format!("no received count in {:?}", stats)))?;

    let packet_loss_count = packet_transmit.saturating_sub(packet_receive);
    let packet_loss_rate = if packet_transmit > 0 {
        f64::from(packet_loss_count) * 100.0 / f64::from(packet_transmit)
    } else {
        0.0
    };
    let packet_duplicate_rate =
        (packet_receive > 0).then(|| f64::from(duplicates) * 100.0 / f64::from(packet_receive));

    let rtt = stdout
        .lines()
        .find(|l| l.starts_with("rtt ") || l.starts_with("round-trip "))
        .map(parse_rtt)
        .transpose()?
        .unwrap_or_default();

    Ok(Ping {
        destination: destination.to_string(),
        packet_transmit,
        packet_receive,
        packet_loss_count,
        packet_loss_rate,
        packet_duplicate_count: duplicates,
        packet_duplicate_rate,
        rtt_min: rtt.first().copied(),
        rtt_avg: rtt.get(1).copied(),
        rtt_max: rtt.get(2).copied(),
        rtt_mdev: rtt.get(3).copied(),
    })
}

fn parse_count(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| Error::Parse(format!("invalid packet count {:?}", s)))
}

/// Parse `rtt min/avg/max/mdev = 0.045/0.061/0.082/0.013 ms`.
fn parse_rtt(line: &str) -> Result<Vec<f64>> {
    let values = line
        .split_once('=')
        .map(|(_, v)| v.trim())
        .ok_or_else(|| Error::Parse(format!("invalid rtt line {:?}", line)))?;
    let values = values.split_whitespace().next().unwrap_or_default();
    values
        .split('/')
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| Error::Parse(format!("invalid rtt value {:?}", v)))
        })
        .collect()
}
