//! Interface diff application.
//!
//! This module turns an [`InterfaceDiff`] into `ip link` and `ip address`
//! commands and runs them in order.

use super::diff::InterfaceDiff;
use crate::error::Result;
use crate::host::Host;
use crate::types::AdminState;

/// Result of applying an interface diff.
#[derive(Debug, Default)]
pub struct ApplyResult {
    /// Number of commands that ran.
    pub changes_made: usize,
    /// What was done, one line per command.
    pub summary: Vec<String>,
}

impl ApplyResult {
    /// Get a human-readable summary.
    pub fn summary_text(&self) -> String {
        if self.summary.is_empty() {
            "No changes made".to_string()
        } else {
            self.summary.join("\n")
        }
    }

    async fn run(&mut self, host: &Host, operation: String, argv: &[&str]) -> Result<()> {
        match host.exec_checked(argv).await {
            Ok(_) => {
                tracing::debug!(%operation, "applied");
                self.summary.push(operation);
                self.changes_made += 1;
                Ok(())
            }
            Err(e) => {
                if self.changes_made > 0 {
                    tracing::warn!(
                        failed = %operation,
                        "interface update stopped part way, these steps stay applied:\n{}",
                        self.summary_text()
                    );
                }
                Err(e.with_context(operation))
            }
        }
    }
}

/// Apply a diff to the interface it was computed for.
///
/// Commands run in this order: MTU, master, state, address removals,
/// address additions, rename, namespace move. A rename or a move of an
/// interface that is up is wrapped in a down/up pair, the final up
/// running in `target_ns` after a move.
///
/// The first failing command aborts the whole update. Nothing that already
/// ran is undone.
pub async fn apply_diff(
    host: &Host,
    diff: &InterfaceDiff,
    target_ns: Option<&str>,
) -> Result<ApplyResult> {
    let mut result = ApplyResult::default();

    if diff.is_empty() {
        return Ok(result);
    }

    let name = diff.name.as_str();

    // 1. Link attributes, always re-applied when requested
    if let Some(mtu) = diff.set_mtu {
        let mtu = mtu.to_string();
        result
            .run(
                host,
                format!("set mtu of {} to {}", name, mtu),
                &["ip", "link", "set", "dev", name, "mtu", &mtu],
            )
            .await?;
    }

    if let Some(master) = &diff.set_master {
        let master = master.as_str();
        let argv: Vec<&str> = if master == "nomaster" {
            vec!["ip", "link", "set", "dev", name, "nomaster"]
        } else {
            vec!["ip", "link", "set", "dev", name, "master", master]
        };
        result
            .run(host, format!("set master of {} to {}", name, master), &argv)
            .await?;
    }

    if let Some(state) = diff.set_state {
        result
            .run(
                host,
                format!("set {} {}", name, state.as_arg()),
                &["ip", "link", "set", "dev", name, state.as_arg()],
            )
            .await?;
    }

    // 2. Addresses
    for addr in &diff.addresses_to_remove {
        let addr = addr.to_string();
        result
            .run(
                host,
                format!("remove address {} from {}", addr, name),
                &["ip", "address", "del", &addr, "dev", name],
            )
            .await?;
    }

    for addr in &diff.addresses_to_add {
        let addr = addr.to_string();
        result
            .run(
                host,
                format!("add address {} to {}", addr, name),
                &["ip", "address", "add", &addr, "dev", name],
            )
            .await?;
    }

    // 3. Identity changes, which need the link down
    if diff.rename.is_none() && target_ns.is_none() {
        return Ok(result);
    }

    let needs_down = diff.needs_down();
    if needs_down {
        result
            .run(
                host,
                format!("set {} down", name),
                &["ip", "link", "set", "dev", name, "down"],
            )
            .await?;
    }

    if let Some(new_name) = &diff.rename {
        result
            .run(
                host,
                format!("rename {} to {}", name, new_name),
                &["ip", "link", "set", "dev", name, "name", new_name.as_str()],
            )
            .await?;
    }

    let name = diff.final_name();
    let final_host = match target_ns {
        Some(ns) => {
            result
                .run(
                    host,
                    format!("move {} to namespace {}", name, ns),
                    &["ip", "link", "set", "dev", name, "netns", ns],
                )
                .await?;
            host.in_namespace(ns)
        }
        None => host.clone(),
    };

    if needs_down {
        let up = AdminState::Up.as_arg();
        result
            .run(
                &final_host,
                format!("set {} {}", name, up),
                &["ip", "link", "set", "dev", name, up],
            )
            .await?;
    }

    Ok(result)
}
