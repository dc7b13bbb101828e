//! Interface management through `ip link` and `ip address`.

use serde_json::Value;

use super::reconcile::{self, ApplyResult, InterfaceDiff};
use super::{BondInterfaceService, NamespaceService, VlanInterfaceService, parse_json_list, parse_records};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{AdminState, CommandStatus, Interface, InterfaceCreate, InterfaceUpdate, LinkKind};

/// Lists, creates, updates and deletes interfaces on one host.
#[derive(Debug, Clone)]
pub struct InterfaceService {
    host: Host,
}

impl InterfaceService {
    pub fn new(host: &Host) -> Self {
        Self { host: host.clone() }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub async fn get_all_raw(&self) -> Result<Vec<Value>> {
        let stdout = self.host.exec_checked(&["ip", "-j", "-details", "addr"]).await?;
        parse_json_list(&stdout)
    }

    pub async fn get_all(&self) -> Result<Vec<Interface>> {
        Ok(parse_records(self.get_all_raw().await?, "interface"))
    }

    /// Raw `ip -j` entry for `name`, `None` if the device does not exist.
    pub async fn get_one_raw(&self, name: &str) -> Result<Option<Value>> {
        let argv = ["ip", "-j", "-details", "addr", "show", name];
        let output = self.host.exec(&argv).await?;
        if output.has_stderr() {
            if output.stderr.contains(&format!("Device \"{}\" does not exist.", name)) {
                return Ok(None);
            }
            return Err(Error::command_failed(
                &self.host.command_line(&argv),
                output.stderr,
            ));
        }
        Ok(parse_json_list(&output.stdout)?.into_iter().next())
    }

    pub async fn get_one_or_default(&self, name: &str) -> Result<Option<Interface>> {
        match self.get_one_raw(name).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    pub async fn get_one(&self, name: &str) -> Result<Interface> {
        self.get_one_or_default(name)
            .await?
            .ok_or_else(|| Error::InterfaceNotFound {
                name: name.to_string(),
            })
    }

    /// Create an interface, dispatching bonds and VLANs to their services.
    pub async fn create(&self, req: &InterfaceCreate) -> Result<Interface> {
        match req.kind {
            LinkKind::Bond => BondInterfaceService::new(&self.host).create(req).await,
            LinkKind::Vlan => VlanInterfaceService::new(&self.host).create(req).await,
            _ => self.create_link(req).await,
        }
    }

    /// Create a plain link of `req.kind` without kind-specific setup.
    pub async fn create_link(&self, req: &InterfaceCreate) -> Result<Interface> {
        if self.get_one_or_default(req.name.as_str()).await?.is_some() {
            return Err(Error::Conflict(format!(
                "an interface named {} already exists",
                req.name
            )));
        }

        let mut argv: Vec<String> = ["ip", "link", "add", "name", req.name.as_str()]
            .map(String::from)
            .to_vec();
        if let Some(parent) = &req.parent_dev {
            argv.extend(["link".to_string(), parent.to_string()]);
        }
        argv.extend(link_attributes(req));
        argv.extend(["type".to_string(), req.kind.to_string()]);

        self.host
            .exec_checked(&argv)
            .await
            .map_err(|e| e.with_context(format!("create interface {}", req.name)))?;
        tracing::info!(interface = %req.name, kind = %req.kind, "created interface");

        self.expect_present(req.name.as_str()).await
    }

    /// Delete an interface. Deleting a missing interface is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        if self.get_one_or_default(name).await?.is_none() {
            return Ok(());
        }

        self.host
            .exec_checked(&["ip", "link", "del", name])
            .await
            .map_err(|e| e.with_context(format!("delete interface {}", name)))?;

        if self.get_one_or_default(name).await?.is_some() {
            return Err(Error::Unexpected(format!(
                "interface {} should have been deleted but is still present",
                name
            )));
        }
        tracing::info!(interface = %name, "deleted interface");
        Ok(())
    }

    /// Compute the changes an update would make, without applying them.
    pub async fn plan(&self, name: &str, update: &InterfaceUpdate) -> Result<InterfaceDiff> {
        let observed = self.get_one(name).await?;
        let mut diff = reconcile::compute_diff(&observed, update);
        self.resolve_move(&mut diff).await?;
        Ok(diff)
    }

    /// Resolve the move target of `diff` to a namespace name.
    ///
    /// A move into the namespace this service runs in is dropped from the
    /// diff, as a rename to the current name is.
    async fn resolve_move(&self, diff: &mut InterfaceDiff) -> Result<Option<String>> {
        let Some(target) = &diff.move_to else {
            return Ok(None);
        };
        let ns = NamespaceService::new(&self.host).resolve(target).await?;
        if Some(ns.as_str()) == self.host.namespace() {
            diff.move_to = None;
            return Ok(None);
        }
        Ok(Some(ns))
    }

    /// Converge interface `name` towards `update`.
    ///
    /// Preconditions (interface exists, move target exists, no name
    /// collision) are checked before anything is changed. Steps that ran
    /// before a failing command are not rolled back.
    pub async fn update(&self, name: &str, update: &InterfaceUpdate) -> Result<Interface> {
        let observed = self.get_one(name).await?;
        let mut diff = reconcile::compute_diff(&observed, update);
        let target_ns = self.resolve_move(&mut diff).await?;
        let final_host = match &target_ns {
            Some(ns) => self.host.in_namespace(ns),
            None => self.host.clone(),
        };

        let final_name = diff.final_name().to_string();
        if let Some(new_name) = &diff.rename
            && self.get_one_or_default(new_name.as_str()).await?.is_some()
        {
            return Err(Error::Conflict(format!(
                "can not rename {} to {}: the name is taken",
                name, new_name
            )));
        }
        if target_ns.is_some()
            && InterfaceService::new(&final_host)
                .get_one_or_default(&final_name)
                .await?
                .is_some()
        {
            return Err(Error::Conflict(format!(
                "can not move {}: an interface named {} exists in the target namespace",
                name, final_name
            )));
        }

        let result: ApplyResult =
            reconcile::apply_diff(&self.host, &diff, target_ns.as_deref()).await?;
        if result.changes_made > 0 {
            tracing::info!(
                interface = %name,
                changes = result.changes_made,
                "updated interface:\n{}",
                result.summary_text()
            );
        }

        InterfaceService::new(&final_host).expect_present(&final_name).await
    }

    /// Set the administrative state of `name`.
    pub async fn set_state(&self, name: &str, state: AdminState) -> Result<()> {
        self.host
            .exec_checked(&["ip", "link", "set", "dev", name, state.as_arg()])
            .await
            .map_err(|e| e.with_context(format!("set {} {}", name, state.as_arg())))?;
        Ok(())
    }

    /// Attach `name` to `master`, or detach it with `"nomaster"`.
    pub async fn set_master(&self, name: &str, master: &str) -> Result<()> {
        let argv: Vec<&str> = if master == "nomaster" {
            vec!["ip", "link", "set", "dev", name, "nomaster"]
        } else {
            vec!["ip", "link", "set", "dev", name, "master", master]
        };
        self.host
            .exec_checked(&argv)
            .await
            .map_err(|e| e.with_context(format!("set master of {} to {}", name, master)))?;
        Ok(())
    }

    pub async fn status(&self) -> Result<CommandStatus> {
        self.host.status(&["ip", "-details", "addr"]).await
    }

    /// Re-read an interface that a command just created or changed.
    pub(crate) async fn expect_present(&self, name: &str) -> Result<Interface> {
        self.get_one_or_default(name).await?.ok_or_else(|| {
            Error::Unexpected(format!(
                "interface {} should exist but can not be found",
                name
            ))
        })
    }
}

/// Optional `address`, `broadcast` and `mtu` arguments of `ip link add`.
pub(crate) fn link_attributes(req: &InterfaceCreate) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(address) = &req.address {
        args.extend(["address".to_string(), address.to_string()]);
    }
    if let Some(broadcast) = &req.broadcast {
        args.extend(["broadcast".to_string(), broadcast.to_string()]);
    }
    if let Some(mtu) = req.mtu {
        args.extend(["mtu".to_string(), mtu.to_string()]);
    }
    args
}
