//! 802.1Q VLAN sub-interfaces.

use super::InterfaceService;
use super::link::link_attributes;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{Interface, InterfaceCreate, LinkKind};

/// Creates VLAN interfaces named `<parent>.<vlan id>`.
#[derive(Debug, Clone)]
pub struct VlanInterfaceService {
    interfaces: InterfaceService,
}

impl VlanInterfaceService {
    pub fn new(host: &Host) -> Self {
        Self {
            interfaces: InterfaceService::new(host),
        }
    }

    pub async fn create(&self, req: &InterfaceCreate) -> Result<Interface> {
        if req.kind != LinkKind::Vlan {
            return Err(Error::InvalidInput(format!(
                "a vlan interface must have type vlan, got {}",
                req.kind
            )));
        }

        let parent = req.parent_dev.as_ref().ok_or_else(|| {
            Error::InvalidInput("a vlan interface needs a parent_dev".into())
        })?;

        if self
            .interfaces
            .get_one_or_default(req.name.as_str())
            .await?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "an interface named {} already exists",
                req.name
            )));
        }

        self.interfaces.get_one(parent.as_str()).await?;

        let vlan_id = vlan_id(req.name.as_str(), parent.as_str())?;

        let mut argv: Vec<String> = [
            "ip",
            "link",
            "add",
            "name",
            req.name.as_str(),
            "link",
            parent.as_str(),
        ]
        .map(String::from)
        .to_vec();
        argv.extend(link_attributes(req));
        argv.extend(["type", "vlan", "id"].map(String::from));
        argv.push(vlan_id.to_string());

        self.interfaces
            .host()
            .exec_checked(&argv)
            .await
            .map_err(|e| e.with_context(format!("create vlan interface {}", req.name)))?;
        tracing::info!(interface = %req.name, parent = %parent, vlan_id, "created vlan interface");

        self.interfaces.expect_present(req.name.as_str()).await
    }
}

/// Extract the VLAN id from a name of the form `<parent>.<vlan id>`.
pub fn vlan_id(name: &str, parent: &str) -> Result<u16> {
    let invalid = || {
        Error::InvalidInput(format!(
            "a vlan interface must be named <parent_dev>.<vlan_id>, got {} for parent {}",
            name, parent
        ))
    };
    let id = name
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(invalid)?;
    match id.parse::<u16>() {
        Ok(id) if (1..4095).contains(&id) => Ok(id),
        _ => Err(invalid()),
    }
}
