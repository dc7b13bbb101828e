//! Bond interfaces in 802.3ad mode.

use super::InterfaceService;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{AdminState, Interface, InterfaceCreate, LinkKind};

/// `mode` value selecting 802.3ad link aggregation.
const MODE_8023AD: u8 = 4;

/// Creates bonds and enslaves their members.
#[derive(Debug, Clone)]
pub struct BondInterfaceService {
    interfaces: InterfaceService,
}

impl BondInterfaceService {
    pub fn new(host: &Host) -> Self {
        Self {
            interfaces: InterfaceService::new(host),
        }
    }

    /// Create a bond from `req.slave_interfaces`.
    ///
    /// The bond is created down, each member is detached from any previous
    /// master, the mode is set to 802.3ad, the members are enslaved and
    /// brought up, and finally the bond is brought up.
    pub async fn create(&self, req: &InterfaceCreate) -> Result<Interface> {
        if req.kind != LinkKind::Bond {
            return Err(Error::InvalidInput(format!(
                "a bond interface must have type bond, got {}",
                req.kind
            )));
        }

        let slaves = match &req.slave_interfaces {
            Some(slaves) if !slaves.is_empty() => slaves,
            _ => {
                return Err(Error::InvalidInput(
                    "a bond interface needs slave_interfaces".into(),
                ));
            }
        };

        // Members must exist before anything is created.
        for slave in slaves {
            self.interfaces.get_one(slave.as_str()).await?;
        }

        let bond = self.interfaces.create_link(req).await?;
        let name = bond.name();

        self.interfaces.set_state(name, AdminState::Down).await?;
        for slave in slaves {
            self.interfaces
                .set_state(slave.as_str(), AdminState::Down)
                .await?;
            self.interfaces.set_master(slave.as_str(), "nomaster").await?;
        }

        // The name is passed as $1 so the shell never expands it.
        let script = format!("echo {} > /sys/class/net/\"$1\"/bonding/mode", MODE_8023AD);
        self.interfaces
            .host()
            .exec_checked(&["sh", "-c", script.as_str(), "sh", name])
            .await
            .map_err(|e| e.with_context(format!("set bonding mode of {}", name)))?;

        for slave in slaves {
            self.interfaces.set_master(slave.as_str(), name).await?;
            self.interfaces.set_state(slave.as_str(), AdminState::Up).await?;
        }
        self.interfaces.set_state(name, AdminState::Up).await?;

        tracing::info!(bond = %name, members = slaves.len(), "created 802.3ad bond");
        self.interfaces.expect_present(name).await
    }
}
