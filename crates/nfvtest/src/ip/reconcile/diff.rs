//! Interface state diffing.
//!
//! This module computes the difference between the desired state of an
//! interface and the state observed through `ip -j -details addr`.

use std::collections::HashSet;

use ipnet::IpNet;

use crate::types::{AdminState, Interface, InterfaceUpdate, MasterRef, NetnsRef, SafeName};

/// Changes needed to bring one interface to its desired state.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDiff {
    /// Current name of the interface.
    pub name: String,
    /// New MTU value.
    pub set_mtu: Option<u32>,
    /// New master, or detach.
    pub set_master: Option<MasterRef>,
    /// New administrative state.
    pub set_state: Option<AdminState>,
    /// Addresses to remove.
    pub addresses_to_remove: Vec<IpNet>,
    /// Addresses to add.
    pub addresses_to_add: Vec<IpNet>,
    /// New interface name.
    pub rename: Option<SafeName>,
    /// Namespace to move the interface into.
    pub move_to: Option<NetnsRef>,
    /// Whether the interface is administratively up once `set_state` ran.
    pub up_after_state: bool,
}

impl InterfaceDiff {
    /// Check if no changes are needed.
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        usize::from(self.set_mtu.is_some())
            + usize::from(self.set_master.is_some())
            + usize::from(self.set_state.is_some())
            + self.addresses_to_remove.len()
            + self.addresses_to_add.len()
            + usize::from(self.rename.is_some())
            + usize::from(self.move_to.is_some())
    }

    /// Name of the interface once the diff is applied.
    pub fn final_name(&self) -> &str {
        self.rename
            .as_ref()
            .map(|n| n.as_str())
            .unwrap_or(&self.name)
    }

    /// Whether the interface must be taken down for a rename or a move.
    pub fn needs_down(&self) -> bool {
        self.up_after_state && (self.rename.is_some() || self.move_to.is_some())
    }

    /// Get a human-readable summary of the changes.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(mtu) = self.set_mtu {
            lines.push(format!("~ link {} mtu={}", self.name, mtu));
        }
        if let Some(master) = &self.set_master {
            lines.push(format!("~ link {} master={}", self.name, master.as_str()));
        }
        if let Some(state) = self.set_state {
            lines.push(format!("~ link {} {}", self.name, state.as_arg()));
        }
        for addr in &self.addresses_to_remove {
            lines.push(format!("- address {} on {}", addr, self.name));
        }
        for addr in &self.addresses_to_add {
            lines.push(format!("+ address {} on {}", addr, self.name));
        }
        if let Some(new_name) = &self.rename {
            lines.push(format!("~ link {} name={}", self.name, new_name));
        }
        if let Some(target) = &self.move_to {
            lines.push(format!("~ link {} netns={}", self.final_name(), target));
        }

        if lines.is_empty() {
            "No changes needed".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Compute the diff between the observed interface and the desired state.
///
/// Addresses are diffed as sets. MTU, master and state are carried over
/// whenever present, without comparing them to the observed values. A
/// rename to the current name is dropped.
pub fn compute_diff(observed: &Interface, desired: &InterfaceUpdate) -> InterfaceDiff {
    let (addresses_to_remove, addresses_to_add) = match &desired.addresses {
        Some(wanted) => diff_addresses(&observed.addresses(), wanted),
        None => (Vec::new(), Vec::new()),
    };

    let rename = desired
        .name
        .as_ref()
        .filter(|n| n.as_str() != observed.name())
        .cloned();

    let up_after_state = match desired.state {
        Some(state) => state == AdminState::Up,
        None => observed.is_admin_up(),
    };

    InterfaceDiff {
        name: observed.name().to_string(),
        set_mtu: desired.mtu,
        set_master: desired.master.clone(),
        set_state: desired.state,
        addresses_to_remove,
        addresses_to_add,
        rename,
        move_to: desired.netns.clone(),
        up_after_state,
    }
}

/// Return `(existing - desired, desired - existing)`, keeping input order.
pub fn diff_addresses(existing: &[IpNet], desired: &[IpNet]) -> (Vec<IpNet>, Vec<IpNet>) {
    let existing_set: HashSet<&IpNet> = existing.iter().collect();
    let desired_set: HashSet<&IpNet> = desired.iter().collect();

    let mut seen = HashSet::new();
    let to_remove = existing
        .iter()
        .filter(|a| !desired_set.contains(a))
        .filter(|a| seen.insert(**a))
        .copied()
        .collect();

    let mut seen = HashSet::new();
    let to_add = desired
        .iter()
        .filter(|a| !existing_set.contains(a))
        .filter(|a| seen.insert(**a))
        .copied()
        .collect();

    (to_remove, to_add)
}
