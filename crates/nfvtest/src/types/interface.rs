//! Interface records as reported by `ip -j -details addr`.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{Family, MacAddress, SafeName, Scope};
use crate::error::{Error, Result};

string_enum! {
    /// Operational state (`operstate`).
    pub enum InterfaceState {
        Up => "UP",
        Down => "DOWN",
        Unknown => "UNKNOWN",
        LowerLayerDown => "LOWERLAYERDOWN",
        Dormant => "DORMANT",
        NotPresent => "NOTPRESENT",
        Testing => "TESTING",
    }
}

string_enum! {
    /// Link kind (`info_kind` / `info_slave_kind`).
    pub enum LinkKind {
        Bond => "bond",
        Bridge => "bridge",
        Dummy => "dummy",
        Tun => "tun",
        Veth => "veth",
        Vlan => "vlan",
    }
}

impl Default for LinkKind {
    fn default() -> Self {
        Self::Veth
    }
}

/// Administrative state requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    Up,
    Down,
}

impl AdminState {
    /// The keyword for `ip link set`.
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// One address configured on an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddrInfo {
    pub family: Family,
    pub local: IpAddr,
    #[serde(alias = "prefixlen")]
    pub prefix_len: u8,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub broadcast: Option<IpAddr>,
    #[serde(default)]
    pub valid_life_time: Option<u64>,
    #[serde(default)]
    pub preferred_life_time: Option<u64>,
    #[serde(default, alias = "noprefixroute")]
    pub no_prefix_route: bool,
    #[serde(default, alias = "autojoin")]
    pub auto_join: bool,
    #[serde(default, alias = "nodad")]
    pub no_dad: bool,
    #[serde(default)]
    pub optimistic: bool,
    #[serde(default)]
    pub home: bool,
    #[serde(default, alias = "mngtmpaddr")]
    pub mng_tmp_addr: bool,
}

impl AddrInfo {
    /// The address with its prefix length, as `ip address add` expects it.
    pub fn interface(&self) -> Result<IpNet> {
        IpNet::new(self.local, self.prefix_len).map_err(|_| {
            Error::Parse(format!(
                "invalid prefix length {} for {}",
                self.prefix_len, self.local
            ))
        })
    }
}

/// Kind-specific link details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    #[serde(default)]
    pub info_kind: Option<LinkKind>,
    #[serde(default)]
    pub info_data: Option<Value>,
    #[serde(default)]
    pub info_slave_kind: Option<LinkKind>,
    #[serde(default)]
    pub info_slave_data: Option<Value>,
}

/// A network interface and its addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(alias = "ifindex")]
    pub if_index: u32,
    #[serde(default)]
    pub link_index: Option<u32>,
    #[serde(alias = "ifname")]
    pub if_name: SafeName,
    #[serde(default)]
    pub flags: Vec<String>,
    pub mtu: u32,
    #[serde(default)]
    pub max_mtu: Option<u32>,
    #[serde(default)]
    pub min_mtu: Option<u32>,
    #[serde(default)]
    pub master: Option<SafeName>,
    #[serde(alias = "operstate")]
    pub oper_state: InterfaceState,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub link_type: Option<String>,
    /// Link-layer address. Not always a MAC (tunnels report IP addresses).
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub broadcast: Option<String>,
    #[serde(default, alias = "link_netnsid")]
    pub link_netns_id: Option<i32>,
    #[serde(default, alias = "linkinfo")]
    pub link_info: Option<LinkInfo>,
    #[serde(default)]
    pub addr_info: Vec<AddrInfo>,
    #[serde(default, alias = "altnames")]
    pub alt_names: Vec<String>,
}

impl Interface {
    pub fn name(&self) -> &str {
        self.if_name.as_str()
    }

    /// Whether the interface is administratively up.
    pub fn is_admin_up(&self) -> bool {
        self.flags.iter().any(|f| f == "UP")
    }

    /// The link kind, if the kernel reported one.
    pub fn kind(&self) -> Option<&LinkKind> {
        self.link_info.as_ref().and_then(|l| l.info_kind.as_ref())
    }

    /// All configured addresses with their prefix length.
    ///
    /// Entries with an impossible prefix length are skipped.
    pub fn addresses(&self) -> Vec<IpNet> {
        self.addr_info
            .iter()
            .filter_map(|a| a.interface().ok())
            .collect()
    }
}

/// Request to create an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceCreate {
    pub name: SafeName,
    #[serde(default)]
    pub parent_dev: Option<SafeName>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub address: Option<MacAddress>,
    #[serde(default)]
    pub broadcast: Option<MacAddress>,
    #[serde(default, rename = "type")]
    pub kind: LinkKind,
    #[serde(default)]
    pub slave_interfaces: Option<Vec<SafeName>>,
}

impl InterfaceCreate {
    pub fn new(name: SafeName, kind: LinkKind) -> Self {
        Self {
            name,
            parent_dev: None,
            mtu: None,
            address: None,
            broadcast: None,
            kind,
            slave_interfaces: None,
        }
    }
}

/// Target of a master change: another interface or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterRef {
    Master(SafeName),
    NoMaster,
}

impl MasterRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Master(name) => name.as_str(),
            Self::NoMaster => "nomaster",
        }
    }
}

impl Serialize for MasterRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MasterRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "nomaster" {
            return Ok(Self::NoMaster);
        }
        SafeName::new(s).map(Self::Master).map_err(serde::de::Error::custom)
    }
}

/// Target namespace of a move: by name or by nsid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetnsRef {
    Id(i32),
    Name(SafeName),
}

impl std::fmt::Display for NetnsRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => f.write_str(name.as_str()),
        }
    }
}

/// Desired state for an existing interface. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceUpdate {
    #[serde(default)]
    pub name: Option<SafeName>,
    #[serde(default)]
    pub state: Option<AdminState>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub addresses: Option<Vec<IpNet>>,
    #[serde(default)]
    pub master: Option<MasterRef>,
    #[serde(default)]
    pub netns: Option<NetnsRef>,
}
