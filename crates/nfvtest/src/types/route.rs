//! Route records as reported by `ip -j -details route`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::common::{SafeName, Scope};
use crate::error::{Error, Result};

/// A route destination: `default` or a network.
///
/// Networks are stored truncated to their prefix, and host routes printed by
/// iproute2 without a prefix length read as `/32` or `/128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RouteDst {
    Default,
    Net(IpNet),
}

impl RouteDst {
    /// Build a destination from the two halves used in URL paths.
    ///
    /// The prefix length is mandatory for addresses and forbidden for `default`.
    pub fn from_parts(dst_addr: &str, dst_prefix_len: Option<u8>) -> Result<Self> {
        match (dst_addr, dst_prefix_len) {
            ("default", None) => Ok(Self::Default),
            ("default", Some(_)) => Err(Error::InvalidInput(
                "a prefix length can not be combined with the default destination".into(),
            )),
            (_, None) => Err(Error::InvalidInput(format!(
                "destination {} needs a prefix length",
                dst_addr
            ))),
            (addr, Some(len)) => {
                let addr: IpAddr = addr
                    .parse()
                    .map_err(|_| Error::InvalidInput(format!("{:?} is not an IP address", addr)))?;
                let net = IpNet::new(addr, len).map_err(|_| {
                    Error::InvalidInput(format!("invalid prefix length {} for {}", len, addr))
                })?;
                Ok(Self::Net(net.trunc()))
            }
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl FromStr for RouteDst {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "default" {
            return Ok(Self::Default);
        }
        if let Ok(net) = s.parse::<IpNet>() {
            return Ok(Self::Net(net.trunc()));
        }
        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(Self::Net(IpNet::from(addr)));
        }
        Err(Error::InvalidInput(format!(
            "{:?} is not a route destination",
            s
        )))
    }
}

impl TryFrom<String> for RouteDst {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RouteDst> for String {
    fn from(dst: RouteDst) -> String {
        dst.to_string()
    }
}

impl fmt::Display for RouteDst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Net(net) => write!(f, "{}", net),
        }
    }
}

/// A route in the main table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "type", default)]
    pub route_type: Option<String>,
    pub dst: RouteDst,
    #[serde(default)]
    pub gateway: Option<IpAddr>,
    #[serde(default)]
    pub dev: Option<SafeName>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default, alias = "prefsrc")]
    pub pref_src: Option<IpAddr>,
    #[serde(default)]
    pub metric: Option<u32>,
}

/// Request to add a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCreate {
    pub dst: RouteDst,
    #[serde(default)]
    pub gateway: Option<IpAddr>,
    pub dev: SafeName,
}

/// Request to replace the next hop of an existing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteUpdate {
    #[serde(default)]
    pub gateway: Option<IpAddr>,
    pub dev: SafeName,
}
