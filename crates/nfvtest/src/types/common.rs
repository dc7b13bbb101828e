//! Validated names and small shared records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of a [`SafeName`].
pub const SAFE_NAME_MAX: usize = 16;

/// A name that is safe to pass as a single argv element to `ip`.
///
/// 1 to 16 characters out of `[0-9A-Za-z@#$_-.]`. Used for namespace,
/// interface, label and master names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SafeName(String);

impl SafeName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > SAFE_NAME_MAX {
            return Err(Error::InvalidInput(format!(
                "name {:?} must be 1 to {} characters long",
                name, SAFE_NAME_MAX
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "@#$_-.".contains(*c)))
        {
            return Err(Error::InvalidInput(format!(
                "name {:?} contains invalid character {:?}",
                name, c
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A colon-separated 48-bit link-layer address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let parts: Vec<&str> = addr.split(':').collect();
        let valid = parts.len() == 6
            && parts
                .iter()
                .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(Error::InvalidInput(format!(
                "{:?} is not a MAC address",
                addr
            )));
        }
        Ok(Self(addr.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An RFC 1123 host name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= 253
            && name.split('.').all(|label| {
                !label.is_empty()
                    && label.len() <= 63
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        if !valid {
            return Err(Error::InvalidInput(format!(
                "{:?} is not a valid host name",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($($name:ident),+) => {$(
        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                Self::new(s)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    )+};
}

string_newtype_impls!(SafeName, MacAddress, Hostname);

string_enum! {
    /// Address or route scope.
    pub enum Scope {
        Global => "global",
        Site => "site",
        Link => "link",
        Host => "host",
        Nowhere => "nowhere",
    }
}

string_enum! {
    /// Address family.
    pub enum Family {
        Inet => "inet",
        Inet6 => "inet6",
        Bridge => "bridge",
        Mpls => "mpls",
        Link => "link",
    }
}

/// Raw output of a diagnostic command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
}
