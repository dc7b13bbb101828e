//! Typed records for host network state and API payloads.
//!
//! Records parsed from `ip -j` output accept both the kernel-style keys
//! (`ifindex`, `operstate`, `prefixlen`, ...) and their spelled-out names,
//! and always serialize with the spelled-out names.

/// Define a string-backed enum that keeps unknown values.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this crate does not know about.
            Other(String),
        }

        impl $name {
            /// The textual form used by iproute2.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod common;
pub mod interface;
pub mod namespace;
pub mod ping;
pub mod route;

pub use common::{CommandStatus, Family, Hostname, MacAddress, SafeName, Scope};
pub use interface::{
    AddrInfo, AdminState, Interface, InterfaceCreate, InterfaceState, InterfaceUpdate, LinkInfo,
    LinkKind, MasterRef, NetnsRef,
};
pub use namespace::{Namespace, NamespaceCreate};
pub use ping::{Ping, PingRequest};
pub use route::{Route, RouteCreate, RouteDst, RouteUpdate};
