//! Services over `ip` for namespaces, interfaces and routes.
//!
//! Each service wraps a [`Host`](crate::Host) and turns typed requests into
//! `ip` invocations, reading state back with `ip -j` and parsing it into the
//! records in [`crate::types`].

pub mod bond;
pub mod link;
pub mod namespace;
pub mod reconcile;
pub mod route;
pub mod vlan;

pub use bond::BondInterfaceService;
pub use link::InterfaceService;
pub use namespace::NamespaceService;
pub use route::RouteService;
pub use vlan::VlanInterfaceService;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Parse the JSON array printed by `ip -j`. Empty output is an empty list.
pub(crate) fn parse_json_list(stdout: &str) -> Result<Vec<Value>> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(stdout)? {
        Value::Array(items) => Ok(items),
        other => Err(Error::Parse(format!(
            "expected a JSON list from ip, got {}",
            other
        ))),
    }
}

/// Convert raw entries, logging and skipping those that do not fit `T`.
pub(crate) fn parse_records<T: DeserializeOwned>(raw: Vec<Value>, kind: &str) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!(%value, error = %e, "failed to parse {}, skipping it", kind);
                None
            }
        })
        .collect()
}
