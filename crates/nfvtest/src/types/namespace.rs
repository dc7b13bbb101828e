//! Network namespace records.

use serde::{Deserialize, Serialize};

use super::common::SafeName;

/// A namespace with an nsid assigned in the root namespace.
///
/// Parsed from `ip -j netns list-id`; `name` is absent for ids whose
/// namespace was not created through `ip netns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(default)]
    pub name: Option<SafeName>,
    #[serde(alias = "nsid")]
    pub ns_id: i32,
}

/// Request to create a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceCreate {
    pub name: SafeName,
    /// Explicit nsid; allocated by the kernel when absent.
    #[serde(default)]
    pub ns_id: Option<u32>,
}
