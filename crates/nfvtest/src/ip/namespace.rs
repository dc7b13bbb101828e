//! Network namespace management through `ip netns`.

use serde_json::Value;

use super::{parse_json_list, parse_records};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{CommandStatus, Namespace, NamespaceCreate, NetnsRef};

const LIST: [&str; 5] = ["ip", "-j", "-details", "netns", "list-id"];

/// Lists, creates and deletes named namespaces.
///
/// Always operates from the root namespace, whatever host it is given.
#[derive(Debug, Clone)]
pub struct NamespaceService {
    host: Host,
}

impl NamespaceService {
    pub fn new(host: &Host) -> Self {
        Self { host: host.root() }
    }

    pub async fn get_all_raw(&self) -> Result<Vec<Value>> {
        let stdout = self.host.exec_checked(&LIST).await?;
        parse_json_list(&stdout)
    }

    pub async fn get_all(&self) -> Result<Vec<Namespace>> {
        Ok(parse_records(self.get_all_raw().await?, "namespace"))
    }

    pub async fn get_one_or_default(&self, name: &str) -> Result<Option<Namespace>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|ns| ns.name.as_ref().is_some_and(|n| n == name)))
    }

    pub async fn get_one(&self, name: &str) -> Result<Namespace> {
        self.get_one_or_default(name)
            .await?
            .ok_or_else(|| Error::NamespaceNotFound {
                name: name.to_string(),
            })
    }

    /// Create a namespace and assign it an nsid.
    ///
    /// Fails with a conflict when the name exists or the requested nsid is taken.
    pub async fn create(&self, req: &NamespaceCreate) -> Result<Namespace> {
        let existing = self.get_all().await?;
        if existing.iter().any(|ns| ns.name.as_ref() == Some(&req.name)) {
            return Err(Error::Conflict(format!(
                "a namespace named {} already exists",
                req.name
            )));
        }
        if let Some(id) = req.ns_id
            && existing.iter().any(|ns| i64::from(ns.ns_id) == i64::from(id))
        {
            return Err(Error::Conflict(format!(
                "namespace id {} is already in use",
                id
            )));
        }

        self.host
            .exec_checked(&["ip", "netns", "add", req.name.as_str()])
            .await
            .map_err(|e| e.with_context(format!("create namespace {}", req.name)))?;

        let id = req
            .ns_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "auto".to_string());
        self.host
            .exec_checked(&["ip", "netns", "set", req.name.as_str(), id.as_str()])
            .await
            .map_err(|e| e.with_context(format!("assign id to namespace {}", req.name)))?;

        tracing::info!(namespace = %req.name, id = %id, "created namespace");

        self.get_one_or_default(req.name.as_str())
            .await?
            .ok_or_else(|| {
                Error::Unexpected(format!(
                    "namespace {} was created but can not be found",
                    req.name
                ))
            })
    }

    /// Namespaces have nothing to update.
    pub async fn update(&self, name: &str) -> Result<Namespace> {
        Err(Error::NotSupported(format!("updating namespace {}", name)))
    }

    /// Delete a namespace. Deleting a missing namespace is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        if self.get_one_or_default(name).await?.is_none() {
            return Ok(());
        }

        self.host
            .exec_checked(&["ip", "netns", "del", name])
            .await
            .map_err(|e| e.with_context(format!("delete namespace {}", name)))?;

        if self.get_one_or_default(name).await?.is_some() {
            return Err(Error::Unexpected(format!(
                "namespace {} should have been deleted but is still present",
                name
            )));
        }
        tracing::info!(namespace = %name, "deleted namespace");
        Ok(())
    }

    /// Resolve a move target to a namespace name, checking it exists.
    pub async fn resolve(&self, target: &NetnsRef) -> Result<String> {
        let all = self.get_all().await?;
        let found = match target {
            NetnsRef::Id(id) => all.into_iter().find(|ns| ns.ns_id == *id),
            NetnsRef::Name(name) => all
                .into_iter()
                .find(|ns| ns.name.as_ref() == Some(name)),
        };
        found
            .and_then(|ns| ns.name)
            .map(|name| name.to_string())
            .ok_or_else(|| Error::NamespaceNotFound {
                name: target.to_string(),
            })
    }

    pub async fn status(&self) -> Result<CommandStatus> {
        self.host.status(&["ip", "-details", "netns", "list-id"]).await
    }
}
