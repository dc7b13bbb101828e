//! Route management through `ip route`.

use serde_json::Value;

use super::{parse_json_list, parse_records};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::types::{CommandStatus, Route, RouteCreate, RouteDst, RouteUpdate};

/// Lists, adds, replaces and deletes routes in the main table.
#[derive(Debug, Clone)]
pub struct RouteService {
    host: Host,
}

impl RouteService {
    pub fn new(host: &Host) -> Self {
        Self { host: host.clone() }
    }

    pub async fn get_all_raw(&self) -> Result<Vec<Value>> {
        let stdout = self
            .host
            .exec_checked(&["ip", "-j", "-details", "route"])
            .await?;
        parse_json_list(&stdout)
    }

    pub async fn get_all(&self) -> Result<Vec<Route>> {
        Ok(parse_records(self.get_all_raw().await?, "route"))
    }

    pub async fn get_one_or_default(&self, dst: &RouteDst) -> Result<Option<Route>> {
        let dst = dst.to_string();
        let stdout = self
            .host
            .exec_checked(&["ip", "-j", "-details", "route", "show", dst.as_str()])
            .await?;
        let raw = parse_json_list(&stdout)?;
        Ok(parse_records(raw, "route").into_iter().next())
    }

    pub async fn get_one(&self, dst: &RouteDst) -> Result<Route> {
        self.get_one_or_default(dst)
            .await?
            .ok_or_else(|| Error::RouteNotFound {
                destination: dst.to_string(),
            })
    }

    /// Add a route. Fails with a conflict when one exists for `req.dst`.
    pub async fn create(&self, req: &RouteCreate) -> Result<Route> {
        if self.get_one_or_default(&req.dst).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a route to {} already exists",
                req.dst
            )));
        }

        let argv = route_argv("add", &req.dst, req.gateway.as_ref(), req.dev.as_str());
        self.host
            .exec_checked(&argv)
            .await
            .map_err(|e| e.with_context(format!("add route to {}", req.dst)))?;
        tracing::info!(dst = %req.dst, dev = %req.dev, "added route");

        self.expect_present(&req.dst).await
    }

    /// Replace the next hop of an existing route.
    pub async fn update(&self, dst: &RouteDst, req: &RouteUpdate) -> Result<Route> {
        self.get_one(dst).await?;

        let argv = route_argv("replace", dst, req.gateway.as_ref(), req.dev.as_str());
        self.host
            .exec_checked(&argv)
            .await
            .map_err(|e| e.with_context(format!("replace route to {}", dst)))?;
        tracing::info!(dst = %dst, dev = %req.dev, "replaced route");

        self.expect_present(dst).await
    }

    /// Delete a route. Deleting a missing route is not an error.
    pub async fn delete(&self, dst: &RouteDst) -> Result<()> {
        if self.get_one_or_default(dst).await?.is_none() {
            return Ok(());
        }

        let dst_arg = dst.to_string();
        self.host
            .exec_checked(&["ip", "route", "del", dst_arg.as_str()])
            .await
            .map_err(|e| e.with_context(format!("delete route to {}", dst)))?;
        tracing::info!(dst = %dst, "deleted route");
        Ok(())
    }

    pub async fn status(&self) -> Result<CommandStatus> {
        self.host.status(&["ip", "-details", "route"]).await
    }

    async fn expect_present(&self, dst: &RouteDst) -> Result<Route> {
        self.get_one_or_default(dst).await?.ok_or_else(|| {
            Error::Unexpected(format!("route to {} should exist but can not be found", dst))
        })
    }
}

fn route_argv(
    verb: &str,
    dst: &RouteDst,
    gateway: Option<&std::net::IpAddr>,
    dev: &str,
) -> Vec<String> {
    let mut argv = vec![
        "ip".to_string(),
        "route".to_string(),
        verb.to_string(),
        dst.to_string(),
    ];
    if let Some(gateway) = gateway {
        argv.extend(["via".to_string(), gateway.to_string()]);
    }
    argv.extend(["dev".to_string(), dev.to_string()]);
    argv
}
