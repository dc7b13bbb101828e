//! HTTP API served under `/api/v2`.
//!
//! Every resource module adds its routes to a shared [`Router`] through an
//! `add_routes` function; handlers build the service they need from the
//! [`AppState`] and return [`Result`](crate::Result), whose error side
//! renders as `{"message": "..."}` with a matching status code.

mod actions;
mod error;
mod interfaces;
mod namespaces;
mod ran;
mod routes;
mod status;

pub use error::JsonBody;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::actions::{ActionSettings, ActionsService};
use crate::config::{Config, RanConfig};
use crate::error::Result;
use crate::host::Host;
use crate::ip::NamespaceService;
use crate::ran::{ENodeBService, GNodeBService, RanProcesses, Ue4gService, UeService};
use crate::types::SafeName;

/// Prefix of every route.
pub const API_PREFIX: &str = "/api/v2";

/// Shared state of all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    host: Host,
    settings: ActionSettings,
    ran: Arc<RanConfig>,
    processes: RanProcesses,
}

impl AppState {
    pub fn new(host: Host, config: &Config) -> Self {
        Self {
            host,
            settings: config.action_settings(),
            ran: Arc::new(config.ran.clone()),
            processes: RanProcesses::default(),
        }
    }

    /// The simulator processes, for shutting them down with the server.
    pub fn processes(&self) -> &RanProcesses {
        &self.processes
    }

    /// The host a request targets: the root namespace, or the named one,
    /// which must exist.
    pub(crate) async fn host_in(&self, ns_name: Option<&str>) -> Result<Host> {
        let Some(ns_name) = ns_name else {
            return Ok(self.host.clone());
        };
        let ns_name = SafeName::new(ns_name)?;
        NamespaceService::new(&self.host)
            .get_one(ns_name.as_str())
            .await?;
        Ok(self.host.in_namespace(ns_name.as_str()))
    }

    pub(crate) fn actions(&self, host: &Host) -> ActionsService {
        ActionsService::new(host, self.settings.clone())
    }

    pub(crate) fn gnodeb(&self) -> GNodeBService {
        GNodeBService::new(&self.host, &self.ran, self.processes.gnodeb.clone())
    }

    pub(crate) fn ue(&self) -> UeService {
        UeService::new(&self.host, &self.ran, self.processes.ue.clone())
    }

    pub(crate) fn enodeb(&self) -> ENodeBService {
        ENodeBService::new(&self.ran, self.processes.enodeb.clone())
    }

    pub(crate) fn ue_4g(&self) -> Ue4gService {
        Ue4gService::new(&self.ran, self.processes.ue_4g.clone())
    }
}

/// Build the full router.
///
/// Cross-origin requests are allowed from anywhere, so browser clients on
/// other origins can drive the API.
pub fn router(state: AppState) -> Router {
    let api = Router::new();
    let api = namespaces::add_routes(api);
    let api = interfaces::add_routes(api);
    let api = routes::add_routes(api);
    let api = actions::add_routes(api);
    let api = ran::add_routes(api);
    let api = status::add_routes(api);

    Router::new()
        .nest(API_PREFIX, api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Validate a name taken from the URL path.
pub(crate) fn path_name(name: &str) -> Result<SafeName> {
    SafeName::new(name)
}
