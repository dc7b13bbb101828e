use axum::Router;
use axum::extract::{Json, Path, State};
use axum::routing::get;

use super::AppState;
use crate::error::{Error, Result};
use crate::ip::{InterfaceService, NamespaceService, RouteService};
use crate::types::CommandStatus;

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    r.route("/status/{resource}", get(status))
}

/// Raw output of the `ip` command listing `resource` in the root namespace.
async fn status(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<CommandStatus>> {
    let status = match resource.as_str() {
        "namespaces" => NamespaceService::new(&state.host).status().await?,
        "interfaces" => InterfaceService::new(&state.host).status().await?,
        "routes" => RouteService::new(&state.host).status().await?,
        other => {
            return Err(Error::NotFound(format!(
                "no status for {:?}, expected namespaces, interfaces or routes",
                other
            )));
        }
    };
    Ok(Json(status))
}
