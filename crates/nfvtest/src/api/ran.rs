//! `/gnodeb`, `/ue`, `/enodeb` and `/ue-4g`.
//!
//! The four node kinds share one route layout:
//!
//! | method | path | |
//! | --- | --- | --- |
//! | GET, POST | `/<kind>` | list configs, create one (201) |
//! | GET, PUT, DELETE | `/<kind>/{id}` | read, create or replace, delete |
//! | POST | `/<kind>/{id}/start` | launch the simulator, returns its pid |
//! | POST | `/<kind>/{id}/stop` | terminate it |
//! | GET | `/<kind>/{id}/status` | process state and logs |

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;

use super::{AppState, JsonBody};
use crate::error::Result;
use crate::ran::enodeb::validate_enb_id;
use crate::ran::{
    ENodeB, ENodeBStatus, GNodeB, GNodeBStatus, Nci, Supi, Ue, Ue4g, Ue4gStatus, UeStatus,
    validate_digits,
};

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    let r = gnodeb::add_routes(r);
    let r = ue::add_routes(r);
    let r = enodeb::add_routes(r);
    ue_4g::add_routes(r)
}

/// Reply to a successful start.
#[derive(Debug, Serialize)]
struct Started {
    pid: u32,
}

fn nci(id: String) -> Result<Nci> {
    Nci::new(id)
}

fn supi(id: String) -> Result<Supi> {
    Supi::new(id)
}

fn enb_id(id: String) -> Result<String> {
    validate_enb_id(&id)?;
    Ok(id)
}

fn imei(id: String) -> Result<String> {
    validate_digits("imei", &id, 15)?;
    Ok(id)
}

macro_rules! node_routes {
    ($module:ident, $path:literal, $service:ident, $node:ty, $status:ty, $parse:ident) => {
        mod $module {
            use super::*;

            pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
                r.route($path, get(get_all).post(create))
                    .route(
                        concat!($path, "/{id}"),
                        get(get_one).put(put).delete(delete),
                    )
                    .route(concat!($path, "/{id}/start"), post(start))
                    .route(concat!($path, "/{id}/stop"), post(stop))
                    .route(concat!($path, "/{id}/status"), get(status))
            }

            async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<$node>>> {
                state.$service().get_all().await.map(Json)
            }

            async fn create(
                State(state): State<AppState>,
                JsonBody(node): JsonBody<$node>,
            ) -> Result<(StatusCode, Json<$node>)> {
                let node = state.$service().create(&node).await?;
                Ok((StatusCode::CREATED, Json(node)))
            }

            async fn get_one(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> Result<Json<$node>> {
                let id = $parse(id)?;
                state.$service().get_one(&id).await.map(Json)
            }

            async fn put(
                State(state): State<AppState>,
                Path(id): Path<String>,
                JsonBody(node): JsonBody<$node>,
            ) -> Result<Json<$node>> {
                let id = $parse(id)?;
                state.$service().put(&id, &node).await.map(Json)
            }

            async fn delete(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> Result<StatusCode> {
                let id = $parse(id)?;
                state.$service().delete(&id).await?;
                Ok(StatusCode::OK)
            }

            async fn start(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> Result<Json<Started>> {
                let id = $parse(id)?;
                let pid = state.$service().start(&id).await?;
                Ok(Json(Started { pid }))
            }

            async fn stop(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> Result<StatusCode> {
                let id = $parse(id)?;
                state.$service().stop(&id).await?;
                Ok(StatusCode::OK)
            }

            async fn status(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> Result<Json<$status>> {
                let id = $parse(id)?;
                state.$service().status(&id).await.map(Json)
            }
        }
    };
}

node_routes!(gnodeb, "/gnodeb", gnodeb, GNodeB, GNodeBStatus, nci);
node_routes!(ue, "/ue", ue, Ue, UeStatus, supi);
node_routes!(enodeb, "/enodeb", enodeb, ENodeB, ENodeBStatus, enb_id);
node_routes!(ue_4g, "/ue-4g", ue_4g, Ue4g, Ue4gStatus, imei);
