//! `/interfaces` and `/interfaces/ns/{ns_name}`.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;

use super::{AppState, JsonBody, path_name};
use crate::error::Result;
use crate::ip::InterfaceService;
use crate::types::{Interface, InterfaceCreate, InterfaceUpdate};

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    r.route("/interfaces", get(get_all).post(create))
        .route(
            "/interfaces/{name}",
            get(get_one).patch(update).delete(delete),
        )
        .route("/interfaces/ns/{ns_name}", get(get_all_in).post(create_in))
        .route(
            "/interfaces/ns/{ns_name}/{name}",
            get(get_one).patch(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct InterfacePath {
    ns_name: Option<String>,
    name: String,
}

async fn service(state: &AppState, ns_name: Option<&str>) -> Result<InterfaceService> {
    Ok(InterfaceService::new(&state.host_in(ns_name).await?))
}

async fn list(state: &AppState, ns_name: Option<&str>) -> Result<Json<Vec<Interface>>> {
    service(state, ns_name).await?.get_all().await.map(Json)
}

async fn add(
    state: &AppState,
    ns_name: Option<&str>,
    req: &InterfaceCreate,
) -> Result<(StatusCode, Json<Interface>)> {
    let interface = service(state, ns_name).await?.create(req).await?;
    Ok((StatusCode::CREATED, Json(interface)))
}

async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Interface>>> {
    list(&state, None).await
}

async fn get_all_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
) -> Result<Json<Vec<Interface>>> {
    list(&state, Some(&ns_name)).await
}

async fn create(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<InterfaceCreate>,
) -> Result<(StatusCode, Json<Interface>)> {
    add(&state, None, &req).await
}

async fn create_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<InterfaceCreate>,
) -> Result<(StatusCode, Json<Interface>)> {
    add(&state, Some(&ns_name), &req).await
}

async fn get_one(
    State(state): State<AppState>,
    Path(path): Path<InterfacePath>,
) -> Result<Json<Interface>> {
    let name = path_name(&path.name)?;
    service(&state, path.ns_name.as_deref())
        .await?
        .get_one(name.as_str())
        .await
        .map(Json)
}

async fn update(
    State(state): State<AppState>,
    Path(path): Path<InterfacePath>,
    JsonBody(req): JsonBody<InterfaceUpdate>,
) -> Result<Json<Interface>> {
    let name = path_name(&path.name)?;
    service(&state, path.ns_name.as_deref())
        .await?
        .update(name.as_str(), &req)
        .await
        .map(Json)
}

async fn delete(
    State(state): State<AppState>,
    Path(path): Path<InterfacePath>,
) -> Result<StatusCode> {
    let name = path_name(&path.name)?;
    service(&state, path.ns_name.as_deref())
        .await?
        .delete(name.as_str())
        .await?;
    Ok(StatusCode::OK)
}
