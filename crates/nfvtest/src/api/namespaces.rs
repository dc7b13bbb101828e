use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::get;

use super::{AppState, JsonBody, path_name};
use crate::error::Result;
use crate::ip::NamespaceService;
use crate::types::{Namespace, NamespaceCreate};

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    r.route("/namespaces", get(get_all).post(create)).route(
        "/namespaces/{name}",
        get(get_one).patch(update).delete(delete),
    )
}

fn service(state: &AppState) -> NamespaceService {
    NamespaceService::new(&state.host)
}

async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Namespace>>> {
    service(&state).get_all().await.map(Json)
}

async fn create(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NamespaceCreate>,
) -> Result<(StatusCode, Json<Namespace>)> {
    let ns = service(&state).create(&req).await?;
    Ok((StatusCode::CREATED, Json(ns)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Namespace>> {
    let name = path_name(&name)?;
    service(&state).get_one(name.as_str()).await.map(Json)
}

async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Namespace>> {
    let name = path_name(&name)?;
    service(&state).update(name.as_str()).await.map(Json)
}

async fn delete(State(state): State<AppState>, Path(name): Path<String>) -> Result<StatusCode> {
    let name = path_name(&name)?;
    service(&state).delete(name.as_str()).await?;
    Ok(StatusCode::OK)
}
