//! `/routes` and `/routes/ns/{ns_name}`.
//!
//! A route is addressed by `{dst_addr}` alone for `default`, and by
//! `{dst_addr}/{dst_prefix_len}` otherwise.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;

use super::{AppState, JsonBody};
use crate::error::{Error, Result};
use crate::ip::RouteService;
use crate::types::{Route, RouteCreate, RouteDst, RouteUpdate};

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    r.route("/routes", get(get_all).post(create))
        .route("/routes/{dst_addr}", get(get_one).patch(update).delete(delete))
        .route(
            "/routes/{dst_addr}/{dst_prefix_len}",
            get(get_one).patch(update).delete(delete),
        )
        .route("/routes/ns/{ns_name}", get(get_all_in).post(create_in))
        .route(
            "/routes/ns/{ns_name}/{dst_addr}",
            get(get_one).patch(update).delete(delete),
        )
        .route(
            "/routes/ns/{ns_name}/{dst_addr}/{dst_prefix_len}",
            get(get_one).patch(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct RoutePath {
    ns_name: Option<String>,
    dst_addr: String,
    dst_prefix_len: Option<String>,
}

impl RoutePath {
    fn dst(&self) -> Result<RouteDst> {
        let prefix_len = self
            .dst_prefix_len
            .as_deref()
            .map(|len| {
                len.parse::<u8>().map_err(|_| {
                    Error::InvalidInput(format!("invalid prefix length {:?}", len))
                })
            })
            .transpose()?;
        RouteDst::from_parts(&self.dst_addr, prefix_len)
    }
}

async fn service(state: &AppState, ns_name: Option<&str>) -> Result<RouteService> {
    Ok(RouteService::new(&state.host_in(ns_name).await?))
}

async fn list(state: &AppState, ns_name: Option<&str>) -> Result<Json<Vec<Route>>> {
    service(state, ns_name).await?.get_all().await.map(Json)
}

async fn add(
    state: &AppState,
    ns_name: Option<&str>,
    req: &RouteCreate,
) -> Result<(StatusCode, Json<Route>)> {
    let route = service(state, ns_name).await?.create(req).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Route>>> {
    list(&state, None).await
}

async fn get_all_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
) -> Result<Json<Vec<Route>>> {
    list(&state, Some(&ns_name)).await
}

async fn create(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RouteCreate>,
) -> Result<(StatusCode, Json<Route>)> {
    add(&state, None, &req).await
}

async fn create_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<RouteCreate>,
) -> Result<(StatusCode, Json<Route>)> {
    add(&state, Some(&ns_name), &req).await
}

async fn get_one(
    State(state): State<AppState>,
    Path(path): Path<RoutePath>,
) -> Result<Json<Route>> {
    let dst = path.dst()?;
    service(&state, path.ns_name.as_deref())
        .await?
        .get_one(&dst)
        .await
        .map(Json)
}

async fn update(
    State(state): State<AppState>,
    Path(path): Path<RoutePath>,
    JsonBody(req): JsonBody<RouteUpdate>,
) -> Result<Json<Route>> {
    let dst = path.dst()?;
    service(&state, path.ns_name.as_deref())
        .await?
        .update(&dst, &req)
        .await
        .map(Json)
}

async fn delete(State(state): State<AppState>, Path(path): Path<RoutePath>) -> Result<StatusCode> {
    let dst = path.dst()?;
    service(&state, path.ns_name.as_deref())
        .await?
        .delete(&dst)
        .await?;
    Ok(StatusCode::OK)
}
