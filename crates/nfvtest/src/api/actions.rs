//! `/actions` and `/actions/ns/{ns_name}`.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::routing::post;

use super::{AppState, JsonBody};
use crate::actions::{
    Bandwidth, BandwidthRequest, DnsLookup, DnsLookupRequest, Traceroute, TracerouteRequest,
};
use crate::error::Result;
use crate::types::{Ping, PingRequest};

pub(super) fn add_routes(r: Router<AppState>) -> Router<AppState> {
    r.route("/actions/ping", post(ping))
        .route("/actions/traceroute", post(traceroute))
        .route("/actions/dns-lookup", post(dns_lookup))
        .route("/actions/bandwidth", post(bandwidth))
        .route("/actions/ns/{ns_name}/ping", post(ping_in))
        .route("/actions/ns/{ns_name}/traceroute", post(traceroute_in))
        .route("/actions/ns/{ns_name}/dns-lookup", post(dns_lookup_in))
        .route("/actions/ns/{ns_name}/bandwidth", post(bandwidth_in))
}

async fn ping(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PingRequest>,
) -> Result<Json<Ping>> {
    run_ping(&state, None, &req).await
}

async fn ping_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<PingRequest>,
) -> Result<Json<Ping>> {
    run_ping(&state, Some(&ns_name), &req).await
}

async fn run_ping(state: &AppState, ns_name: Option<&str>, req: &PingRequest) -> Result<Json<Ping>> {
    let host = state.host_in(ns_name).await?;
    state.actions(&host).ping(req).await.map(Json)
}

async fn traceroute(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TracerouteRequest>,
) -> Result<Json<Traceroute>> {
    run_traceroute(&state, None, &req).await
}

async fn traceroute_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<TracerouteRequest>,
) -> Result<Json<Traceroute>> {
    run_traceroute(&state, Some(&ns_name), &req).await
}

async fn run_traceroute(
    state: &AppState,
    ns_name: Option<&str>,
    req: &TracerouteRequest,
) -> Result<Json<Traceroute>> {
    let host = state.host_in(ns_name).await?;
    state.actions(&host).traceroute(req).await.map(Json)
}

async fn dns_lookup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DnsLookupRequest>,
) -> Result<Json<DnsLookup>> {
    run_dns_lookup(&state, None, &req).await
}

async fn dns_lookup_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<DnsLookupRequest>,
) -> Result<Json<DnsLookup>> {
    run_dns_lookup(&state, Some(&ns_name), &req).await
}

async fn run_dns_lookup(
    state: &AppState,
    ns_name: Option<&str>,
    req: &DnsLookupRequest,
) -> Result<Json<DnsLookup>> {
    let host = state.host_in(ns_name).await?;
    state.actions(&host).dns_lookup(req).await.map(Json)
}

async fn bandwidth(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BandwidthRequest>,
) -> Result<Json<Bandwidth>> {
    run_bandwidth(&state, None, &req).await
}

async fn bandwidth_in(
    State(state): State<AppState>,
    Path(ns_name): Path<String>,
    JsonBody(req): JsonBody<BandwidthRequest>,
) -> Result<Json<Bandwidth>> {
    run_bandwidth(&state, Some(&ns_name), &req).await
}

async fn run_bandwidth(
    state: &AppState,
    ns_name: Option<&str>,
    req: &BandwidthRequest,
) -> Result<Json<Bandwidth>> {
    let host = state.host_in(ns_name).await?;
    state.actions(&host).bandwidth(req).await.map(Json)
}
