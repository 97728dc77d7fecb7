//! HTTP Metrics Middleware
//!
//! Interception hook for the routing layer, installed once per router with
//! `axum::middleware::from_fn_with_state`.

use super::MetricsExporter;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

/// Record one observation per request: status, method, matched route
/// pattern, and elapsed time.
///
/// The endpoint label is the route pattern (`/api/v1/users`), never the raw
/// path, so label cardinality stays bounded by the route table. Requests
/// that match no route carry no `MatchedPath` and are recorded under
/// `"unknown"`. Runs for every request, including error responses.
pub async fn track_http(
    State(exporter): State<Arc<MetricsExporter>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_default();

    let response = next.run(request).await;

    exporter.record_http_observation(
        response.status().as_u16(),
        method.as_str(),
        &endpoint,
        start.elapsed(),
    );

    response
}
