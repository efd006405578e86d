use crate::metrics::ApiMetrics;
use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::debug;

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

const KNOWN_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Observes the duration of every request, labelled with the status code of
/// the response the inner router produced.
///
/// Labels are taken from the matched route and a fixed method set so that
/// clients cannot grow the number of series.
pub async fn record_duration(
    State(metrics): State<ApiMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = method_label(request.method());
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_PATH.to_string(), |p| p.as_str().to_string());
    let begin = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = begin.elapsed();
    metrics.observe_request(method, &path, status, elapsed);
    debug!("{} {} -> {} in {:?}", method, path, status, elapsed);

    response
}

fn method_label(method: &Method) -> &'static str {
    KNOWN_METHODS
        .iter()
        .copied()
        .find(|known| *known == method.as_str())
        .unwrap_or("OTHER")
}
