use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::controller::{ContainerInfo, Project};
use crate::metrics::render_metrics;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct ServiceQuery {
    #[serde(default, rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub method: String,
}

/// POST /launchContainer
///
/// The body is decoded by hand so that every malformed body, whatever its
/// content type, is answered with 400.
pub async fn launch_container(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let info: ContainerInfo =
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

    state.controller.launch_container(&info).await?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /service?userID=&project=&method=
///
/// Redirects to `<service address>/<method>`.
pub async fn call_service(
    State(state): State<ApiState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Redirect, ApiError> {
    let method = redirect_path(&query.method)?;
    let project = Project::new(query.user_id, query.project);
    let address = state.controller.call_service(&project).await?;

    let target = format!("{}/{}", address, method);
    info!(
        "Redirecting user {} project {} to {}",
        project.user_id, project.project_name, target
    );

    Ok(Redirect::to(&target))
}

/// Strips leading slashes from `method` and checks that what remains can be
/// appended to the address verbatim as URI path segments.
fn redirect_path(method: &str) -> Result<&str, ApiError> {
    let path = method.trim_start_matches('/');
    match path.chars().find(|c| !is_path_char(*c)) {
        Some(c) => Err(ApiError::Decode(format!(
            "method {:?} contains {:?}, which is not allowed in a URI path",
            method, c
        ))),
        None => Ok(path),
    }
}

// RFC 3986 pchar without percent-encoded octets, plus the segment separator.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@/".contains(c)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /metrics
pub async fn metrics(State(state): State<ApiState>) -> Response {
    match render_metrics(&state.metrics) {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_path_strips_leading_slashes() {
        assert_eq!(redirect_path("ping").unwrap(), "ping");
        assert_eq!(redirect_path("//api/v1/ping").unwrap(), "api/v1/ping");
        assert_eq!(redirect_path("").unwrap(), "");
    }

    #[test]
    fn test_redirect_path_rejects_non_path_characters() {
        for method in ["a\nb", "x?a=1", "x#frag", "a b", "50%", "caf\u{e9}"] {
            let err = redirect_path(method).unwrap_err();
            assert_eq!(err.kind(), "DecodeError", "{:?}", method);
        }
    }
}
