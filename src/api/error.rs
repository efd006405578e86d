use crate::ControllerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    Decode(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Decode(_) => "DecodeError",
            ApiError::Controller(e) => e.kind(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::Controller(e) => match e {
                ControllerError::InvalidProject(_)
                | ControllerError::NotFound { .. }
                | ControllerError::AmbiguousResolution { .. } => StatusCode::BAD_REQUEST,
                ControllerError::LaunchFailed { .. } => StatusCode::BAD_GATEWAY,
                ControllerError::OrchestrationUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.kind(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
