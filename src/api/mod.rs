//! HTTP front end of the controller.
//!
//! Routes:
//! - POST /launchContainer - launch a container image for a project
//! - POST /service - redirect to a method on a project's service
//! - GET /health - liveness probe, never touches the cluster
//! - GET /metrics - Prometheus exposition
//!
//! Anything else is answered with 404.

pub mod error;
pub mod handlers;
pub mod timing;

use crate::controller::ControllerService;
use crate::metrics::ApiMetrics;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub use error::ApiError;

pub const PATH_LAUNCH_CONTAINER: &str = "/launchContainer";
pub const PATH_CALL_SERVICE: &str = "/service";
pub const PATH_HEALTH: &str = "/health";
pub const PATH_METRICS: &str = "/metrics";

#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<ControllerService>,
    pub metrics: ApiMetrics,
}

/// Builds the router. Every response, including 404s, passes through the
/// request-duration middleware.
pub fn router(controller: Arc<ControllerService>, metrics: ApiMetrics) -> Router {
    let state = ApiState {
        controller,
        metrics: metrics.clone(),
    };

    Router::new()
        .route(PATH_LAUNCH_CONTAINER, post(handlers::launch_container))
        .route(PATH_CALL_SERVICE, post(handlers::call_service))
        .route(PATH_HEALTH, get(handlers::health))
        .route(PATH_METRICS, get(handlers::metrics))
        .method_not_allowed_fallback(handlers::not_found)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(metrics, timing::record_duration))
        .with_state(state)
}
