use prometheus::{HistogramOpts, HistogramVec, Registry};
use std::sync::Arc;
use std::time::Duration;

pub const METRICS_NAMESPACE: &str = "deepcloud";

/// Request-duration histogram for the HTTP API.
///
/// ## Metrics
/// - `deepcloud_api_request_duration_seconds{method, path, status_code}`
#[derive(Clone)]
pub struct ApiMetrics {
    request_duration: HistogramVec,
    registry: Arc<Registry>,
}

impl ApiMetrics {
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "api_request_duration_seconds",
                "API request duration in seconds.",
            )
            .namespace(METRICS_NAMESPACE)
            .buckets(prometheus::DEFAULT_BUCKETS.to_vec()),
            &["method", "path", "status_code"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            request_duration,
            registry,
        })
    }

    /// Creates the metrics on a fresh registry, with process metrics where the
    /// platform supports them.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Self::new_with_registry(registry)
    }

    pub fn observe_request(&self, method: &str, path: &str, status_code: u16, elapsed: Duration) {
        self.request_duration
            .with_label_values(&[method, path, &status_code.to_string()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_request_records_labels() {
        let metrics = ApiMetrics::new_with_registry(Arc::new(Registry::new())).unwrap();

        metrics.observe_request("GET", "/health", 200, Duration::from_millis(3));
        metrics.observe_request("GET", "/health", 200, Duration::from_millis(5));
        metrics.observe_request("POST", "/service", 400, Duration::from_millis(1));

        let families = metrics.registry().gather();
        let family = families
            .iter()
            .find(|f| f.name() == "deepcloud_api_request_duration_seconds")
            .expect("metric not found");

        assert_eq!(family.get_metric().len(), 2);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Arc::new(Registry::new());

        assert!(ApiMetrics::new_with_registry(registry.clone()).is_ok());
        assert!(ApiMetrics::new_with_registry(registry).is_err());
    }
}
