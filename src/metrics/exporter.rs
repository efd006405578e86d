use crate::metrics::collector::ApiMetrics;
use prometheus::{Encoder, TextEncoder};

/// Renders every metric in the registry in the Prometheus text format.
pub fn render_metrics(metrics: &ApiMetrics) -> Result<(String, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let families = metrics.registry().gather();
    let body = encoder.encode_to_string(&families)?;

    Ok((encoder.format_type().to_string(), body))
}
