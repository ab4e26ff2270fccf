//! Observability configuration

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

/// OTLP span export; off unless enabled
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    /// Fraction of traces kept, clamped to 0.0..=1.0 by the sampler
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route serving the Prometheus text format
    pub path: String,
    /// Histogram buckets for `rag_run_duration_seconds`
    pub run_duration_buckets: Vec<f64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            sampling_ratio: 1.0,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
            run_duration_buckets: vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObservabilityConfig::default();

        assert!(!config.tracing.enabled);
        assert_eq!(config.tracing.service_name, "adaptive-rag");
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.path, "/metrics");
        assert_eq!(config.metrics.run_duration_buckets.len(), 8);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: ObservabilityConfig = serde_json::from_value(serde_json::json!({
            "tracing": { "enabled": true, "sampling_ratio": 0.1 }
        }))
        .unwrap();

        assert!(config.tracing.enabled);
        assert_eq!(config.tracing.sampling_ratio, 0.1);
        assert_eq!(config.tracing.otlp_endpoint, "http://localhost:4317");
        assert!(config.metrics.enabled);
    }
}
