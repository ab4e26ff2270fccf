//! Prometheus metrics for runs, stages and HTTP traffic

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::engine::{EngineState, RunResult};

static UUID_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()
});

/// Prometheus handle backing the `/metrics` route
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the Prometheus recorder; `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("rag_run_duration_seconds".to_string()),
        &config.run_duration_buckets,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!("Invalid run duration buckets: {}", e);
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("rag_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record a finished run
pub fn record_run(result: &RunResult) {
    let route = result.route_taken.map(|r| r.as_str()).unwrap_or("none");
    let labels = [
        ("outcome", result.outcome.as_str().to_string()),
        ("route", route.to_string()),
    ];

    counter!("rag_runs_total", &labels).increment(1);
    histogram!("rag_run_duration_seconds", &labels)
        .record(Duration::from_millis(result.duration_ms).as_secs_f64());
    histogram!("rag_run_attempts", &labels).record(result.attempts as f64);

    if result.reroutes > 0 {
        counter!("rag_reroutes_total").increment(result.reroutes as u64);
    }

    if let Some(reason) = result.diagnostics.exhaustion {
        let reason = serde_json::to_value(reason)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_default();
        counter!("rag_exhausted_total", "reason" => reason).increment(1);
    }
}

/// Record one external call made by the engine
pub fn record_stage_call(stage: EngineState, success: bool, duration: Duration) {
    let labels = [
        ("stage", stage.as_str().to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("rag_stage_calls_total", &labels).increment(1);
    histogram!("rag_stage_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Keep path labels low-cardinality
fn sanitize_path(path: &str) -> String {
    let path = match UUID_SEGMENT.as_ref() {
        Some(re) => re.replace_all(path, "{id}").into_owned(),
        None => path.to_string(),
    };

    path.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let sanitized = sanitize_path("/v1/runs/550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(sanitized, "/v1/runs/{id}");
    }

    #[test]
    fn test_sanitize_path_truncates() {
        let long = format!("/v1/{}", "a".repeat(100));
        assert_eq!(sanitize_path(&long).len(), 50);
        assert_eq!(sanitize_path("/v1/ask"), "/v1/ask");
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_none());
    }
}
