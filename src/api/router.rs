use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
pub fn create_router_with_state(
    state: AppState,
    metrics: Option<(PrometheusMetrics, String)>,
) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    let router = match metrics {
        Some((metrics, path)) => router.merge(create_metrics_router(metrics, &path)),
        None => router,
    };

    router
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::domain::engine::EngineConfig;
    use crate::domain::evidence::{EvidenceSources, MockEvidenceSource, Passage, RouteDecision};
    use crate::domain::generation::{MockGenerator, MockQueryRewriter};
    use crate::domain::grading::{MockAnswerGrader, MockGroundingGrader, MockRelevanceGrader};
    use crate::domain::routing::{MockQueryRouter, TopicRegistry};
    use crate::infrastructure::engine::{AdaptiveRagEngine, BatchRunner};
    use crate::infrastructure::evidence::InMemoryIndex;

    fn test_state() -> AppState {
        let topics = Arc::new(TopicRegistry::with_defaults());
        let indexed = MockEvidenceSource::new("indexed")
            .with_passages(vec![Passage::new("d1", "Mars has two moons, Phobos and Deimos.")]);

        let engine = Arc::new(
            AdaptiveRagEngine::builder()
                .router(Arc::new(MockQueryRouter::new(RouteDecision::Vectorstore)))
                .sources(EvidenceSources::new(
                    Arc::new(indexed),
                    Arc::new(MockEvidenceSource::new("live")),
                ))
                .relevance_grader(Arc::new(MockRelevanceGrader::relevant()))
                .generator(Arc::new(MockGenerator::answering("Phobos and Deimos")))
                .grounding_grader(Arc::new(MockGroundingGrader::new()))
                .answer_grader(Arc::new(MockAnswerGrader::new()))
                .rewriter(Arc::new(MockQueryRewriter::new()))
                .topics(topics.clone())
                .config(EngineConfig::default())
                .build()
                .unwrap(),
        );

        AppState {
            batch: BatchRunner::new(engine.clone()),
            engine,
            topics,
            index: Arc::new(InMemoryIndex::new()),
            shutdown: CancellationToken::new(),
        }
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    #[tokio::test]
    async fn test_ask_returns_run_result() {
        let router = create_router_with_state(test_state(), None);

        let (status, body) = send(
            router,
            "POST",
            "/v1/ask",
            Some(json!({"question": "What are the moons of Mars?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "DONE");
        assert_eq!(body["final_answer"], "Phobos and Deimos");
        assert_eq!(body["route_taken"], "vectorstore");
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let router = create_router_with_state(test_state(), None);

        let (status, body) = send(router, "POST", "/v1/ask", Some(json!({"question": "   "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "question");
    }

    #[tokio::test]
    async fn test_ask_after_shutdown_is_cancelled() {
        let state = test_state();
        state.shutdown.cancel();
        let router = create_router_with_state(state, None);

        let (status, body) = send(router, "POST", "/v1/ask", Some(json!({"question": "q"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "CANCELLED");
    }

    #[tokio::test]
    async fn test_batch() {
        let router = create_router_with_state(test_state(), None);

        let (status, body) = send(
            router,
            "POST",
            "/v1/ask/batch",
            Some(json!({"questions": ["first", "second", " "], "concurrency": 2})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
        assert_eq!(body["report"]["total_questions"], 3);
        assert_eq!(body["report"]["outcomes"]["done"], 2);
        assert_eq!(body["report"]["outcomes"]["fatal_error"], 1);
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_and_zero_concurrency() {
        let router = create_router_with_state(test_state(), None);
        let (status, _) = send(router, "POST", "/v1/ask/batch", Some(json!({"questions": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let router = create_router_with_state(test_state(), None);
        let (status, body) = send(
            router,
            "POST",
            "/v1/ask/batch",
            Some(json!({"questions": ["q"], "concurrency": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "concurrency");
    }

    #[tokio::test]
    async fn test_topics_roundtrip() {
        let state = test_state();

        let (status, body) =
            send(create_router_with_state(state.clone(), None), "GET", "/v1/router/topics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 1);

        let (status, body) = send(
            create_router_with_state(state.clone(), None),
            "PUT",
            "/v1/router/topics",
            Some(json!({"topics": ["Rust programming"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 2);
        assert_eq!(state.topics.snapshot().topics, vec!["Rust programming".to_string()]);

        let (status, _) = send(
            create_router_with_state(state, None),
            "PUT",
            "/v1/router/topics",
            Some(json!({"topics": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ready_degraded_on_empty_index() {
        let router = create_router_with_state(test_state(), None);

        let (status, body) = send(router, "GET", "/ready", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let router = create_router_with_state(test_state(), None);
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
