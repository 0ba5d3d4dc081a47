use std::sync::Arc;

use ai_client::{Gemini, NotConfigured, TextCompletion};
use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use factcheck_common::Config;
use factcheck_scan::classifier::GeminiClassifier;
use factcheck_scan::extractor::GeminiExtractor;
use factcheck_scan::prescreen::GeminiPrescreener;
use factcheck_scan::searcher::FallbackSearcher;
use factcheck_scan::{Investigator, ScanOrchestrator};

mod rest;

pub struct AppState {
    pub investigator: Investigator,
    pub orchestrator: ScanOrchestrator,
}

impl AppState {
    fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn TextCompletion> = match &config.gemini_api_key {
            Some(key) => Arc::new(Gemini::new(key, &config.gemini_model)),
            None => {
                warn!("GEMINI_API_KEY not set; model calls will answer with a stub reply");
                Arc::new(NotConfigured)
            }
        };

        let investigator = Investigator::new(
            Arc::new(GeminiExtractor::new(llm.clone())),
            Arc::new(FallbackSearcher::from_config(config)?),
            Arc::new(GeminiClassifier::new(llm.clone())),
        );
        let orchestrator = ScanOrchestrator::new(
            Arc::new(GeminiPrescreener::new(llm)),
            investigator.clone(),
            config.budget,
        )
        .with_concurrency(config.investigation_concurrency);

        Ok(Self {
            investigator,
            orchestrator,
        })
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/investigate", post(rest::api_investigate))
        .route("/scan", post(rest::api_scan))
        .with_state(state)
        // CORS: the browser extension calls from arbitrary origins
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only, never page text
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("factcheck=info".parse()?))
        .init();

    let config = Config::from_env();
    info!(
        total_calls = config.budget.total_calls,
        cost_per_investigation = config.budget.cost_per_investigation,
        concurrency = config.investigation_concurrency,
        model = config.gemini_model.as_str(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Fact checker API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use factcheck_common::{ScanBudget, Verdict};
    use factcheck_scan::testing::{MockClassifier, MockExtractor, MockPrescreener, MockSearcher};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router(
        prescreener: MockPrescreener,
        classifier: MockClassifier,
        total_calls: u32,
    ) -> Router {
        let investigator = Investigator::new(
            Arc::new(MockExtractor::new()),
            Arc::new(MockSearcher::new()),
            Arc::new(classifier),
        );
        let orchestrator = ScanOrchestrator::new(
            Arc::new(prescreener),
            investigator.clone(),
            ScanBudget::new(total_calls),
        );
        build_router(Arc::new(AppState {
            investigator,
            orchestrator,
        }))
    }

    async fn post_json(router: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn scan_returns_flags_and_budget() {
        let prescreener = MockPrescreener::new()
            .not_claim("1", "Greeting.")
            .claim("2", "high", "Stat.");
        let classifier = MockClassifier::new().verdict("Crime fell 90% last year.", Verdict::False, "No.");
        let router = test_router(prescreener, classifier, 10);

        let (status, body) = post_json(
            router,
            "/scan",
            json!({
                "url": "https://news.example",
                "blocks": [
                    {"id": "1", "text": "Hello"},
                    {"id": "2", "text": "Crime fell 90% last year."}
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["flags"][0]["verdict"], "skip");
        assert_eq!(body["flags"][0]["severity"], "none");
        assert!(body["flags"][0].get("query").is_none());
        assert_eq!(body["flags"][1]["verdict"], "false");
        assert_eq!(body["flags"][1]["severity"], "red");
        assert_eq!(body["flags"][1]["query"], "Crime fell 90% last year.");
        assert_eq!(
            body["budget"],
            json!({"total_calls": 10, "used_calls": 3, "investigated": 1, "skipped_due_to_budget": 0})
        );
    }

    #[tokio::test]
    async fn investigate_echoes_original_text() {
        let classifier = MockClassifier::new().verdict("The sky is blue", Verdict::True, "Physics.");
        let router = test_router(MockPrescreener::new(), classifier, 10);

        let (status, body) = post_json(router, "/investigate", json!({"text": "The sky is blue"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "true");
        assert_eq!(body["claim"], "The sky is blue");
        assert_eq!(body["original_text"], "The sky is blue");
        assert_eq!(body["results"], json!([]));
        assert_eq!(body["reason"], "Physics.");
    }

    #[tokio::test]
    async fn scan_without_blocks_field_is_rejected() {
        let router = test_router(MockPrescreener::new(), MockClassifier::new(), 10);
        let (status, _) = post_json(router, "/scan", json!({"url": "https://x"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let router = test_router(MockPrescreener::new(), MockClassifier::new(), 10);
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn investigate_without_credentials_returns_mock_results() {
        let config = Config::from_lookup(|_| None);
        let router = build_router(Arc::new(AppState::from_config(&config).unwrap()));

        let (status, body) =
            post_json(router, "/investigate", json!({"text": "The moon is made of cheese"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], "uncertain");
        assert_eq!(body["reason"], ai_client::NOT_CONFIGURED_REPLY);
        assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["results"][0]["url"], "https://example.com/mock-info");
    }

    #[test]
    fn app_state_builds_without_credentials() {
        let config = Config::from_lookup(|_| None);
        assert!(AppState::from_config(&config).is_ok());
    }
}
