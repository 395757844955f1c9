//! In-process tests for the HTTP router

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use phishguard_classifiers::{ModelBundle, PhishingDetector, Scorer, FEATURE_COLUMNS};
use phishguard_core::{Error, Result, Verdict};
use phishguard_server::{create_router, AppState, CorsConfig, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const LOGIN_URL: &str = "http://secure-login.example.com/verify?id=1&token=2";

/// Returns a fixed probability for every input
struct FixedScorer(f64);

impl Scorer for FixedScorer {
    fn score(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.0)
    }

    fn input_width(&self) -> usize {
        FEATURE_COLUMNS.len()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct BrokenScorer;

impl Scorer for BrokenScorer {
    fn score(&self, _features: &[f64]) -> Result<f64> {
        Err(Error::classifier("model backend unavailable"))
    }

    fn input_width(&self) -> usize {
        FEATURE_COLUMNS.len()
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn app_with(scorer: Arc<dyn Scorer>, config: ServerConfig) -> Router {
    let bundle = ModelBundle::new(
        scorer,
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        0.99,
        "v1",
    )
    .unwrap();
    let handle = PrometheusBuilder::new().build_recorder().handle();

    create_router(AppState::with_detector(
        config,
        PhishingDetector::new(bundle),
        handle,
    ))
}

fn app(probability: f64) -> Router {
    app_with(Arc::new(FixedScorer(probability)), ServerConfig::default())
}

fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(0.5)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_predict_flags_high_probability() {
    let body = json!({ "url": LOGIN_URL }).to_string();
    let response = app(0.995).oneshot(predict_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let verdict: Verdict = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(verdict.url, LOGIN_URL);
    assert!(verdict.is_phishing);
    assert_eq!(verdict.probability_phishing, 0.995);
    assert_eq!(verdict.model_version, "v1");
}

#[tokio::test]
async fn test_predict_below_threshold() {
    let body = json!({ "url": "https://example.com" }).to_string();
    let response = app(0.98).oneshot(predict_request(&body)).await.unwrap();

    let value = json_body(response).await;
    assert_eq!(value["is_phishing"], json!(false));
    assert_eq!(value["probability_phishing"], json!(0.98));
}

#[tokio::test]
async fn test_predict_missing_or_null_url_scores_empty_string() {
    for body in ["{}", r#"{"url": null}"#] {
        let response = app(0.1).oneshot(predict_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "body {}", body);

        let value = json_body(response).await;
        assert_eq!(value["url"], json!(""));
        assert_eq!(value["is_phishing"], json!(false));
    }
}

#[tokio::test]
async fn test_scoring_failure_is_server_error() {
    let app = app_with(Arc::new(BrokenScorer), ServerConfig::default());
    let body = json!({ "url": LOGIN_URL }).to_string();
    let response = app.oneshot(predict_request(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let value = json_body(response).await;
    assert_eq!(value["error"]["type"], json!("prediction_error"));
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("model backend unavailable"));
}

#[tokio::test]
async fn test_out_of_range_probability_is_server_error() {
    let body = json!({ "url": LOGIN_URL }).to_string();
    let response = app(1.5).oneshot(predict_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let response = app(0.5).oneshot(predict_request("not json")).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let response = app(0.5)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app(0.5)
        .oneshot(Request::builder().uri("/v1/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_any_origin() {
    let response = app(0.5)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "chrome-extension://abcdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_allow_list() {
    let config = ServerConfig {
        cors: CorsConfig {
            allow_any_origin: false,
            allowed_origins: vec!["https://mail.example.com".to_string()],
        },
        ..Default::default()
    };

    let request = |origin: &str| {
        Request::builder()
            .uri("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let app = app_with(Arc::new(FixedScorer(0.5)), config);
    let allowed = app
        .clone()
        .oneshot(request("https://mail.example.com"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://mail.example.com"
    );

    let denied = app.oneshot(request("https://evil.example.net")).await.unwrap();
    assert!(denied
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
