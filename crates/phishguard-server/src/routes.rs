//! HTTP routes and handlers

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use phishguard_core::Verdict;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::CorsConfig;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allow_any_origin {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Body of `POST /predict`; a missing or null url is scored as ""
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub url: Option<String>,
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Verdict>, AppError> {
    metrics::counter!("phishguard_requests_total").increment(1);

    let url = req.url.unwrap_or_default();
    let start = Instant::now();
    let verdict = state.detector.predict(&url)?;
    let elapsed_us = start.elapsed().as_secs_f64() * 1_000_000.0;

    metrics::histogram!("phishguard_prediction_latency_us").record(elapsed_us);
    let label = if verdict.is_phishing {
        "phishing"
    } else {
        "legitimate"
    };
    metrics::counter!("phishguard_verdicts_total", "verdict" => label).increment(1);

    Ok(Json(verdict))
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    Prediction(phishguard_core::Error),
}

impl From<phishguard_core::Error> for AppError {
    fn from(err: phishguard_core::Error) -> Self {
        AppError::Prediction(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            AppError::Prediction(err) => {
                error!("Prediction failed: {}", err);
                metrics::counter!("phishguard_errors_total", "type" => err.kind()).increment(1);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                    "prediction_error",
                )
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
