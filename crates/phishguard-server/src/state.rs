//! Shared application state

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use phishguard_classifiers::{ModelBundle, PhishingDetector};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Read-only detector around the loaded bundle
    pub detector: PhishingDetector,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Load the model bundle named by the configuration.
    ///
    /// Fails when the bundle is missing or invalid, so the server never
    /// starts without a model.
    pub fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        info!("Loading model bundle from: {}", config.model_path.display());
        let bundle = ModelBundle::load(&config.model_path)?;

        Ok(Self::with_detector(
            config,
            PhishingDetector::new(bundle),
            metrics_handle,
        ))
    }

    /// Assemble state around an existing detector
    pub fn with_detector(
        config: ServerConfig,
        detector: PhishingDetector,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            detector,
            metrics_handle,
        }
    }
}
