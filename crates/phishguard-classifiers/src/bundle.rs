//! Model bundle loading and validation
//!
//! A bundle is the artifact produced by training: a scorer, the ordered
//! feature columns it was trained on, and the decision threshold selected
//! during calibration. It is loaded once at startup and never mutated.

use crate::classifier::Scorer;
use crate::features::{FeatureVector, FEATURE_COLUMNS};
use crate::model::ModelSpec;
use phishguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// On-disk bundle document (JSON, or YAML for `.yaml`/`.yml` files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSpec {
    /// Version reported alongside every verdict
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Feature names in the order the model consumes them
    pub feature_columns: Vec<String>,

    /// Probability at or above which a URL is flagged.
    ///
    /// Absent until the bundle has been calibrated; [`BundleSpec::build`]
    /// refuses such bundles, so they can never be served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_threshold: Option<f64>,

    /// Model parameters
    pub model: ModelSpec,
}

fn default_model_version() -> String {
    "v1".to_string()
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml")
}

impl BundleSpec {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::bundle(format!("invalid bundle: {}", e)))
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::bundle(format!("invalid bundle: {}", e)))
    }

    /// Read a bundle document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::bundle(format!(
                "model bundle not found at {}; train and calibrate a model first",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let spec: std::result::Result<Self, String> = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };

        spec.map_err(|e| Error::bundle(format!("invalid bundle {}: {}", path.display(), e)))
    }

    /// Write the bundle document to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate and build the runtime bundle
    pub fn build(&self) -> Result<ModelBundle> {
        let threshold = self.decision_threshold.ok_or_else(|| {
            Error::bundle("missing field `decision_threshold`; calibrate the bundle first")
        })?;
        self.build_with_threshold(threshold)
    }

    /// Build the runtime bundle with an explicit threshold, ignoring the
    /// stored one. Calibration scores uncalibrated bundles this way.
    pub fn build_with_threshold(&self, decision_threshold: f64) -> Result<ModelBundle> {
        let scorer = self.model.build(self.feature_columns.len())?;
        ModelBundle::new(
            scorer,
            self.feature_columns.clone(),
            decision_threshold,
            self.model_version.clone(),
        )
    }
}

/// Loaded, validated, immutable model bundle
#[derive(Clone)]
pub struct ModelBundle {
    scorer: Arc<dyn Scorer>,
    feature_columns: Arc<[String]>,
    decision_threshold: f64,
    model_version: String,
}

impl ModelBundle {
    /// Assemble a bundle around an existing scorer
    pub fn new(
        scorer: Arc<dyn Scorer>,
        feature_columns: Vec<String>,
        decision_threshold: f64,
        model_version: impl Into<String>,
    ) -> Result<Self> {
        validate_threshold(decision_threshold)?;

        if feature_columns.is_empty() {
            return Err(Error::bundle("feature_columns must not be empty"));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = feature_columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(Error::bundle(format!("duplicate feature column '{}'", dup)));
        }

        if scorer.input_width() != feature_columns.len() {
            return Err(Error::bundle(format!(
                "scorer '{}' expects {} features but the bundle lists {} columns",
                scorer.name(),
                scorer.input_width(),
                feature_columns.len()
            )));
        }

        if !feature_columns.iter().map(String::as_str).eq(FEATURE_COLUMNS) {
            warn!(
                "Bundle feature columns differ from the extractor's columns; unknown columns will be fed as 0"
            );
        }

        Ok(Self {
            scorer,
            feature_columns: feature_columns.into(),
            decision_threshold,
            model_version: model_version.into(),
        })
    }

    /// Load and validate a bundle from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let spec = BundleSpec::from_file(path)?;
        let bundle = spec.build()?;

        info!(
            "Loaded model bundle {} ({}, {} features, threshold {:.3}, version {})",
            path.display(),
            spec.model.kind(),
            bundle.feature_columns.len(),
            bundle.decision_threshold,
            bundle.model_version
        );

        Ok(bundle)
    }

    /// Copy of this bundle with a different decision threshold
    pub fn with_threshold(&self, decision_threshold: f64) -> Result<Self> {
        validate_threshold(decision_threshold)?;
        Ok(Self {
            decision_threshold,
            ..self.clone()
        })
    }

    /// Score an extracted feature vector, ordered by this bundle's columns
    pub fn score_features(&self, features: &FeatureVector) -> Result<f64> {
        let input = features.ordered_by(&self.feature_columns[..]);
        self.scorer.score(&input)
    }

    pub fn scorer(&self) -> &Arc<dyn Scorer> {
        &self.scorer
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBundle")
            .field("scorer", &self.scorer.name())
            .field("feature_columns", &self.feature_columns)
            .field("decision_threshold", &self.decision_threshold)
            .field("model_version", &self.model_version)
            .finish()
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(Error::bundle(format!(
            "decision_threshold must be in (0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}
