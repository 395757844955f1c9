//! Core types for PhishGuard

use serde::{Deserialize, Serialize};

/// Outcome of scoring a single URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The URL exactly as submitted
    pub url: String,

    /// Whether the probability reached the decision threshold
    pub is_phishing: bool,

    /// Phishing probability reported by the model (0.0-1.0)
    pub probability_phishing: f64,

    /// Version of the model bundle that produced this verdict
    pub model_version: String,
}

impl Verdict {
    /// Create a new verdict
    pub fn new(
        url: impl Into<String>,
        is_phishing: bool,
        probability_phishing: f64,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            is_phishing,
            probability_phishing,
            model_version: model_version.into(),
        }
    }
}

/// A labelled model output from the validation split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSample {
    /// Phishing probability produced by the classifier
    pub probability: f64,

    /// Ground truth: `true` for phishing, `false` for legitimate
    pub phishing: bool,
}

impl ValidationSample {
    /// Create a phishing sample with the given probability
    pub fn phishing(probability: f64) -> Self {
        Self {
            probability,
            phishing: true,
        }
    }

    /// Create a legitimate sample with the given probability
    pub fn legitimate(probability: f64) -> Self {
        Self {
            probability,
            phishing: false,
        }
    }
}
