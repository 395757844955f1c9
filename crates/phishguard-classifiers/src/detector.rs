//! URL phishing detector
//!
//! Composes the request path: extract features, order them by the bundle's
//! columns, score, and apply the bundle's threshold.

use crate::bundle::ModelBundle;
use crate::decision::decide;
use crate::features::extract;
use phishguard_core::{Error, Result, Verdict};
use std::sync::Arc;
use tracing::debug;

/// Shared read-only handle used by request handlers
#[derive(Debug, Clone)]
pub struct PhishingDetector {
    bundle: Arc<ModelBundle>,
}

impl PhishingDetector {
    /// Create a detector around a loaded bundle
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    /// The bundle backing this detector
    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Phishing probability for a URL
    pub fn probability(&self, url: &str) -> Result<f64> {
        let features = extract(url);
        let probability = self.bundle.score_features(&features)?;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(Error::classifier(format!(
                "scorer '{}' returned invalid probability {}",
                self.bundle.scorer().name(),
                probability
            )));
        }

        Ok(probability)
    }

    /// Score a URL and apply the decision threshold.
    ///
    /// An `Err` means no verdict could be computed; it is never folded into
    /// a low probability.
    pub fn predict(&self, url: &str) -> Result<Verdict> {
        let probability = self.probability(url)?;
        let is_phishing = decide(probability, self.bundle.decision_threshold());

        debug!(
            "Scored url (len={}): probability={:.4} threshold={:.3} phishing={}",
            url.chars().count(),
            probability,
            self.bundle.decision_threshold(),
            is_phishing
        );

        Ok(Verdict::new(
            url,
            is_phishing,
            probability,
            self.bundle.model_version(),
        ))
    }
}
