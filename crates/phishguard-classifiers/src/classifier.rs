//! Scorer trait and shared helpers

use phishguard_core::{Error, Result};

/// Trait for all probability scorers.
///
/// A scorer maps a feature vector, ordered by the columns it was trained
/// on, to a phishing probability in `[0, 1]`. Scorers are read-only after
/// construction and shared across request handlers.
pub trait Scorer: Send + Sync {
    /// Score the given feature vector
    fn score(&self, features: &[f64]) -> Result<f64>;

    /// Number of features this scorer expects
    fn input_width(&self) -> usize;

    /// Get the scorer name
    fn name(&self) -> &str;
}

/// Reject vectors whose length does not match the scorer's width
pub(crate) fn check_width(scorer: &str, expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(Error::classifier(format!(
            "{} expects {} features, got {}",
            scorer,
            expected,
            features.len()
        )));
    }
    Ok(())
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse of [`sigmoid`]; maps a probability to a log-odds margin
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
