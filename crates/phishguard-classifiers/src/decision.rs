//! Threshold decision policy
//!
//! Serving applies a single comparison, [`decide`]. Calibration picks the
//! threshold offline with [`ThresholdSearch`], preferring specificity on
//! legitimate URLs over recall on phishing URLs, then floors the result at
//! a fixed safety threshold.

use crate::evaluation::ConfusionMatrix;
use phishguard_core::ValidationSample;
use tracing::debug;

/// Minimum threshold ever produced by calibration
pub const SAFETY_FLOOR: f64 = 0.99;

/// Threshold reported when no candidate beats the initial state
pub const INITIAL_THRESHOLD: f64 = 0.5;

/// Flag a URL when its probability reaches the threshold (inclusive)
#[inline]
pub fn decide(probability: f64, threshold: f64) -> bool {
    probability >= threshold
}

/// Evenly spaced values from `start` to `stop` inclusive.
///
/// Values are computed as `start + i * step`, with the last value pinned to
/// `stop` exactly.
pub fn linspace(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (steps - 1) as f64;
            let mut values: Vec<f64> = (0..steps).map(|i| start + i as f64 * step).collect();
            values[steps - 1] = stop;
            values
        }
    }
}

/// Grid search over candidate thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSearch {
    /// First candidate
    pub start: f64,
    /// Last candidate (inclusive)
    pub stop: f64,
    /// Number of candidates
    pub steps: usize,
    /// Specificity differences within this margin count as ties
    pub tolerance: f64,
    /// Lower bound applied to the selected threshold
    pub floor: f64,
}

impl Default for ThresholdSearch {
    fn default() -> Self {
        Self {
            start: 0.10,
            stop: 0.99,
            steps: 45,
            tolerance: 1e-3,
            floor: SAFETY_FLOOR,
        }
    }
}

/// Outcome of a threshold search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSelection {
    /// Best candidate found by the search, before flooring
    pub selected: f64,
    /// Threshold to ship: `max(selected, floor)`
    pub threshold: f64,
    /// Legitimate-class specificity at `selected`
    pub specificity: f64,
    /// Phishing-class recall at `selected`
    pub recall: f64,
}

impl ThresholdSearch {
    /// Candidate thresholds in search order
    pub fn candidates(&self) -> Vec<f64> {
        linspace(self.start, self.stop, self.steps)
    }

    /// Select a threshold from labelled validation probabilities.
    ///
    /// A candidate wins when its specificity beats the best so far by more
    /// than `tolerance`, or ties within `tolerance` with strictly higher
    /// recall. Empty classes score 0 on the corresponding metric.
    pub fn select(&self, samples: &[ValidationSample]) -> ThresholdSelection {
        let mut best_threshold = INITIAL_THRESHOLD;
        let mut best_specificity = 0.0;
        let mut best_recall = 0.0;

        for candidate in self.candidates() {
            let matrix = ConfusionMatrix::from_samples(samples, candidate);
            let specificity = matrix.specificity();
            let recall = matrix.recall();

            let clearly_better = specificity > best_specificity + self.tolerance;
            let tied_with_better_recall =
                (specificity - best_specificity).abs() < self.tolerance && recall > best_recall;

            if clearly_better || tied_with_better_recall {
                debug!(
                    "threshold {:.4}: specificity={:.4} recall={:.4} (new best)",
                    candidate, specificity, recall
                );
                best_threshold = candidate;
                best_specificity = specificity;
                best_recall = recall;
            }
        }

        ThresholdSelection {
            selected: best_threshold,
            threshold: best_threshold.max(self.floor),
            specificity: best_specificity,
            recall: best_recall,
        }
    }
}
