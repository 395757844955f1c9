//! Validation metrics for calibrated models

use crate::decision::decide;
use phishguard_core::ValidationSample;
use std::fmt;

/// Binary confusion matrix; phishing is the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_positives: u64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ConfusionMatrix {
    /// Tally predictions made at `threshold`
    pub fn from_samples(samples: &[ValidationSample], threshold: f64) -> Self {
        let mut matrix = Self::default();
        for sample in samples {
            match (sample.phishing, decide(sample.probability, threshold)) {
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> u64 {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// TN / (TN + FP): legitimate URLs kept below the threshold
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }

    /// TP / (TP + FN): phishing URLs flagged
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TN / (TN + FN)
    pub fn negative_predictive_value(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_negatives)
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negatives + self.true_positives, self.total())
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

impl ClassMetrics {
    fn new(precision: f64, recall: f64, support: u64) -> Self {
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }

    fn averaged(a: &Self, b: &Self, weight_a: f64, weight_b: f64) -> Self {
        Self {
            precision: a.precision * weight_a + b.precision * weight_b,
            recall: a.recall * weight_a + b.recall * weight_b,
            f1: a.f1 * weight_a + b.f1 * weight_b,
            support: a.support + b.support,
        }
    }
}

/// Per-class report at a fixed threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub threshold: f64,
    pub matrix: ConfusionMatrix,
    pub legitimate: ClassMetrics,
    pub phishing: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn new(samples: &[ValidationSample], threshold: f64) -> Self {
        let matrix = ConfusionMatrix::from_samples(samples, threshold);

        let legitimate = ClassMetrics::new(
            matrix.negative_predictive_value(),
            matrix.specificity(),
            matrix.true_negatives + matrix.false_positives,
        );
        let phishing = ClassMetrics::new(
            matrix.precision(),
            matrix.recall(),
            matrix.true_positives + matrix.false_negatives,
        );

        let total = matrix.total();
        let macro_avg = ClassMetrics::averaged(&legitimate, &phishing, 0.5, 0.5);
        let weighted_avg = ClassMetrics::averaged(
            &legitimate,
            &phishing,
            ratio(legitimate.support, total),
            ratio(phishing.support, total),
        );

        Self {
            threshold,
            matrix,
            legitimate,
            phishing,
            accuracy: matrix.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
        name, m.precision, m.recall, m.f1, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "threshold = {:.3}", self.threshold)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        write_row(f, "legitimate", &self.legitimate)?;
        write_row(f, "phishing", &self.phishing)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.matrix.total()
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)?;
        write!(
            f,
            "confusion: tn={} fp={} fn={} tp={}",
            self.matrix.true_negatives,
            self.matrix.false_positives,
            self.matrix.false_negatives,
            self.matrix.true_positives
        )
    }
}

/// Area under the ROC curve.
///
/// Computed as the Mann-Whitney statistic with average ranks for tied
/// probabilities. Returns `None` when either class is absent.
pub fn roc_auc(samples: &[ValidationSample]) -> Option<f64> {
    let positives = samples.iter().filter(|s| s.phishing).count();
    let negatives = samples.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut sorted: Vec<&ValidationSample> = samples.iter().collect();
    sorted.sort_by(|a, b| a.probability.total_cmp(&b.probability));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1].probability == sorted[i].probability {
            j += 1;
        }
        // Ranks are 1-based; tied block i..=j shares the mean rank
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        let tied_positives = sorted[i..=j].iter().filter(|s| s.phishing).count();
        positive_rank_sum += average_rank * tied_positives as f64;
        i = j + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}
