//! Offline threshold calibration
//!
//! Reads labelled validation records, scores them through a bundle when
//! needed, and writes the bundle back with the calibrated threshold.

use anyhow::{anyhow, bail, Context, Result};
use phishguard_classifiers::{
    roc_auc, BundleSpec, ClassificationReport, PhishingDetector, ThresholdSearch,
    ThresholdSelection,
};
use phishguard_core::ValidationSample;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::CalibrateArgs;

/// Threshold used for the pre-calibration report
pub const REPORT_THRESHOLD: f64 = 0.5;

/// Ground-truth label, either `true`/`false` or `1`/`0`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Label {
    Flag(bool),
    Class(u8),
}

impl Label {
    fn is_phishing(self) -> Result<bool> {
        match self {
            Label::Flag(flag) => Ok(flag),
            Label::Class(0) => Ok(false),
            Label::Class(1) => Ok(true),
            Label::Class(other) => bail!("label must be 0 or 1, got {}", other),
        }
    }
}

/// One JSON Lines validation record
#[derive(Debug, Deserialize)]
struct ValidationRecord {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    probability: Option<f64>,
    phishing: Label,
}

impl ValidationRecord {
    fn into_sample(self, detector: &PhishingDetector) -> Result<ValidationSample> {
        let phishing = self.phishing.is_phishing()?;
        let probability = match (self.probability, self.url) {
            (Some(p), _) if (0.0..=1.0).contains(&p) => p,
            (Some(p), _) => bail!("probability must be within [0, 1], got {}", p),
            (None, Some(url)) => detector.probability(&url)?,
            (None, None) => bail!("record needs either \"url\" or \"probability\""),
        };
        Ok(ValidationSample {
            probability,
            phishing,
        })
    }
}

/// Parse JSON Lines validation records; blank lines are skipped
pub fn parse_validation(
    content: &str,
    detector: &PhishingDetector,
) -> Result<Vec<ValidationSample>> {
    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: ValidationRecord = serde_json::from_str(line)
            .with_context(|| format!("validation line {}", index + 1))?;
        let sample = record
            .into_sample(detector)
            .with_context(|| format!("validation line {}", index + 1))?;
        samples.push(sample);
    }

    if samples.is_empty() {
        bail!("no validation records found");
    }
    Ok(samples)
}

/// Read a JSON Lines validation file
pub fn read_validation(path: &Path, detector: &PhishingDetector) -> Result<Vec<ValidationSample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read validation file {}", path.display()))?;
    parse_validation(&content, detector)
}

/// Result of a calibration run
#[derive(Debug, Clone)]
pub struct Calibration {
    /// Report at [`REPORT_THRESHOLD`], before any search
    pub report: ClassificationReport,
    /// `None` when the validation set holds a single class
    pub roc_auc: Option<f64>,
    pub selection: ThresholdSelection,
    /// Where the calibrated bundle was written, if anywhere
    pub written_to: Option<PathBuf>,
}

/// Evaluate validation samples and search for a threshold
pub fn evaluate(
    samples: &[ValidationSample],
    search: &ThresholdSearch,
) -> (ClassificationReport, Option<f64>, ThresholdSelection) {
    let report = ClassificationReport::new(samples, REPORT_THRESHOLD);
    let auc = roc_auc(samples);
    let selection = search.select(samples);
    (report, auc, selection)
}

/// Run the `calibrate` subcommand
pub fn run(args: &CalibrateArgs) -> Result<Calibration> {
    // Bundles straight from training carry no threshold yet; scoring does
    // not depend on it, so any valid placeholder works here
    let mut spec = BundleSpec::from_file(&args.bundle)?;
    let scoring_threshold = spec.decision_threshold.unwrap_or(REPORT_THRESHOLD);
    let detector = PhishingDetector::new(spec.build_with_threshold(scoring_threshold)?);

    let samples = read_validation(&args.validation, &detector)?;
    let phishing = samples.iter().filter(|s| s.phishing).count();
    info!(
        "Loaded {} validation samples ({} phishing, {} legitimate)",
        samples.len(),
        phishing,
        samples.len() - phishing
    );

    let (report, auc, selection) = evaluate(&samples, &ThresholdSearch::default());
    info!(
        "Selected threshold {:.4} (specificity={:.4}, recall={:.4}); final threshold {:.4}",
        selection.selected, selection.specificity, selection.recall, selection.threshold
    );

    let written_to = if args.dry_run {
        None
    } else {
        let output = args.output.clone().unwrap_or_else(|| args.bundle.clone());
        spec.decision_threshold = Some(selection.threshold);
        spec.build()
            .map_err(|e| anyhow!("calibrated bundle failed validation: {}", e))?;
        spec.save(&output)?;
        info!("Wrote calibrated bundle to {}", output.display());
        Some(output)
    };

    Ok(Calibration {
        report,
        roc_auc: auc,
        selection,
        written_to,
    })
}
