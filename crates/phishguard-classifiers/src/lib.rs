//! PhishGuard Classifiers
//!
//! Lexical phishing detection for URLs.
//!
//! The crate is organized around the path a URL takes:
//! - `features`: URL string to a fixed-order 19-column count vector
//! - `model` / `bundle`: trained scorers and the artifact that ships them
//! - `decision`: the threshold rule used at serving time and the offline
//!   threshold search used during calibration
//! - `evaluation`: confusion matrix, classification report, ROC-AUC
//! - `detector`: extract, score and decide in one call
//!
//! Everything on the request path is pure and allocation-light, so a single
//! detector can be shared across threads without locking.

pub mod bundle;
pub mod classifier;
pub mod decision;
pub mod detector;
pub mod evaluation;
pub mod features;
pub mod model;

pub use bundle::{BundleSpec, ModelBundle};
pub use classifier::Scorer;
pub use decision::{decide, ThresholdSearch, ThresholdSelection, SAFETY_FLOOR};
pub use detector::PhishingDetector;
pub use evaluation::{roc_auc, ClassificationReport, ConfusionMatrix};
pub use features::{extract, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use model::{ModelSpec, RegressionTree, StandardScaler, TreeNode};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bundle::{BundleSpec, ModelBundle};
    pub use crate::classifier::Scorer;
    pub use crate::decision::{decide, ThresholdSearch};
    pub use crate::detector::PhishingDetector;
    pub use crate::features::{extract, FeatureVector, FEATURE_COLUMNS};
}
