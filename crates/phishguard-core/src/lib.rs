//! PhishGuard Core
//!
//! Core types and utilities shared across PhishGuard components.
//!
//! This crate provides:
//! - Error types and result handling
//! - The `Verdict` returned for every scored URL
//! - Labelled validation samples used by offline calibration

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ValidationSample, Verdict};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ValidationSample, Verdict};
}
