//! Lexical URL feature extraction
//!
//! URLs are encoded as 19 character-level counts. No URL parsing happens
//! here: the scan is purely literal, so malformed or schemeless input is
//! handled the same way as well-formed URLs.
//!
//! Lengths are counted in Unicode scalar values (`str::chars`), never bytes.
//! Training data and served requests must go through this same function.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of features produced for every URL
pub const FEATURE_COUNT: usize = 19;

/// Feature names in the exact order the classifier consumes them.
///
/// The spellings match the columns of the training dataset and must not be
/// corrected.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "url_length",
    "n_dots",
    "n_hypens",
    "n_underline",
    "n_slash",
    "n_questionmark",
    "n_equal",
    "n_at",
    "n_and",
    "n_exclamation",
    "n_space",
    "n_tilde",
    "n_comma",
    "n_plus",
    "n_asterisk",
    "n_hastag",
    "n_dollar",
    "n_percent",
    "n_redirection",
];

const URL_LENGTH: usize = 0;
const N_REDIRECTION: usize = 18;

/// Column slot for each tracked punctuation character
fn tracked_slot(ch: char) -> Option<usize> {
    let slot = match ch {
        '.' => 1,
        '-' => 2,
        '_' => 3,
        '/' => 4,
        '?' => 5,
        '=' => 6,
        '@' => 7,
        '&' => 8,
        '!' => 9,
        ' ' => 10,
        '~' => 11,
        ',' => 12,
        '+' => 13,
        '*' => 14,
        '#' => 15,
        '$' => 16,
        '%' => 17,
        _ => return None,
    };
    Some(slot)
}

/// Position of a feature name in [`FEATURE_COLUMNS`]
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|column| *column == name)
}

/// Fixed-order feature encoding of a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureVector {
    values: [u64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Value of a named feature. Unknown names read as 0.
    pub fn get(&self, name: &str) -> u64 {
        column_index(name).map_or(0, |idx| self.values[idx])
    }

    /// Raw values in [`FEATURE_COLUMNS`] order
    pub fn values(&self) -> &[u64; FEATURE_COUNT] {
        &self.values
    }

    /// Number of characters in the URL
    pub fn url_length(&self) -> u64 {
        self.values[URL_LENGTH]
    }

    /// `//` occurrences beyond the first
    pub fn n_redirection(&self) -> u64 {
        self.values[N_REDIRECTION]
    }

    /// Iterate `(name, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.values.iter().copied())
    }

    /// Model input in the canonical [`FEATURE_COLUMNS`] order
    pub fn to_model_input(&self) -> Vec<f64> {
        self.values.iter().map(|v| *v as f64).collect()
    }

    /// Model input ordered by an arbitrary column list.
    ///
    /// Columns this extractor does not compute are filled with 0 so the
    /// output length always equals `columns.len()`.
    pub fn ordered_by<S: AsRef<str>>(&self, columns: &[S]) -> Vec<f64> {
        columns
            .iter()
            .map(|column| self.get(column.as_ref()) as f64)
            .collect()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Extract the feature vector of a URL. Never fails.
pub fn extract(url: &str) -> FeatureVector {
    let mut values = [0u64; FEATURE_COUNT];

    for ch in url.chars() {
        values[URL_LENGTH] += 1;
        if let Some(slot) = tracked_slot(ch) {
            values[slot] += 1;
        }
    }

    // The first `//` is normally the scheme separator
    let double_slashes = url.matches("//").count() as u64;
    values[N_REDIRECTION] = double_slashes.saturating_sub(1);

    FeatureVector { values }
}
