//! Dict vectorizer: one-hot encoding of boolean/categorical feature maps.
//!
//! Extractors that describe structure (e.g. "has `<textarea>`", form method)
//! produce a [`FeatureMap`]; this vectorizer turns those maps into sparse
//! indicator vectors over a `key=value` token vocabulary learned at fit
//! time and frozen afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FormcastError, Result};
use crate::vectorize::sparse::SparseVector;

/// A single boolean or categorical feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Boolean feature; both polarities become distinct vocabulary tokens.
    Bool(bool),
    /// Categorical feature (e.g. an HTTP method string).
    Text(String),
}

/// Ordered feature name -> value mapping produced by dict extractors.
///
/// `BTreeMap` keeps key iteration deterministic so column assignment is
/// reproducible across fits of the same corpus.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

fn feature_token(key: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Bool(b) => format!("{key}={b}"),
        FeatureValue::Text(s) => format!("{key}={s}"),
    }
}

/// One-hot vectorizer over `key=value` feature tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictVectorizer {
    /// Token -> column index, assigned in first-seen order during fit.
    vocabulary: BTreeMap<String, usize>,
}

impl DictVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns in the frozen vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Build the vocabulary from a corpus of feature maps and return the
    /// corpus vectors. Each distinct `key=value` token gets a column in
    /// first-seen order.
    pub fn fit_transform(&mut self, corpus: &[FeatureMap]) -> Vec<SparseVector> {
        self.vocabulary.clear();
        let mut next_index = 0;
        for features in corpus {
            for (key, value) in features {
                let token = feature_token(key, value);
                self.vocabulary.entry(token).or_insert_with(|| {
                    let idx = next_index;
                    next_index += 1;
                    idx
                });
            }
        }
        corpus.iter().map(|f| self.transform(f)).collect()
    }

    /// Vectorize one feature map against the frozen vocabulary.
    ///
    /// Tokens unseen at fit time contribute nothing; they never error and
    /// never grow the vocabulary.
    pub fn transform(&self, features: &FeatureMap) -> SparseVector {
        let mut vector = SparseVector::new(self.vocab_size());
        for (key, value) in features {
            if let Some(&idx) = self.vocabulary.get(&feature_token(key, value)) {
                vector.set(idx, 1.0);
            }
        }
        vector
    }

    /// Column index for a raw token, if present. Used by tests and
    /// debugging tools.
    pub fn column(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    /// Check persisted vocabulary state for internal consistency.
    ///
    /// # Errors
    ///
    /// An out-of-range column index means the serialized state was
    /// corrupted.
    pub fn validate(&self) -> Result<()> {
        let size = self.vocabulary.len();
        for (token, &idx) in &self.vocabulary {
            if idx >= size {
                return Err(FormcastError::vectorize(format!(
                    "vocabulary index {idx} for token {token:?} is out of range"
                )));
            }
        }
        Ok(())
    }
}
