//! Feature pipeline configuration and execution.
//!
//! A pipeline binds one feature extractor to one vectorizer configuration.
//! An ordered list of pipelines defines a model's feature space: pipeline
//! order fixes the column-block offsets in the concatenated vector, so the
//! list is part of the model contract and is passed in explicitly rather
//! than read from global state.

use serde::{Deserialize, Serialize};

use crate::error::{FormcastError, Result};
use crate::vectorize::dict::{DictVectorizer, FeatureMap};
use crate::vectorize::sparse::SparseVector;
use crate::vectorize::tfidf::{AnalyzerKind, TfidfVectorizer};

/// Which vectorizer a pipeline feeds.
///
/// `Count` is the TF-IDF vectorizer with IDF weighting disabled, not a
/// separate implementation; the n-gram range, `min_df`, `binary` and
/// analyzer knobs behave identically for both text kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    Dict,
    Count,
    Tfidf,
}

/// Immutable vectorizer configuration for one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kind: VectorizerKind,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_min_df")]
    pub min_df: usize,
    #[serde(default)]
    pub binary: bool,
    #[serde(default = "default_analyzer")]
    pub analyzer: AnalyzerKind,
    /// Explicit stop word set (word analyzer only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_words: Option<Vec<String>>,
    /// Use the built-in English stop word list.
    #[serde(default)]
    pub english_stop_words: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_min_df() -> usize {
    1
}

fn default_analyzer() -> AnalyzerKind {
    AnalyzerKind::Word
}

impl PipelineConfig {
    /// Configuration for a dict pipeline (the text knobs are unused).
    pub fn dict() -> Self {
        Self {
            kind: VectorizerKind::Dict,
            ngram_range: default_ngram_range(),
            min_df: default_min_df(),
            binary: false,
            analyzer: default_analyzer(),
            stop_words: None,
            english_stop_words: false,
        }
    }

    /// Configuration for a count or tfidf pipeline.
    pub fn text(
        kind: VectorizerKind,
        ngram_range: (usize, usize),
        min_df: usize,
        binary: bool,
        analyzer: AnalyzerKind,
    ) -> Self {
        Self {
            kind,
            ngram_range,
            min_df,
            binary,
            analyzer,
            stop_words: None,
            english_stop_words: false,
        }
    }

    /// Attach an explicit stop word set.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = Some(words.into_iter().map(Into::into).collect());
        self
    }

    /// Use the built-in English stop word list.
    pub fn with_english_stop_words(mut self) -> Self {
        self.english_stop_words = true;
        self
    }

    /// Build the unfitted text vectorizer described by this config.
    fn build_tfidf(&self) -> Result<TfidfVectorizer> {
        let use_idf = self.kind == VectorizerKind::Tfidf;
        let mut tv = TfidfVectorizer::new(
            self.ngram_range,
            self.min_df,
            self.binary,
            self.analyzer,
            use_idf,
        )?;
        if let Some(words) = &self.stop_words {
            tv = tv.with_stop_words(words.clone());
        }
        if self.english_stop_words {
            tv = tv.with_english_stop_words();
        }
        Ok(tv)
    }
}

/// Output of one feature extractor for one markup node.
///
/// The tagged variant replaces a dual-method extractor interface: each
/// extractor produces exactly one of the two forms, so there is no
/// "returns empty when wrong kind" convention to misuse.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorOutput {
    Text(String),
    Dict(FeatureMap),
}

/// A fitted vectorizer with its frozen vocabulary state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FittedVectorizer {
    Dict(DictVectorizer),
    Tfidf(TfidfVectorizer),
}

impl FittedVectorizer {
    /// Frozen column count.
    pub fn vocab_size(&self) -> usize {
        match self {
            FittedVectorizer::Dict(dv) => dv.vocab_size(),
            FittedVectorizer::Tfidf(tv) => tv.vocab_size(),
        }
    }

    /// Check persisted vectorizer state for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a vectorize error when the vocabulary or IDF state is
    /// corrupt (e.g. a hand-edited model file).
    pub fn validate(&self) -> Result<()> {
        match self {
            FittedVectorizer::Dict(dv) => dv.validate(),
            FittedVectorizer::Tfidf(tv) => tv.validate(),
        }
    }

    /// Vectorize one extractor output.
    ///
    /// # Errors
    ///
    /// Returns a vectorize error when the output form does not match the
    /// vectorizer kind (a wiring bug, not a data condition).
    pub fn transform(&self, output: &ExtractorOutput) -> Result<SparseVector> {
        match (self, output) {
            (FittedVectorizer::Dict(dv), ExtractorOutput::Dict(features)) => {
                Ok(dv.transform(features))
            }
            (FittedVectorizer::Tfidf(tv), ExtractorOutput::Text(text)) => Ok(tv.transform(text)),
            (FittedVectorizer::Dict(_), ExtractorOutput::Text(_)) => Err(
                FormcastError::vectorize("dict pipeline received text output"),
            ),
            (FittedVectorizer::Tfidf(_), ExtractorOutput::Dict(_)) => Err(
                FormcastError::vectorize("text pipeline received dict output"),
            ),
        }
    }
}

/// An ordered list of fitted pipelines defining a model's feature space.
#[derive(Debug, Clone)]
pub struct PipelineSet {
    vectorizers: Vec<FittedVectorizer>,
}

impl PipelineSet {
    /// Assemble a set from already-fitted vectorizers (model loading).
    pub fn from_fitted(vectorizers: Vec<FittedVectorizer>) -> Self {
        Self { vectorizers }
    }

    /// Fit each pipeline on its extractor output column and return the
    /// fitted set together with the per-sample concatenated vectors.
    ///
    /// `columns[i][j]` is pipeline `i`'s extractor output for sample `j`;
    /// every column must cover the same samples.
    pub fn fit(
        configs: &[PipelineConfig],
        columns: &[Vec<ExtractorOutput>],
    ) -> Result<(Self, Vec<SparseVector>)> {
        if configs.len() != columns.len() {
            return Err(FormcastError::vectorize(format!(
                "{} pipeline configs but {} extractor columns",
                configs.len(),
                columns.len()
            )));
        }
        let n_samples = columns.first().map(|c| c.len()).unwrap_or(0);
        if columns.iter().any(|c| c.len() != n_samples) {
            return Err(FormcastError::vectorize(
                "extractor columns cover different sample counts",
            ));
        }

        let mut vectorizers = Vec::with_capacity(configs.len());
        let mut per_pipeline: Vec<Vec<SparseVector>> = Vec::with_capacity(configs.len());

        for (config, column) in configs.iter().zip(columns) {
            match config.kind {
                VectorizerKind::Dict => {
                    let maps: Vec<FeatureMap> = column
                        .iter()
                        .map(|out| match out {
                            ExtractorOutput::Dict(features) => Ok(features.clone()),
                            ExtractorOutput::Text(_) => Err(FormcastError::vectorize(
                                "dict pipeline received text output",
                            )),
                        })
                        .collect::<Result<_>>()?;
                    let mut dv = DictVectorizer::new();
                    per_pipeline.push(dv.fit_transform(&maps));
                    vectorizers.push(FittedVectorizer::Dict(dv));
                }
                VectorizerKind::Count | VectorizerKind::Tfidf => {
                    let texts: Vec<String> = column
                        .iter()
                        .map(|out| match out {
                            ExtractorOutput::Text(text) => Ok(text.clone()),
                            ExtractorOutput::Dict(_) => Err(FormcastError::vectorize(
                                "text pipeline received dict output",
                            )),
                        })
                        .collect::<Result<_>>()?;
                    let mut tv = config.build_tfidf()?;
                    per_pipeline.push(tv.fit_transform(&texts));
                    vectorizers.push(FittedVectorizer::Tfidf(tv));
                }
            }
        }

        let set = Self { vectorizers };
        let mut samples = Vec::with_capacity(n_samples);
        for j in 0..n_samples {
            let blocks: Vec<SparseVector> =
                per_pipeline.iter().map(|column| column[j].clone()).collect();
            samples.push(SparseVector::concat(&blocks));
        }
        Ok((set, samples))
    }

    /// Vectorize one sample's extractor outputs into the full concatenated
    /// feature vector.
    pub fn transform(&self, outputs: &[ExtractorOutput]) -> Result<SparseVector> {
        if outputs.len() != self.vectorizers.len() {
            return Err(FormcastError::vectorize(format!(
                "{} extractor outputs for {} pipelines",
                outputs.len(),
                self.vectorizers.len()
            )));
        }
        let blocks: Vec<SparseVector> = self
            .vectorizers
            .iter()
            .zip(outputs)
            .map(|(v, out)| v.transform(out))
            .collect::<Result<_>>()?;
        Ok(SparseVector::concat(&blocks))
    }

    /// Total dimension of the concatenated feature space.
    pub fn total_dim(&self) -> usize {
        self.vectorizers.iter().map(|v| v.vocab_size()).sum()
    }

    /// Number of pipelines in the set.
    pub fn len(&self) -> usize {
        self.vectorizers.len()
    }

    /// Whether the set has no pipelines.
    pub fn is_empty(&self) -> bool {
        self.vectorizers.is_empty()
    }

    /// Access the fitted vectorizers in pipeline order.
    pub fn vectorizers(&self) -> &[FittedVectorizer] {
        &self.vectorizers
    }
}
