//! Feature vectorization: sparse vectors, dict and TF-IDF vectorizers,
//! and the pipeline machinery that concatenates per-pipeline column
//! blocks into one feature space.
//!
//! Vocabularies are built once during fit and frozen; transforming
//! unseen input never errors and never changes the feature space.

pub mod dict;
pub mod pipeline;
pub mod sparse;
pub mod stop_words;
pub mod tfidf;

pub use dict::{DictVectorizer, FeatureMap, FeatureValue};
pub use pipeline::{
    ExtractorOutput, FittedVectorizer, PipelineConfig, PipelineSet, VectorizerKind,
};
pub use sparse::SparseVector;
pub use stop_words::english_stop_words;
pub use tfidf::{AnalyzerKind, TfidfVectorizer};
