//! Feature extractors and default pipeline tables for the three model
//! kinds: forms, fields and pages.
//!
//! Extractors are tagged enums rather than trait objects: the tag is
//! what gets persisted with a model, and `from_tag` is how a loaded
//! model finds its extractors again. Adding a variant without a stable
//! tag breaks old model files, so tags never change.

pub mod field;
pub mod form;
pub mod page;

pub use field::{FieldExtractor, FieldRef, default_field_pipelines};
pub use form::{FormExtractor, default_form_pipelines};
pub use page::{PageExtractor, PageRef, default_page_pipelines};

use crate::model::PipelineMeta;
use crate::vectorize::PipelineConfig;

/// One named pipeline: an extractor bound to a vectorizer config.
#[derive(Debug, Clone)]
pub struct Pipeline<E> {
    pub name: &'static str,
    pub extractor: E,
    pub config: PipelineConfig,
}

impl<E> Pipeline<E> {
    pub(crate) fn new(name: &'static str, extractor: E, config: PipelineConfig) -> Self {
        Self {
            name,
            extractor,
            config,
        }
    }
}

/// Convert a pipeline table into the metadata tuples the model layer
/// persists alongside fitted vectorizers.
pub fn pipeline_meta<E, F>(pipelines: &[Pipeline<E>], tag: F) -> Vec<PipelineMeta>
where
    F: Fn(&E) -> &'static str,
{
    pipelines
        .iter()
        .map(|p| (p.name.to_string(), tag(&p.extractor).to_string(), p.config.clone()))
        .collect()
}
