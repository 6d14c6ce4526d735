//! Serializable classifier models and runtime rehydration.
//!
//! A persisted model bundles the class list, coefficient matrix,
//! intercepts and per-pipeline vectorizer state (vocabularies, IDF
//! weights) — enough to reconstruct the vectorizers without retraining.
//! Dimension integrity is validated when the runtime is initialized,
//! never discovered lazily at first inference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FormcastError, Result};
use crate::model::linear::{LinearClassifier, TrainConfig};
use crate::vectorize::{ExtractorOutput, FittedVectorizer, PipelineConfig, PipelineSet, SparseVector};

/// One pipeline's persisted configuration and fitted vectorizer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedPipeline {
    /// Human-readable pipeline name ("submit text", "form url", ...).
    pub name: String,
    /// Stable extractor tag resolved by the feature layer at load time.
    pub extractor: String,
    pub config: PipelineConfig,
    pub vectorizer: FittedVectorizer,
}

/// Pipeline metadata supplied at fit time: name, extractor tag, config.
pub type PipelineMeta = (String, String, PipelineConfig);

/// A trained linear model together with its frozen feature space.
///
/// After deserialization the model must be warmed with
/// [`init_runtime`](Self::init_runtime) before any inference call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(flatten)]
    pub classifier: LinearClassifier,
    pub pipelines: Vec<SerializedPipeline>,
    #[serde(skip)]
    runtime: Option<PipelineSet>,
}

impl LinearModel {
    /// Fit vectorizers and classifier over a labeled corpus.
    ///
    /// `columns[i][j]` is pipeline `i`'s extractor output for sample `j`.
    /// The returned model is already warmed.
    pub fn fit(
        pipeline_meta: Vec<PipelineMeta>,
        columns: &[Vec<ExtractorOutput>],
        labels: &[String],
        config: &TrainConfig,
    ) -> Result<Self> {
        let configs: Vec<PipelineConfig> =
            pipeline_meta.iter().map(|(_, _, c)| c.clone()).collect();
        let (set, x) = PipelineSet::fit(&configs, columns)?;
        let classifier = LinearClassifier::train(&x, labels, config)?;
        log::info!(
            "fitted model: {} classes, {} pipelines, {} feature columns",
            classifier.num_classes(),
            set.len(),
            set.total_dim()
        );

        let pipelines = pipeline_meta
            .into_iter()
            .zip(set.vectorizers().iter().cloned())
            .map(|((name, extractor, config), vectorizer)| SerializedPipeline {
                name,
                extractor,
                config,
                vectorizer,
            })
            .collect();

        Ok(Self {
            classifier,
            pipelines,
            runtime: Some(set),
        })
    }

    /// Rehydrate vectorizers from persisted pipeline state and validate
    /// dimension integrity.
    ///
    /// # Errors
    ///
    /// A coefficient/intercept shape that does not match the class list
    /// or the combined vocabulary size is a fatal load error, as is a
    /// pipeline whose persisted vocabulary or IDF state is internally
    /// inconsistent.
    pub fn init_runtime(&mut self) -> Result<()> {
        if self.classifier.classes.is_empty() {
            return Err(FormcastError::model("model has no classes"));
        }
        for (i, class) in self.classifier.classes.iter().enumerate() {
            if self.classifier.classes[..i].contains(class) {
                return Err(FormcastError::model(format!(
                    "duplicate class {class:?} in model"
                )));
            }
        }
        let k = self.classifier.classes.len();
        if self.classifier.coef.len() != k {
            return Err(FormcastError::model(format!(
                "{} coefficient rows for {} classes",
                self.classifier.coef.len(),
                k
            )));
        }
        if self.classifier.intercept.len() != k {
            return Err(FormcastError::model(format!(
                "{} intercepts for {} classes",
                self.classifier.intercept.len(),
                k
            )));
        }

        for pipeline in &self.pipelines {
            pipeline.vectorizer.validate().map_err(|e| {
                FormcastError::model(format!("pipeline {:?}: {e}", pipeline.name))
            })?;
        }

        let set = PipelineSet::from_fitted(
            self.pipelines.iter().map(|p| p.vectorizer.clone()).collect(),
        );
        let total_dim = set.total_dim();
        for (i, row) in self.classifier.coef.iter().enumerate() {
            if row.len() != total_dim {
                return Err(FormcastError::model(format!(
                    "coefficient row {i} has width {} but pipelines provide {total_dim} columns",
                    row.len()
                )));
            }
        }

        self.runtime = Some(set);
        Ok(())
    }

    /// Whether the runtime has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    fn runtime(&self) -> Result<&PipelineSet> {
        self.runtime
            .as_ref()
            .ok_or_else(|| FormcastError::model("model not initialized"))
    }

    /// Vectorize one sample's extractor outputs.
    pub fn transform(&self, outputs: &[ExtractorOutput]) -> Result<SparseVector> {
        self.runtime()?.transform(outputs)
    }

    /// Predicted label for one sample.
    pub fn predict(&self, outputs: &[ExtractorOutput]) -> Result<&str> {
        let features = self.transform(outputs)?;
        Ok(self.classifier.predict(&features))
    }

    /// Probability for each class. Entries below `threshold` are omitted
    /// from the map; the argmax in [`predict`](Self::predict) is always
    /// taken over the full unfiltered distribution.
    pub fn predict_proba(
        &self,
        outputs: &[ExtractorOutput],
        threshold: f64,
    ) -> Result<BTreeMap<String, f64>> {
        let features = self.transform(outputs)?;
        let probs = self.classifier.predict_proba(&features);
        Ok(self
            .classifier
            .classes
            .iter()
            .zip(probs)
            .filter(|(_, p)| *p >= threshold)
            .map(|(class, p)| (class.clone(), p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::{AnalyzerKind, VectorizerKind};

    fn text_meta(name: &str) -> PipelineMeta {
        (
            name.to_string(),
            name.to_string(),
            PipelineConfig::text(VectorizerKind::Count, (1, 1), 1, true, AnalyzerKind::Word),
        )
    }

    fn text_out(s: &str) -> ExtractorOutput {
        ExtractorOutput::Text(s.to_string())
    }

    fn fit_toy_model() -> LinearModel {
        let columns = vec![vec![
            text_out("login password"),
            text_out("login password remember"),
            text_out("search query"),
            text_out("search box"),
        ]];
        let labels: Vec<String> = ["login", "login", "search", "search"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        LinearModel::fit(
            vec![text_meta("submit text")],
            &columns,
            &labels,
            &TrainConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_fit_produces_initialized_model() {
        let model = fit_toy_model();
        assert!(model.is_initialized());
        assert_eq!(model.predict(&[text_out("login password")]).unwrap(), "login");
        assert_eq!(model.predict(&[text_out("search box")]).unwrap(), "search");
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let model = fit_toy_model();
        let json = serde_json::to_string(&model).unwrap();
        let mut restored: LinearModel = serde_json::from_str(&json).unwrap();
        restored.init_runtime().unwrap();

        for text in ["login password", "search box", "never seen tokens"] {
            let a = model.predict_proba(&[text_out(text)], 0.0).unwrap();
            let b = restored.predict_proba(&[text_out(text)], 0.0).unwrap();
            assert_eq!(a, b, "probabilities diverged for {text:?}");
        }
    }

    #[test]
    fn test_uninitialized_model_refuses_inference() {
        let model = fit_toy_model();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LinearModel = serde_json::from_str(&json).unwrap();

        assert!(!restored.is_initialized());
        let err = restored.predict(&[text_out("login")]).unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn test_dimension_mismatch_rejected_at_load() {
        let model = fit_toy_model();
        let json = serde_json::to_string(&model).unwrap();
        let mut broken: LinearModel = serde_json::from_str(&json).unwrap();
        broken.classifier.coef[0].push(0.25);

        let err = broken.init_runtime().unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_truncated_idf_rejected_at_load() {
        let model = fit_toy_model();
        let mut value = serde_json::to_value(&model).unwrap();
        value["pipelines"][0]["vectorizer"]["idf"] = serde_json::json!([]);
        let mut broken: LinearModel = serde_json::from_value(value).unwrap();

        // Coefficient widths still match the vocabulary, so only the
        // per-pipeline check can reject this before inference.
        let err = broken.init_runtime().unwrap_err();
        assert!(err.to_string().contains("idf"), "unexpected error: {err}");
        assert!(err.to_string().contains("submit text"));
    }

    #[test]
    fn test_intercept_mismatch_rejected_at_load() {
        let model = fit_toy_model();
        let json = serde_json::to_string(&model).unwrap();
        let mut broken: LinearModel = serde_json::from_str(&json).unwrap();
        broken.classifier.intercept.pop();

        assert!(broken.init_runtime().is_err());
    }

    #[test]
    fn test_threshold_filters_but_argmax_is_unfiltered() {
        let model = fit_toy_model();
        let full = model.predict_proba(&[text_out("login password")], 0.0).unwrap();
        assert_eq!(full.len(), 2);

        let filtered = model.predict_proba(&[text_out("login password")], 0.5).unwrap();
        assert!(filtered.len() < full.len());
        assert!(filtered.contains_key("login"));
        // Argmax still computed over the full distribution.
        assert_eq!(model.predict(&[text_out("login password")]).unwrap(), "login");
    }
}
