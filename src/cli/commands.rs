//! Command implementations for the formcast CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use scraper::Html;
use serde::Deserialize;

use crate::classifier::{
    DEFAULT_MODEL_NAME, FormClassifier, train_field_model, train_form_model, train_page_model,
};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{FormcastError, Result};
use crate::features::{FieldRef, PageRef};
use crate::html;
use crate::captcha;
use crate::model::{LinearModel, TrainConfig};

/// Execute a CLI command.
pub fn execute_command(args: FormcastArgs) -> Result<()> {
    match &args.command {
        Command::Classify(classify_args) => classify(classify_args.clone(), &args),
        Command::Train(train_args) => train(train_args.clone(), &args),
        Command::DetectCaptcha(captcha_args) => detect_captcha(captcha_args.clone(), &args),
        Command::Inspect(inspect_args) => inspect(inspect_args.clone(), &args),
    }
}

fn resolve_model_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => FormClassifier::find_model(DEFAULT_MODEL_NAME),
    }
}

/// Classify the forms (and optionally the page) in an HTML file.
fn classify(args: ClassifyArgs, cli_args: &FormcastArgs) -> Result<()> {
    let model_path = resolve_model_path(args.model)?;
    if cli_args.verbosity() > 1 {
        println!("Loading model from: {}", model_path.display());
    }
    let classifier = FormClassifier::load(&model_path)?;
    let html_str = fs::read_to_string(&args.html_file)?;

    match (&args.url, args.proba) {
        (Some(url), false) => {
            let result = classifier.extract_page(&html_str, url)?;
            output_result("Page classified", &result, cli_args)
        }
        (Some(url), true) => {
            let result = classifier.extract_page_proba(&html_str, url, args.threshold)?;
            output_result("Page classified", &result, cli_args)
        }
        (None, false) => {
            let results = classifier.extract_forms(&html_str)?;
            output_result("Forms classified", &results, cli_args)
        }
        (None, true) => {
            let results = classifier.extract_forms_proba(&html_str, args.threshold)?;
            output_result("Forms classified", &results, cli_args)
        }
    }
}

/// One annotated page of a training dataset.
#[derive(Debug, Deserialize)]
struct TrainingDoc {
    html: String,
    #[serde(default)]
    url: String,
    /// Page type label; pages carrying one contribute to the page model.
    #[serde(default)]
    page_type: Option<String>,
    #[serde(default)]
    forms: Vec<TrainingForm>,
}

/// One labeled form within a training page.
#[derive(Debug, Deserialize)]
struct TrainingForm {
    /// Index into the page's forms, in document order.
    #[serde(default)]
    index: usize,
    #[serde(rename = "type")]
    form_type: String,
    /// Field type labels keyed by control name.
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

/// Train a model bundle from a labeled dataset.
fn train(args: TrainArgs, cli_args: &FormcastArgs) -> Result<()> {
    let data = fs::read_to_string(&args.dataset)?;
    let dataset: Vec<TrainingDoc> = serde_json::from_str(&data)?;
    if dataset.is_empty() {
        return Err(FormcastError::train("dataset is empty"));
    }
    let config = TrainConfig {
        c: args.c,
        max_iter: args.max_iter,
        balance_classes: !args.no_balance,
    };

    let docs: Vec<Html> = dataset.iter().map(|d| html::parse_document(&d.html)).collect();

    let mut form_refs = Vec::new();
    let mut form_labels = Vec::new();
    let mut field_refs = Vec::new();
    let mut field_labels = Vec::new();
    for (doc_idx, (doc, annotated)) in docs.iter().zip(&dataset).enumerate() {
        let forms = html::forms(doc);
        for ann in &annotated.forms {
            let Some(form) = forms.get(ann.index).copied() else {
                return Err(FormcastError::train(format!(
                    "document {doc_idx} has {} forms but annotates form {}",
                    forms.len(),
                    ann.index
                )));
            };
            form_refs.push(form);
            form_labels.push(ann.form_type.clone());
            for control in html::visible_controls(form) {
                let name = html::control_name(control);
                if let Some(field_type) = ann.fields.get(&name) {
                    field_refs.push(FieldRef { form, control });
                    field_labels.push(field_type.clone());
                }
            }
        }
    }

    // Page samples use the annotated form types, not model predictions.
    let mut page_docs = Vec::new();
    let mut page_labels = Vec::new();
    let mut page_form_types = Vec::new();
    for (i, annotated) in dataset.iter().enumerate() {
        if let Some(page_type) = &annotated.page_type {
            page_docs.push(i);
            page_labels.push(page_type.clone());
            page_form_types.push(
                annotated
                    .forms
                    .iter()
                    .map(|f| f.form_type.clone())
                    .collect::<Vec<_>>(),
            );
        }
    }
    let page_refs: Vec<PageRef<'_>> = page_docs
        .iter()
        .zip(&page_form_types)
        .map(|(&i, form_types)| PageRef {
            doc: &docs[i],
            url: &dataset[i].url,
            form_types,
        })
        .collect();

    if cli_args.verbosity() > 1 {
        println!(
            "Training on {} forms, {} fields, {} pages",
            form_refs.len(),
            field_refs.len(),
            page_refs.len()
        );
    }

    let form_model = train_form_model(&form_refs, &form_labels, &config)?;
    let field_model = train_field_model(&field_refs, &field_labels, &config)?;
    let page_model = if page_refs.is_empty() {
        None
    } else {
        Some(train_page_model(&page_refs, &page_labels, &config)?)
    };

    let summary = TrainSummary {
        output: args.output.to_string_lossy().to_string(),
        form_classes: form_model.classifier.classes.clone(),
        field_classes: field_model.classifier.classes.clone(),
        page_classes: page_model.as_ref().map(|m| m.classifier.classes.clone()),
        form_samples: form_refs.len(),
        field_samples: field_refs.len(),
        page_samples: page_refs.len(),
    };

    let classifier = FormClassifier::from_models(form_model, field_model, page_model)?;
    classifier.save(&args.output)?;

    output_result("Model trained successfully", &summary, cli_args)
}

/// Detect CAPTCHA markers in an HTML file.
fn detect_captcha(args: DetectCaptchaArgs, cli_args: &FormcastArgs) -> Result<()> {
    let html_str = fs::read_to_string(&args.html_file)?;
    let doc = html::parse_document(&html_str);
    let forms: Vec<_> = html::forms(&doc)
        .into_iter()
        .map(captcha::detect_in_form)
        .collect();
    let report = CaptchaReport {
        page: captcha::detect_in_html(&html_str),
        forms,
    };
    output_result("CAPTCHA scan complete", &report, cli_args)
}

/// Show the classes and pipelines of a model bundle.
fn inspect(args: InspectArgs, cli_args: &FormcastArgs) -> Result<()> {
    let model_path = resolve_model_path(args.model)?;
    let classifier = FormClassifier::load(&model_path)?;
    let info = BundleInfo {
        form: model_info(classifier.form_model()),
        fields: model_info(classifier.field_model()),
        page: classifier.page_model().map(model_info),
    };
    output_result("Model bundle", &info, cli_args)
}

fn model_info(model: &LinearModel) -> ModelInfo {
    let pipelines: Vec<PipelineInfo> = model
        .pipelines
        .iter()
        .map(|p| PipelineInfo {
            name: p.name.clone(),
            extractor: p.extractor.clone(),
            columns: p.vectorizer.vocab_size(),
        })
        .collect();
    ModelInfo {
        classes: model.classifier.classes.clone(),
        feature_columns: pipelines.iter().map(|p| p.columns).sum(),
        pipelines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_doc_parses_minimal_annotation() {
        let json = r#"[{
            "html": "<form><input type='text' name='q'></form>",
            "forms": [{"type": "search", "fields": {"q": "search query"}}]
        }]"#;
        let dataset: Vec<TrainingDoc> = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset[0].forms[0].index, 0);
        assert_eq!(dataset[0].forms[0].form_type, "search");
        assert!(dataset[0].page_type.is_none());
    }

    #[test]
    fn test_training_doc_rejects_missing_type() {
        let json = r#"[{"html": "<form></form>", "forms": [{"fields": {}}]}]"#;
        assert!(serde_json::from_str::<Vec<TrainingDoc>>(json).is_err());
    }
}
