//! Public classification surface: the bundled form/field/page models,
//! model file discovery, and the extract-and-classify entry points.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use crate::captcha::{self, CaptchaKind};
use crate::error::{FormcastError, Result};
use crate::features::{
    FieldExtractor, FieldRef, FormExtractor, PageExtractor, PageRef, default_field_pipelines,
    default_form_pipelines, default_page_pipelines, pipeline_meta,
};
use crate::html;
use crate::model::{LinearModel, TrainConfig};
use crate::vectorize::ExtractorOutput;

/// Default model file name searched for by [`FormClassifier::find_model`].
pub const DEFAULT_MODEL_NAME: &str = "model.json";

/// Classification result for one form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResult {
    #[serde(rename = "type")]
    pub form_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaKind>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub fields: BTreeMap<String, String>,
}

/// Probability-based classification result for one form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormProbaResult {
    #[serde(rename = "type")]
    pub form_type: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaKind>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub fields: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Page-level classification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaKind>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub forms: Vec<FormResult>,
}

/// Probability-based page-level classification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageProbaResult {
    #[serde(rename = "type")]
    pub page_type: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaKind>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub forms: Vec<FormProbaResult>,
}

/// On-disk model bundle layout.
#[derive(Serialize, Deserialize)]
struct ModelBundle {
    form: LinearModel,
    fields: LinearModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<LinearModel>,
}

#[derive(Serialize)]
struct ModelBundleRef<'a> {
    form: &'a LinearModel,
    fields: &'a LinearModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<&'a LinearModel>,
}

/// The bundled form, field and page classifiers.
///
/// Loaded classifiers are immutable; all classification methods take
/// `&self` and are safe to call concurrently.
#[derive(Debug, Clone)]
pub struct FormClassifier {
    form_model: LinearModel,
    field_model: LinearModel,
    page_model: Option<LinearModel>,
    form_extractors: Vec<FormExtractor>,
    field_extractors: Vec<FieldExtractor>,
    page_extractors: Vec<PageExtractor>,
}

impl FormClassifier {
    /// Bundle warmed models into a classifier, resolving each persisted
    /// extractor tag.
    pub fn from_models(
        form_model: LinearModel,
        field_model: LinearModel,
        page_model: Option<LinearModel>,
    ) -> Result<Self> {
        let form_extractors = resolve_tags(&form_model, FormExtractor::from_tag)?;
        let field_extractors = resolve_tags(&field_model, FieldExtractor::from_tag)?;
        let page_extractors = match &page_model {
            Some(model) => resolve_tags(model, PageExtractor::from_tag)?,
            None => Vec::new(),
        };
        Ok(Self {
            form_model,
            field_model,
            page_model,
            form_extractors,
            field_extractors,
            page_extractors,
        })
    }

    /// Load a classifier bundle from a JSON model file and warm it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let mut bundle: ModelBundle = serde_json::from_str(&data)?;
        bundle.form.init_runtime()?;
        bundle.fields.init_runtime()?;
        if let Some(page) = &mut bundle.page {
            page.init_runtime()?;
        }
        Self::from_models(bundle.form, bundle.fields, bundle.page)
    }

    /// Write the classifier bundle to a JSON model file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bundle = ModelBundleRef {
            form: &self.form_model,
            fields: &self.field_model,
            page: self.page_model.as_ref(),
        };
        let json = serde_json::to_string(&bundle)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Locate a model file by name: the current directory and its
    /// parents up to the crate root (`Cargo.toml` boundary), then the
    /// user model directory.
    pub fn find_model(name: &str) -> Result<PathBuf> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if dir.join("Cargo.toml").is_file() {
                break;
            }
            if !dir.pop() {
                break;
            }
        }
        if let Some(model_dir) = Self::model_dir() {
            let candidate = model_dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(FormcastError::not_found(format!("model file {name:?}")))
    }

    /// User model storage directory (`~/.formcast`), when a home
    /// directory is known.
    pub fn model_dir() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".formcast"))
    }

    /// Whether a page model is bundled.
    pub fn has_page_model(&self) -> bool {
        self.page_model.is_some()
    }

    pub fn form_model(&self) -> &LinearModel {
        &self.form_model
    }

    pub fn field_model(&self) -> &LinearModel {
        &self.field_model
    }

    pub fn page_model(&self) -> Option<&LinearModel> {
        self.page_model.as_ref()
    }

    /// Classify every form in the HTML. No forms yields an empty vec.
    pub fn extract_forms(&self, html_str: &str) -> Result<Vec<FormResult>> {
        let doc = html::parse_document(html_str);
        let mut results = Vec::new();
        for form in html::forms(&doc) {
            let form_type = self.classify_form(form)?;
            let fields = self.classify_fields(form)?;
            results.push(FormResult {
                form_type,
                captcha: captcha_hit(form),
                fields,
            });
        }
        Ok(results)
    }

    /// Classify every form, returning per-class probability maps with
    /// entries below `threshold` omitted.
    pub fn extract_forms_proba(
        &self,
        html_str: &str,
        threshold: f64,
    ) -> Result<Vec<FormProbaResult>> {
        let doc = html::parse_document(html_str);
        let mut results = Vec::new();
        for form in html::forms(&doc) {
            let form_type = self
                .form_model
                .predict_proba(&self.form_outputs(form), threshold)?;
            let mut fields = BTreeMap::new();
            for control in html::visible_controls(form) {
                let name = html::control_name(control);
                if name.is_empty() {
                    continue;
                }
                let outputs = self.field_outputs(&FieldRef { form, control });
                fields.insert(name, self.field_model.predict_proba(&outputs, threshold)?);
            }
            results.push(FormProbaResult {
                form_type,
                captcha: captcha_hit(form),
                fields,
            });
        }
        Ok(results)
    }

    /// Classify the page type together with all its forms. The page URL
    /// is supplied by the caller; it is never fetched.
    pub fn extract_page(&self, html_str: &str, url: &str) -> Result<PageResult> {
        let page_model = self
            .page_model
            .as_ref()
            .ok_or_else(|| FormcastError::model("no page model bundled"))?;

        let doc = html::parse_document(html_str);
        let mut forms = Vec::new();
        for form in html::forms(&doc) {
            forms.push(FormResult {
                form_type: self.classify_form(form)?,
                captcha: None,
                fields: self.classify_fields(form)?,
            });
        }

        let form_types: Vec<String> = forms.iter().map(|f| f.form_type.clone()).collect();
        let page = PageRef {
            doc: &doc,
            url,
            form_types: &form_types,
        };
        let outputs: Vec<ExtractorOutput> =
            self.page_extractors.iter().map(|e| e.extract(&page)).collect();
        let page_type = page_model.predict(&outputs)?.to_string();

        Ok(PageResult {
            page_type,
            captcha: page_captcha(&doc, html_str),
            forms,
        })
    }

    /// Page classification with probability maps.
    pub fn extract_page_proba(
        &self,
        html_str: &str,
        url: &str,
        threshold: f64,
    ) -> Result<PageProbaResult> {
        let page_model = self
            .page_model
            .as_ref()
            .ok_or_else(|| FormcastError::model("no page model bundled"))?;

        let doc = html::parse_document(html_str);
        let mut forms = Vec::new();
        let mut form_types = Vec::new();
        for form in html::forms(&doc) {
            // Page features need hard form types even in proba mode.
            form_types.push(self.classify_form(form)?);
            let form_type = self
                .form_model
                .predict_proba(&self.form_outputs(form), threshold)?;
            let mut fields = BTreeMap::new();
            for control in html::visible_controls(form) {
                let name = html::control_name(control);
                if name.is_empty() {
                    continue;
                }
                let outputs = self.field_outputs(&FieldRef { form, control });
                fields.insert(name, self.field_model.predict_proba(&outputs, threshold)?);
            }
            forms.push(FormProbaResult {
                form_type,
                captcha: None,
                fields,
            });
        }

        let page = PageRef {
            doc: &doc,
            url,
            form_types: &form_types,
        };
        let outputs: Vec<ExtractorOutput> =
            self.page_extractors.iter().map(|e| e.extract(&page)).collect();
        let page_type = page_model.predict_proba(&outputs, threshold)?;

        Ok(PageProbaResult {
            page_type,
            captcha: page_captcha(&doc, html_str),
            forms,
        })
    }

    fn form_outputs(&self, form: ElementRef<'_>) -> Vec<ExtractorOutput> {
        self.form_extractors.iter().map(|e| e.extract(form)).collect()
    }

    fn field_outputs(&self, field: &FieldRef<'_>) -> Vec<ExtractorOutput> {
        self.field_extractors.iter().map(|e| e.extract(field)).collect()
    }

    fn classify_form(&self, form: ElementRef<'_>) -> Result<String> {
        Ok(self.form_model.predict(&self.form_outputs(form))?.to_string())
    }

    /// Predicted type for every named visible control, keyed by name.
    fn classify_fields(&self, form: ElementRef<'_>) -> Result<BTreeMap<String, String>> {
        let mut fields = BTreeMap::new();
        for control in html::visible_controls(form) {
            let name = html::control_name(control);
            if name.is_empty() {
                continue;
            }
            let outputs = self.field_outputs(&FieldRef { form, control });
            fields.insert(name, self.field_model.predict(&outputs)?.to_string());
        }
        Ok(fields)
    }
}

fn resolve_tags<E>(model: &LinearModel, from_tag: fn(&str) -> Option<E>) -> Result<Vec<E>> {
    model
        .pipelines
        .iter()
        .map(|p| {
            from_tag(&p.extractor).ok_or_else(|| {
                FormcastError::model(format!("unknown extractor tag {:?}", p.extractor))
            })
        })
        .collect()
}

fn captcha_hit(form: ElementRef<'_>) -> Option<CaptchaKind> {
    match captcha::detect_in_form(form) {
        CaptchaKind::None => None,
        kind => Some(kind),
    }
}

/// Page-level captcha: the first form-level hit, falling back to a
/// whole-document scan.
fn page_captcha(doc: &scraper::Html, raw_html: &str) -> Option<CaptchaKind> {
    for form in html::forms(doc) {
        if let Some(kind) = captcha_hit(form) {
            return Some(kind);
        }
    }
    match captcha::detect_in_html(raw_html) {
        CaptchaKind::None => None,
        kind => Some(kind),
    }
}

/// Train a form-type model over pre-parsed form elements with the
/// default form pipelines.
pub fn train_form_model(
    forms: &[ElementRef<'_>],
    labels: &[String],
    config: &TrainConfig,
) -> Result<LinearModel> {
    let pipelines = default_form_pipelines();
    let meta = pipeline_meta(&pipelines, |e| e.tag());
    let columns: Vec<Vec<ExtractorOutput>> = pipelines
        .iter()
        .map(|p| forms.iter().map(|form| p.extractor.extract(*form)).collect())
        .collect();
    LinearModel::fit(meta, &columns, labels, config)
}

/// Train a field-type model over labeled controls with the default
/// field pipelines.
pub fn train_field_model(
    fields: &[FieldRef<'_>],
    labels: &[String],
    config: &TrainConfig,
) -> Result<LinearModel> {
    let pipelines = default_field_pipelines();
    let meta = pipeline_meta(&pipelines, |e| e.tag());
    let columns: Vec<Vec<ExtractorOutput>> = pipelines
        .iter()
        .map(|p| fields.iter().map(|field| p.extractor.extract(field)).collect())
        .collect();
    LinearModel::fit(meta, &columns, labels, config)
}

/// Train a page-type model over labeled pages with the default page
/// pipelines.
pub fn train_page_model(
    pages: &[PageRef<'_>],
    labels: &[String],
    config: &TrainConfig,
) -> Result<LinearModel> {
    let pipelines = default_page_pipelines();
    let meta = pipeline_meta(&pipelines, |e| e.tag());
    let columns: Vec<Vec<ExtractorOutput>> = pipelines
        .iter()
        .map(|p| pages.iter().map(|page| p.extractor.extract(page)).collect())
        .collect();
    LinearModel::fit(meta, &columns, labels, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{forms, parse_document, visible_controls};
    use scraper::Html;

    const LOGIN_FORMS: &[&str] = &[
        r#"<form method="post" action="/login" class="login-form">
            <label for="u">Username</label><input type="text" name="username" id="u">
            <label for="p">Password</label><input type="password" name="password" id="p">
            <input type="submit" value="Sign in"></form>"#,
        r#"<form method="post" action="/accounts/signin" class="signin">
            <input type="text" name="login" placeholder="Email">
            <input type="password" name="passwd">
            <input type="submit" value="Log in"></form>"#,
        r#"<form method="post" action="/session" id="login">
            <input type="email" name="email">
            <input type="password" name="password">
            <input type="submit" value="Sign in"></form>"#,
    ];

    const SEARCH_FORMS: &[&str] = &[
        r#"<form method="get" action="/search" class="search-form">
            <input type="text" name="q" placeholder="Search">
            <input type="submit" value="Search"></form>"#,
        r#"<form method="get" action="/find" class="searchbox">
            <input type="text" name="query">
            <input type="submit" value="Go"></form>"#,
        r#"<form method="get" action="/results" id="search">
            <input type="search" name="q">
            <input type="submit" value="Search"></form>"#,
    ];

    fn training_docs() -> (Vec<Html>, Vec<String>) {
        let mut docs = Vec::new();
        let mut labels = Vec::new();
        for html in LOGIN_FORMS {
            docs.push(parse_document(html));
            labels.push("login".to_string());
        }
        for html in SEARCH_FORMS {
            docs.push(parse_document(html));
            labels.push("search".to_string());
        }
        (docs, labels)
    }

    fn trained_classifier(docs: &[Html], labels: &[String]) -> FormClassifier {
        let form_refs: Vec<_> = docs.iter().map(|d| forms(d)[0]).collect();
        let config = TrainConfig::default();
        let form_model = train_form_model(&form_refs, labels, &config).unwrap();

        let mut field_refs = Vec::new();
        let mut field_labels = Vec::new();
        for (doc, label) in docs.iter().zip(labels) {
            let form = forms(doc)[0];
            for control in visible_controls(form) {
                field_refs.push(FieldRef { form, control });
                let field_type = match html::control_type(control).as_str() {
                    "password" => "password",
                    "search" => "search query",
                    _ if label == "search" => "search query",
                    _ => "username",
                };
                field_labels.push(field_type.to_string());
            }
        }
        let field_model = train_field_model(&field_refs, &field_labels, &config).unwrap();
        FormClassifier::from_models(form_model, field_model, None).unwrap()
    }

    #[test]
    fn test_extract_forms_classifies_login_and_search() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);

        let results = classifier
            .extract_forms(
                r#"<form method="post" action="/login" class="login-form">
                    <label for="u">Username</label><input type="text" name="username" id="u">
                    <label for="p">Password</label><input type="password" name="password" id="p">
                    <input type="submit" value="Sign in"></form>"#,
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].form_type, "login");
        assert_eq!(results[0].captcha, None);
        assert_eq!(results[0].fields.get("password").map(String::as_str), Some("password"));

        let results = classifier
            .extract_forms(
                r#"<form method="get" action="/search" class="search-form">
                    <input type="text" name="q" placeholder="Search">
                    <input type="submit" value="Search"></form>"#,
            )
            .unwrap();
        assert_eq!(results[0].form_type, "search");
    }

    #[test]
    fn test_extract_forms_empty_when_no_forms() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);
        let results = classifier.extract_forms("<html><body><p>no forms</p></body></html>");
        assert_eq!(results.unwrap().len(), 0);
    }

    #[test]
    fn test_extract_forms_proba_distributions() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);
        let results = classifier.extract_forms_proba(LOGIN_FORMS[0], 0.0).unwrap();
        assert_eq!(results.len(), 1);
        let total: f64 = results[0].form_type.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        let login_p = results[0].form_type["login"];
        let search_p = results[0].form_type["search"];
        assert!(login_p > search_p);
    }

    #[test]
    fn test_captcha_merged_into_form_result() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);
        let results = classifier
            .extract_forms(
                r#"<form method="post" action="/login" class="login-form">
                    <input type="text" name="username">
                    <input type="password" name="password">
                    <div class="g-recaptcha" data-sitekey="k"></div>
                    <input type="submit" value="Sign in"></form>"#,
            )
            .unwrap();
        assert_eq!(results[0].captcha, Some(CaptchaKind::Recaptcha));
    }

    #[test]
    fn test_extract_page_requires_page_model() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);
        assert!(classifier.extract_page(LOGIN_FORMS[0], "https://example.com/login").is_err());
    }

    #[test]
    fn test_save_load_round_trip() -> Result<()> {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        classifier.save(&path)?;
        let loaded = FormClassifier::load(&path)?;

        let before = classifier.extract_forms(LOGIN_FORMS[1])?;
        let after = loaded.extract_forms(LOGIN_FORMS[1])?;
        assert_eq!(before[0].form_type, after[0].form_type);
        assert_eq!(before[0].fields, after[0].fields);
        Ok(())
    }

    #[test]
    fn test_unknown_extractor_tag_rejected() {
        let (docs, labels) = training_docs();
        let classifier = trained_classifier(&docs, &labels);
        let mut model = classifier.form_model().clone();
        model.pipelines[0].extractor = "NoSuchExtractor".to_string();
        let err = FormClassifier::from_models(
            model,
            classifier.field_model().clone(),
            None,
        );
        assert!(err.is_err());
    }
}
