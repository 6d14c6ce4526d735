//! Field-level feature extractors and the default field pipeline table.
//!
//! Fields are classified one control at a time with the same vectorizer
//! machinery as forms; the extractors see the control plus its owning
//! form so label association works.

use scraper::ElementRef;

use crate::features::Pipeline;
use crate::html;
use crate::vectorize::{
    AnalyzerKind, ExtractorOutput, FeatureMap, FeatureValue, PipelineConfig, VectorizerKind,
};

/// One form control in the context of its owning form.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub form: ElementRef<'a>,
    pub control: ElementRef<'a>,
}

/// Feature extractors over one form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldExtractor {
    FieldName,
    FieldCss,
    /// Control type categorical plus required/placeholder presence.
    FieldAttrs,
    /// Associated label text (`label[for]` or ancestor label).
    FieldLabel,
    /// Title and placeholder text.
    FieldTitle,
}

impl FieldExtractor {
    pub fn is_dict(self) -> bool {
        self == FieldExtractor::FieldAttrs
    }

    /// Stable tag persisted with trained models.
    pub fn tag(self) -> &'static str {
        match self {
            FieldExtractor::FieldName => "FieldName",
            FieldExtractor::FieldCss => "FieldCSS",
            FieldExtractor::FieldAttrs => "FieldAttrs",
            FieldExtractor::FieldLabel => "FieldLabel",
            FieldExtractor::FieldTitle => "FieldTitle",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FieldName" => Some(FieldExtractor::FieldName),
            "FieldCSS" => Some(FieldExtractor::FieldCss),
            "FieldAttrs" => Some(FieldExtractor::FieldAttrs),
            "FieldLabel" => Some(FieldExtractor::FieldLabel),
            "FieldTitle" => Some(FieldExtractor::FieldTitle),
            _ => None,
        }
    }

    /// Run the extractor over a control.
    pub fn extract(self, field: &FieldRef<'_>) -> ExtractorOutput {
        match self {
            FieldExtractor::FieldName => {
                ExtractorOutput::Text(html::control_name(field.control))
            }
            FieldExtractor::FieldCss => ExtractorOutput::Text(html::control_css(field.control)),
            FieldExtractor::FieldAttrs => ExtractorOutput::Dict(field_attrs(field.control)),
            FieldExtractor::FieldLabel => {
                ExtractorOutput::Text(html::control_label(field.form, field.control))
            }
            FieldExtractor::FieldTitle => {
                ExtractorOutput::Text(html::control_title(field.control))
            }
        }
    }
}

fn field_attrs(control: ElementRef<'_>) -> FeatureMap {
    let mut features = FeatureMap::new();
    features.insert(
        "type".to_string(),
        FeatureValue::Text(html::control_type(control)),
    );
    features.insert(
        "required".to_string(),
        FeatureValue::Bool(control.value().attr("required").is_some()),
    );
    features.insert(
        "has placeholder".to_string(),
        FeatureValue::Bool(control.value().attr("placeholder").is_some()),
    );
    features
}

/// The default field classification pipelines, in feature-space order.
pub fn default_field_pipelines() -> Vec<Pipeline<FieldExtractor>> {
    use AnalyzerKind::{CharWb, Word};
    use VectorizerKind::{Count, Tfidf};

    vec![
        Pipeline::new("field attrs", FieldExtractor::FieldAttrs, PipelineConfig::dict()),
        Pipeline::new(
            "field name",
            FieldExtractor::FieldName,
            PipelineConfig::text(Tfidf, (2, 5), 1, true, CharWb),
        ),
        Pipeline::new(
            "field css",
            FieldExtractor::FieldCss,
            PipelineConfig::text(Tfidf, (4, 5), 2, true, CharWb),
        ),
        Pipeline::new(
            "field label",
            FieldExtractor::FieldLabel,
            PipelineConfig::text(Count, (1, 2), 1, true, Word),
        ),
        Pipeline::new(
            "field title",
            FieldExtractor::FieldTitle,
            PipelineConfig::text(Count, (1, 2), 1, true, Word),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{forms, parse_document, visible_controls};

    const FORM: &str = r#"
        <form>
            <label for="e">Email address</label>
            <input type="email" name="email" id="e" class="form-email" required placeholder="you@example.com">
        </form>
    "#;

    #[test]
    fn test_tags_round_trip() {
        let all = [
            FieldExtractor::FieldName,
            FieldExtractor::FieldCss,
            FieldExtractor::FieldAttrs,
            FieldExtractor::FieldLabel,
            FieldExtractor::FieldTitle,
        ];
        for e in all {
            assert_eq!(FieldExtractor::from_tag(e.tag()), Some(e));
        }
        assert_eq!(FieldExtractor::from_tag("bogus"), None);
    }

    #[test]
    fn test_extractors_over_email_field() {
        let doc = parse_document(FORM);
        let form = forms(&doc)[0];
        let control = visible_controls(form)[0];
        let field = FieldRef { form, control };

        assert_eq!(
            FieldExtractor::FieldName.extract(&field),
            ExtractorOutput::Text("email".to_string())
        );
        assert_eq!(
            FieldExtractor::FieldLabel.extract(&field),
            ExtractorOutput::Text("Email address".to_string())
        );
        assert_eq!(
            FieldExtractor::FieldTitle.extract(&field),
            ExtractorOutput::Text("you@example.com".to_string())
        );

        let ExtractorOutput::Dict(attrs) = FieldExtractor::FieldAttrs.extract(&field) else {
            panic!("expected dict output");
        };
        assert_eq!(attrs.get("type"), Some(&FeatureValue::Text("email".to_string())));
        assert_eq!(attrs.get("required"), Some(&FeatureValue::Bool(true)));
        assert_eq!(attrs.get("has placeholder"), Some(&FeatureValue::Bool(true)));
    }

    #[test]
    fn test_default_pipeline_table_shape() {
        let pipelines = default_field_pipelines();
        assert_eq!(pipelines.len(), 5);
        assert!(pipelines[0].extractor.is_dict());
        assert!(pipelines[1..].iter().all(|p| !p.extractor.is_dict()));
    }
}
