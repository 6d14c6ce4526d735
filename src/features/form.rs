//! Form-level feature extractors and the default form pipeline table.

use scraper::ElementRef;

use crate::features::Pipeline;
use crate::html;
use crate::vectorize::{
    AnalyzerKind, ExtractorOutput, FeatureMap, FeatureValue, PipelineConfig, VectorizerKind,
};

/// Feature extractors over one `<form>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormExtractor {
    /// Structural booleans: which control types the form carries and in
    /// what rough quantity, plus the form method as a categorical.
    FormElements,
    /// Submit button values and `<button>` text.
    SubmitText,
    /// Text of links inside the form.
    LinksText,
    /// Text of labels inside the form.
    LabelText,
    /// Normalized action URL.
    FormUrl,
    /// CSS class/id of the form element.
    FormCss,
    /// CSS classes/ids of visible inputs.
    InputCss,
    /// Names of visible inputs.
    InputNames,
    /// Title attributes of visible inputs.
    InputTitle,
}

impl FormExtractor {
    /// Whether this extractor produces a feature dict (vs. text).
    pub fn is_dict(self) -> bool {
        self == FormExtractor::FormElements
    }

    /// Stable tag persisted with trained models.
    pub fn tag(self) -> &'static str {
        match self {
            FormExtractor::FormElements => "FormElements",
            FormExtractor::SubmitText => "SubmitText",
            FormExtractor::LinksText => "FormLinksText",
            FormExtractor::LabelText => "FormLabelText",
            FormExtractor::FormUrl => "FormUrl",
            FormExtractor::FormCss => "FormCss",
            FormExtractor::InputCss => "FormInputCss",
            FormExtractor::InputNames => "FormInputNames",
            FormExtractor::InputTitle => "FormInputTitle",
        }
    }

    /// Resolve a persisted tag back to its extractor.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FormElements" => Some(FormExtractor::FormElements),
            "SubmitText" => Some(FormExtractor::SubmitText),
            "FormLinksText" => Some(FormExtractor::LinksText),
            "FormLabelText" => Some(FormExtractor::LabelText),
            "FormUrl" => Some(FormExtractor::FormUrl),
            "FormCss" => Some(FormExtractor::FormCss),
            "FormInputCss" => Some(FormExtractor::InputCss),
            "FormInputNames" => Some(FormExtractor::InputNames),
            "FormInputTitle" => Some(FormExtractor::InputTitle),
            _ => None,
        }
    }

    /// Run the extractor over a form element.
    pub fn extract(self, form: ElementRef<'_>) -> ExtractorOutput {
        match self {
            FormExtractor::FormElements => ExtractorOutput::Dict(form_elements(form)),
            FormExtractor::SubmitText => ExtractorOutput::Text(html::submit_texts(form)),
            FormExtractor::LinksText => ExtractorOutput::Text(html::links_text(form)),
            FormExtractor::LabelText => ExtractorOutput::Text(html::label_text(form)),
            FormExtractor::FormUrl => {
                ExtractorOutput::Text(html::normalize_action_url(&html::form_action(form)))
            }
            FormExtractor::FormCss => ExtractorOutput::Text(html::form_css(form)),
            FormExtractor::InputCss => ExtractorOutput::Text(html::input_css(form)),
            FormExtractor::InputNames => ExtractorOutput::Text(html::input_names(form)),
            FormExtractor::InputTitle => ExtractorOutput::Text(html::input_titles(form)),
        }
    }
}

fn form_elements(form: ElementRef<'_>) -> FeatureMap {
    let counts = html::control_type_counts(form);
    let count = |t: &str| counts.get(t).copied().unwrap_or(0);
    let input_count = html::visible_input_count(form);

    let mut features = FeatureMap::new();
    let mut flag = |key: &str, value: bool| {
        features.insert(key.to_string(), FeatureValue::Bool(value));
    };
    flag("has <textarea>", count("textarea") > 0);
    flag("has <input type=radio>", count("radio") > 0);
    flag("has <select>", count("select") > 0);
    flag("has <input type=checkbox>", count("checkbox") > 0);
    flag("has <input type=email>", count("email") > 0);
    flag("2 or 3 inputs", input_count == 2 || input_count == 3);
    flag("no <input type=password>", count("password") == 0);
    flag("exactly one <input type=password>", count("password") == 1);
    flag("exactly two <input type=password>", count("password") == 2);
    flag("no <input type=text>", count("text") == 0);
    flag("exactly one <input type=text>", count("text") == 1);
    flag("exactly two <input type=text>", count("text") == 2);
    flag("3 or more <input type=text>", count("text") >= 3);
    features.insert(
        "<form method".to_string(),
        FeatureValue::Text(html::form_method(form)),
    );
    features
}

/// The default form classification pipelines, in feature-space order.
pub fn default_form_pipelines() -> Vec<Pipeline<FormExtractor>> {
    use AnalyzerKind::{CharWb, Word};
    use VectorizerKind::{Count, Tfidf};

    vec![
        Pipeline::new("form elements", FormExtractor::FormElements, PipelineConfig::dict()),
        Pipeline::new(
            "submit text",
            FormExtractor::SubmitText,
            PipelineConfig::text(Count, (1, 2), 1, true, Word),
        ),
        Pipeline::new(
            "links text",
            FormExtractor::LinksText,
            PipelineConfig::text(Tfidf, (1, 2), 4, true, Word).with_stop_words(["and", "or", "of"]),
        ),
        Pipeline::new(
            "label text",
            FormExtractor::LabelText,
            PipelineConfig::text(Tfidf, (1, 2), 3, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "form url",
            FormExtractor::FormUrl,
            PipelineConfig::text(Tfidf, (5, 6), 4, true, CharWb),
        ),
        Pipeline::new(
            "form css",
            FormExtractor::FormCss,
            PipelineConfig::text(Tfidf, (4, 5), 3, true, CharWb),
        ),
        Pipeline::new(
            "input css",
            FormExtractor::InputCss,
            PipelineConfig::text(Tfidf, (4, 5), 5, true, CharWb),
        ),
        Pipeline::new(
            "input names",
            FormExtractor::InputNames,
            PipelineConfig::text(Tfidf, (5, 6), 3, true, CharWb),
        ),
        Pipeline::new(
            "input title",
            FormExtractor::InputTitle,
            PipelineConfig::text(Tfidf, (5, 6), 3, true, CharWb),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{forms, parse_document};

    const LOGIN: &str = r#"
        <form method="post" action="/login" class="login">
            <label for="u">Username</label>
            <input type="text" name="username" id="u">
            <label for="p">Password</label>
            <input type="password" name="password" id="p">
            <input type="submit" value="Sign in">
        </form>
    "#;

    #[test]
    fn test_tags_round_trip() {
        let all = [
            FormExtractor::FormElements,
            FormExtractor::SubmitText,
            FormExtractor::LinksText,
            FormExtractor::LabelText,
            FormExtractor::FormUrl,
            FormExtractor::FormCss,
            FormExtractor::InputCss,
            FormExtractor::InputNames,
            FormExtractor::InputTitle,
        ];
        for e in all {
            assert_eq!(FormExtractor::from_tag(e.tag()), Some(e));
        }
        assert_eq!(FormExtractor::from_tag("bogus"), None);
    }

    #[test]
    fn test_form_elements_dict() {
        let doc = parse_document(LOGIN);
        let form = forms(&doc)[0];
        let out = FormExtractor::FormElements.extract(form);
        let ExtractorOutput::Dict(features) = out else {
            panic!("expected dict output");
        };
        assert_eq!(
            features.get("exactly one <input type=password>"),
            Some(&FeatureValue::Bool(true))
        );
        assert_eq!(
            features.get("exactly one <input type=text>"),
            Some(&FeatureValue::Bool(true))
        );
        assert_eq!(features.get("2 or 3 inputs"), Some(&FeatureValue::Bool(true)));
        assert_eq!(
            features.get("<form method"),
            Some(&FeatureValue::Text("post".to_string()))
        );
    }

    #[test]
    fn test_text_extractors() {
        let doc = parse_document(LOGIN);
        let form = forms(&doc)[0];
        assert_eq!(
            FormExtractor::SubmitText.extract(form),
            ExtractorOutput::Text("Sign in".to_string())
        );
        assert_eq!(
            FormExtractor::FormUrl.extract(form),
            ExtractorOutput::Text("login#".to_string())
        );
        assert_eq!(
            FormExtractor::InputNames.extract(form),
            ExtractorOutput::Text("username password".to_string())
        );
    }

    #[test]
    fn test_default_pipeline_table_shape() {
        let pipelines = default_form_pipelines();
        assert_eq!(pipelines.len(), 9);
        assert_eq!(pipelines[0].name, "form elements");
        assert!(pipelines[0].extractor.is_dict());
        assert!(pipelines[1..].iter().all(|p| !p.extractor.is_dict()));
        assert_eq!(pipelines[2].config.stop_words.as_deref().map(<[String]>::len), Some(3));
        assert!(pipelines[3].config.english_stop_words);
    }
}
