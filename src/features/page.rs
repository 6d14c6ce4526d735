//! Page-level feature extractors and the default page pipeline table.

use scraper::Html;

use crate::features::Pipeline;
use crate::html;
use crate::vectorize::{
    AnalyzerKind, ExtractorOutput, FeatureMap, FeatureValue, PipelineConfig, VectorizerKind,
};

/// Everything a page extractor can see: the parsed document, the page
/// URL (supplied by the caller, never re-fetched), and the already
/// classified types of the page's forms.
#[derive(Debug, Clone, Copy)]
pub struct PageRef<'a> {
    pub doc: &'a Html,
    pub url: &'a str,
    pub form_types: &'a [String],
}

/// Feature extractors over a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageExtractor {
    /// Structural booleans about the document shape.
    PageStructure,
    PageTitle,
    MetaDescription,
    /// Combined h1-h6 text.
    Headings,
    H1,
    /// CSS classes/ids of the body and its descendants.
    PageCss,
    /// Navigation chrome text (nav, header, footer).
    NavText,
    BodyText,
    /// Normalized page URL.
    PageUrl,
    /// The classified types of the page's forms, joined as a token
    /// stream ("login search" for a page with those two forms).
    FormTypeSummary,
}

impl PageExtractor {
    pub fn is_dict(self) -> bool {
        self == PageExtractor::PageStructure
    }

    /// Stable tag persisted with trained models.
    pub fn tag(self) -> &'static str {
        match self {
            PageExtractor::PageStructure => "PageStructure",
            PageExtractor::PageTitle => "PageTitle",
            PageExtractor::MetaDescription => "PageMetaDescription",
            PageExtractor::Headings => "PageHeadings",
            PageExtractor::H1 => "PageH1",
            PageExtractor::PageCss => "PageCSS",
            PageExtractor::NavText => "PageNavText",
            PageExtractor::BodyText => "PageBodyText",
            PageExtractor::PageUrl => "PageURL",
            PageExtractor::FormTypeSummary => "FormTypeSummary",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PageStructure" => Some(PageExtractor::PageStructure),
            "PageTitle" => Some(PageExtractor::PageTitle),
            "PageMetaDescription" => Some(PageExtractor::MetaDescription),
            "PageHeadings" => Some(PageExtractor::Headings),
            "PageH1" => Some(PageExtractor::H1),
            "PageCSS" => Some(PageExtractor::PageCss),
            "PageNavText" => Some(PageExtractor::NavText),
            "PageBodyText" => Some(PageExtractor::BodyText),
            "PageURL" => Some(PageExtractor::PageUrl),
            "FormTypeSummary" => Some(PageExtractor::FormTypeSummary),
            _ => None,
        }
    }

    /// Run the extractor over a page.
    pub fn extract(self, page: &PageRef<'_>) -> ExtractorOutput {
        match self {
            PageExtractor::PageStructure => ExtractorOutput::Dict(page_structure(page)),
            PageExtractor::PageTitle => ExtractorOutput::Text(html::page_title(page.doc)),
            PageExtractor::MetaDescription => {
                ExtractorOutput::Text(html::meta_description(page.doc))
            }
            PageExtractor::Headings => ExtractorOutput::Text(html::headings_text(page.doc)),
            PageExtractor::H1 => ExtractorOutput::Text(html::h1_text(page.doc)),
            PageExtractor::PageCss => ExtractorOutput::Text(html::page_css(page.doc)),
            PageExtractor::NavText => ExtractorOutput::Text(html::nav_text(page.doc)),
            PageExtractor::BodyText => ExtractorOutput::Text(html::body_text(page.doc)),
            PageExtractor::PageUrl => {
                ExtractorOutput::Text(html::normalize_action_url(page.url))
            }
            PageExtractor::FormTypeSummary => {
                ExtractorOutput::Text(page.form_types.join(" "))
            }
        }
    }
}

fn page_structure(page: &PageRef<'_>) -> FeatureMap {
    let forms = html::forms(page.doc);
    let form_count = forms.len();
    let password_form = forms
        .iter()
        .any(|f| html::control_type_counts(*f).contains_key("password"));

    let mut features = FeatureMap::new();
    let mut flag = |key: &str, value: bool| {
        features.insert(key.to_string(), FeatureValue::Bool(value));
    };
    flag("has <form>", form_count > 0);
    flag("exactly one <form>", form_count == 1);
    flag("2 or more <form>", form_count >= 2);
    flag("has <input type=password>", password_form);
    flag("has <h1>", !html::h1_text(page.doc).is_empty());
    flag("has <nav>", !html::nav_text(page.doc).is_empty());
    flag(
        "has meta description",
        !html::meta_description(page.doc).is_empty(),
    );
    features
}

/// The default page classification pipelines, in feature-space order.
pub fn default_page_pipelines() -> Vec<Pipeline<PageExtractor>> {
    use AnalyzerKind::{CharWb, Word};
    use VectorizerKind::{Count, Tfidf};

    vec![
        Pipeline::new("page structure", PageExtractor::PageStructure, PipelineConfig::dict()),
        Pipeline::new(
            "page title",
            PageExtractor::PageTitle,
            PipelineConfig::text(Tfidf, (1, 2), 2, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "meta description",
            PageExtractor::MetaDescription,
            PipelineConfig::text(Tfidf, (1, 2), 2, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "headings",
            PageExtractor::Headings,
            PipelineConfig::text(Tfidf, (1, 2), 3, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "h1",
            PageExtractor::H1,
            PipelineConfig::text(Count, (1, 2), 1, true, Word),
        ),
        Pipeline::new(
            "page css",
            PageExtractor::PageCss,
            PipelineConfig::text(Tfidf, (4, 5), 3, true, CharWb),
        ),
        Pipeline::new(
            "nav text",
            PageExtractor::NavText,
            PipelineConfig::text(Tfidf, (1, 2), 3, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "body text",
            PageExtractor::BodyText,
            PipelineConfig::text(Tfidf, (1, 1), 5, true, Word).with_english_stop_words(),
        ),
        Pipeline::new(
            "page url",
            PageExtractor::PageUrl,
            PipelineConfig::text(Tfidf, (5, 6), 3, true, CharWb),
        ),
        Pipeline::new(
            "form types",
            PageExtractor::FormTypeSummary,
            PipelineConfig::text(Count, (1, 1), 1, true, Word),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_document;

    const LOGIN_PAGE: &str = r#"
        <html><head>
            <title>Sign in</title>
            <meta name="description" content="Account login">
        </head><body>
            <nav><a href="/">Home</a></nav>
            <h1>Sign in</h1>
            <form method="post" action="/login">
                <input type="text" name="user">
                <input type="password" name="pass">
            </form>
        </body></html>
    "#;

    fn page_ref<'a>(doc: &'a Html, url: &'a str, form_types: &'a [String]) -> PageRef<'a> {
        PageRef {
            doc,
            url,
            form_types,
        }
    }

    #[test]
    fn test_tags_round_trip() {
        let all = [
            PageExtractor::PageStructure,
            PageExtractor::PageTitle,
            PageExtractor::MetaDescription,
            PageExtractor::Headings,
            PageExtractor::H1,
            PageExtractor::PageCss,
            PageExtractor::NavText,
            PageExtractor::BodyText,
            PageExtractor::PageUrl,
            PageExtractor::FormTypeSummary,
        ];
        for e in all {
            assert_eq!(PageExtractor::from_tag(e.tag()), Some(e));
        }
        assert_eq!(PageExtractor::from_tag("bogus"), None);
    }

    #[test]
    fn test_page_structure_dict() {
        let doc = parse_document(LOGIN_PAGE);
        let types = vec!["login".to_string()];
        let page = page_ref(&doc, "https://example.com/login", &types);
        let ExtractorOutput::Dict(features) = PageExtractor::PageStructure.extract(&page) else {
            panic!("expected dict output");
        };
        assert_eq!(features.get("exactly one <form>"), Some(&FeatureValue::Bool(true)));
        assert_eq!(
            features.get("has <input type=password>"),
            Some(&FeatureValue::Bool(true))
        );
        assert_eq!(features.get("2 or more <form>"), Some(&FeatureValue::Bool(false)));
    }

    #[test]
    fn test_url_and_summary_extractors() {
        let doc = parse_document(LOGIN_PAGE);
        let types = vec!["login".to_string(), "search".to_string()];
        let page = page_ref(&doc, "https://example.com/accounts/sign-in", &types);
        assert_eq!(
            PageExtractor::PageUrl.extract(&page),
            ExtractorOutput::Text("accountssignin#".to_string())
        );
        assert_eq!(
            PageExtractor::FormTypeSummary.extract(&page),
            ExtractorOutput::Text("login search".to_string())
        );
    }

    #[test]
    fn test_default_pipeline_table_shape() {
        let pipelines = default_page_pipelines();
        assert_eq!(pipelines.len(), 10);
        assert!(pipelines[0].extractor.is_dict());
        assert!(pipelines[1..].iter().all(|p| !p.extractor.is_dict()));
    }
}
