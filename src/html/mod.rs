//! Markup collaborator: narrow accessors over a parsed HTML document.
//!
//! The classification core never walks the DOM itself; it calls these
//! helpers to pull strings and structural counts out of form-like nodes.
//! Missing attributes and malformed markup yield empty strings or maps,
//! never errors — robustness here is what lets the vectorizers stay
//! total.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Tags whose text content is invisible and excluded from text features.
const SKIP_TEXT: &[&str] = &["script", "style", "noscript", "svg", "template"];

/// Input types that do not count as user-visible fields.
const NON_VISIBLE_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("form"));
static INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("input"));
static SELECT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("select"));
static TEXTAREA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("textarea"));
static CONTROL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("input, select, textarea"));
static SUBMIT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| sel("input[type=submit], input[type=image], button"));
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("a"));
static LABEL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("label"));
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static META_DESCRIPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| sel(r#"meta[name="description"]"#));
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("h1, h2, h3, h4, h5, h6"));
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("h1"));
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("body"));
static NAV_SELECTOR: LazyLock<Selector> = LazyLock::new(|| sel("nav, header, footer"));

fn sel(css: &str) -> Selector {
    // All selectors here are string literals; parse cannot fail.
    Selector::parse(css).unwrap_or_else(|_| panic!("invalid selector: {css}"))
}

/// Parse an HTML string into a document. Never fails; broken markup is
/// repaired by the parser the way browsers repair it.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// All `<form>` elements in document order.
pub fn forms(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&FORM_SELECTOR).collect()
}

/// Visible text of an element, skipping script/style-like subtrees,
/// whitespace-normalized.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_visible_text(element, &mut out);
    normalize_whitespace(&out)
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    if SKIP_TEXT.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_visible_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn input_type(input: ElementRef<'_>) -> String {
    input
        .value()
        .attr("type")
        .unwrap_or("text")
        .trim()
        .to_lowercase()
}

fn is_visible_input(input: ElementRef<'_>) -> bool {
    !NON_VISIBLE_INPUT_TYPES.contains(&input_type(input).as_str())
}

fn css_of(element: ElementRef<'_>) -> String {
    let class = element.value().attr("class").unwrap_or("");
    let id = element.value().attr("id").unwrap_or("");
    normalize_whitespace(&format!("{class} {id}"))
}

// --- Form-level accessors ------------------------------------------------

/// Count of controls by type: one bucket per input `type` attribute
/// (default `text`), plus `select` and `textarea` buckets.
pub fn control_type_counts(form: ElementRef<'_>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for input in form.select(&INPUT_SELECTOR) {
        *counts.entry(input_type(input)).or_insert(0) += 1;
    }
    let selects = form.select(&SELECT_SELECTOR).count();
    if selects > 0 {
        counts.insert("select".to_string(), selects);
    }
    let textareas = form.select(&TEXTAREA_SELECTOR).count();
    if textareas > 0 {
        counts.insert("textarea".to_string(), textareas);
    }
    counts
}

/// Number of user-visible controls (inputs that are not
/// hidden/submit/button/reset/image, plus selects and textareas).
pub fn visible_input_count(form: ElementRef<'_>) -> usize {
    let inputs = form
        .select(&INPUT_SELECTOR)
        .filter(|i| is_visible_input(*i))
        .count();
    inputs + form.select(&SELECT_SELECTOR).count() + form.select(&TEXTAREA_SELECTOR).count()
}

/// Lowercased form method, defaulting to `get`.
pub fn form_method(form: ElementRef<'_>) -> String {
    form.value()
        .attr("method")
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "get".to_string())
}

/// Text of submit controls: submit/image input values plus button text.
pub fn submit_texts(form: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for control in form.select(&SUBMIT_SELECTOR) {
        if control.value().name() == "button" {
            let text = visible_text(control);
            if !text.is_empty() {
                parts.push(text);
            }
        } else if let Some(value) = control.value().attr("value") {
            parts.push(normalize_whitespace(value));
        }
    }
    parts.join(" ")
}

/// Text of links inside the form.
pub fn links_text(form: ElementRef<'_>) -> String {
    let parts: Vec<String> = form
        .select(&LINK_SELECTOR)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Text of labels inside the form.
pub fn label_text(form: ElementRef<'_>) -> String {
    let parts: Vec<String> = form
        .select(&LABEL_SELECTOR)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Raw form action attribute ("" when absent).
pub fn form_action(form: ElementRef<'_>) -> String {
    form.value().attr("action").unwrap_or("").trim().to_string()
}

/// CSS class and id of the form element itself.
pub fn form_css(form: ElementRef<'_>) -> String {
    css_of(form)
}

/// CSS classes/ids of visible inputs.
pub fn input_css(form: ElementRef<'_>) -> String {
    let parts: Vec<String> = form
        .select(&INPUT_SELECTOR)
        .filter(|i| is_visible_input(*i))
        .map(css_of)
        .filter(|c| !c.is_empty())
        .collect();
    parts.join(" ")
}

/// Names of visible inputs.
pub fn input_names(form: ElementRef<'_>) -> String {
    let parts: Vec<&str> = form
        .select(&INPUT_SELECTOR)
        .filter(|i| is_visible_input(*i))
        .filter_map(|i| i.value().attr("name"))
        .collect();
    parts.join(" ")
}

/// Title attributes of visible inputs.
pub fn input_titles(form: ElementRef<'_>) -> String {
    let parts: Vec<&str> = form
        .select(&INPUT_SELECTOR)
        .filter(|i| is_visible_input(*i))
        .filter_map(|i| i.value().attr("title"))
        .collect();
    parts.join(" ")
}

/// Normalize an action URL into a compact token: the path, query and
/// fragment with `/`, `_` and `-` stripped, joined as
/// `path+query + "#" + fragment`. A scheme is prepended when missing so
/// relative actions still parse.
pub fn normalize_action_url(action: &str) -> String {
    if action.is_empty() {
        return String::new();
    }
    let absolute = if action.contains("//") {
        action.to_string()
    } else {
        format!("http://x{}", if action.starts_with('/') { "" } else { "/" }) + action
    };
    let parsed = match Url::parse(&absolute) {
        Ok(u) => u,
        Err(_) => return action.to_string(),
    };
    let path = strip_url_part(parsed.path());
    let query = strip_url_part(parsed.query().unwrap_or(""));
    let fragment = strip_url_part(parsed.fragment().unwrap_or(""));
    format!("{path}{query}#{fragment}")
}

fn strip_url_part(part: &str) -> String {
    part.chars().filter(|c| !matches!(c, '/' | '_' | '-')).collect()
}

// --- Page-level accessors ------------------------------------------------

/// Text of the document title.
pub fn page_title(doc: &Html) -> String {
    doc.select(&TITLE_SELECTOR)
        .next()
        .map(visible_text)
        .unwrap_or_default()
}

/// Content of the meta description tag.
pub fn meta_description(doc: &Html) -> String {
    doc.select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(normalize_whitespace)
        .unwrap_or_default()
}

/// Combined text of all headings (h1-h6).
pub fn headings_text(doc: &Html) -> String {
    let parts: Vec<String> = doc
        .select(&HEADING_SELECTOR)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Text of h1 headings only.
pub fn h1_text(doc: &Html) -> String {
    let parts: Vec<String> = doc
        .select(&H1_SELECTOR)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Visible body text.
pub fn body_text(doc: &Html) -> String {
    doc.select(&BODY_SELECTOR)
        .next()
        .map(visible_text)
        .unwrap_or_default()
}

/// Text of navigation chrome (nav, header, footer).
pub fn nav_text(doc: &Html) -> String {
    let parts: Vec<String> = doc
        .select(&NAV_SELECTOR)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// CSS classes and ids of the document body and its element descendants.
pub fn page_css(doc: &Html) -> String {
    let Some(body) = doc.select(&BODY_SELECTOR).next() else {
        return String::new();
    };
    let mut parts = vec![css_of(body)];
    for node in body.descendants() {
        if let Some(element) = ElementRef::wrap(node) {
            let css = css_of(element);
            if !css.is_empty() {
                parts.push(css);
            }
        }
    }
    normalize_whitespace(&parts.join(" "))
}

// --- Field-level accessors -----------------------------------------------

/// User-visible controls of a form, in document order.
pub fn visible_controls(form: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    form.select(&CONTROL_SELECTOR)
        .filter(|c| c.value().name() != "input" || is_visible_input(*c))
        .collect()
}

/// Name attribute of a control ("" when absent).
pub fn control_name(control: ElementRef<'_>) -> String {
    control.value().attr("name").unwrap_or("").trim().to_string()
}

/// Control type: the input `type` attribute (default `text`), or the tag
/// name for selects and textareas.
pub fn control_type(control: ElementRef<'_>) -> String {
    match control.value().name() {
        "input" => input_type(control),
        other => other.to_string(),
    }
}

/// CSS class and id of a control.
pub fn control_css(control: ElementRef<'_>) -> String {
    css_of(control)
}

/// Title and placeholder text of a control.
pub fn control_title(control: ElementRef<'_>) -> String {
    let title = control.value().attr("title").unwrap_or("");
    let placeholder = control.value().attr("placeholder").unwrap_or("");
    normalize_whitespace(&format!("{title} {placeholder}"))
}

/// Label text associated with a control: a `label[for=id]` inside the
/// form, or an ancestor `<label>`.
pub fn control_label(form: ElementRef<'_>, control: ElementRef<'_>) -> String {
    if let Some(id) = control.value().attr("id") {
        for label in form.select(&LABEL_SELECTOR) {
            if label.value().attr("for") == Some(id) {
                let text = visible_text(label);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }
    let mut node = control.parent();
    while let Some(current) = node {
        if let Some(element) = ElementRef::wrap(current) {
            if element.value().name() == "label" {
                return visible_text(element);
            }
            if element.value().name() == "form" {
                break;
            }
        }
        node = current.parent();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_FORM: &str = r#"
        <html><body>
        <form method="POST" action="/accounts/login" class="login-form" id="signin">
            <label for="user">Username</label>
            <input type="text" name="username" id="user" class="input-user" title="Your username">
            <label for="pass">Password</label>
            <input type="password" name="password" id="pass" class="input-pass">
            <input type="hidden" name="csrf" value="token">
            <input type="submit" value="Sign in">
            <a href="/recover">Forgot password?</a>
        </form>
        </body></html>
    "#;

    fn first_form(doc: &Html) -> ElementRef<'_> {
        forms(doc).into_iter().next().unwrap()
    }

    #[test]
    fn test_forms_found() {
        let doc = parse_document(LOGIN_FORM);
        assert_eq!(forms(&doc).len(), 1);
    }

    #[test]
    fn test_control_type_counts() {
        let doc = parse_document(LOGIN_FORM);
        let counts = control_type_counts(first_form(&doc));
        assert_eq!(counts.get("text"), Some(&1));
        assert_eq!(counts.get("password"), Some(&1));
        assert_eq!(counts.get("hidden"), Some(&1));
        assert_eq!(counts.get("submit"), Some(&1));
    }

    #[test]
    fn test_visible_input_count_skips_hidden_and_submit() {
        let doc = parse_document(LOGIN_FORM);
        assert_eq!(visible_input_count(first_form(&doc)), 2);
    }

    #[test]
    fn test_form_method_lowercased_with_default() {
        let doc = parse_document(LOGIN_FORM);
        assert_eq!(form_method(first_form(&doc)), "post");

        let doc = parse_document("<form><input type='text'></form>");
        assert_eq!(form_method(first_form(&doc)), "get");
    }

    #[test]
    fn test_submit_links_and_label_text() {
        let doc = parse_document(LOGIN_FORM);
        let form = first_form(&doc);
        assert_eq!(submit_texts(form), "Sign in");
        assert_eq!(links_text(form), "Forgot password?");
        assert_eq!(label_text(form), "Username Password");
    }

    #[test]
    fn test_css_and_name_accessors() {
        let doc = parse_document(LOGIN_FORM);
        let form = first_form(&doc);
        assert_eq!(form_css(form), "login-form signin");
        assert_eq!(input_names(form), "username password");
        assert_eq!(input_css(form), "input-user user input-pass pass");
        assert_eq!(input_titles(form), "Your username");
    }

    #[test]
    fn test_normalize_action_url() {
        assert_eq!(normalize_action_url("/accounts/login"), "accountslogin#");
        assert_eq!(
            normalize_action_url("https://example.com/user_area/sign-in?next=/home#top"),
            "userareasigninnext=home#top"
        );
        assert_eq!(normalize_action_url(""), "");
    }

    #[test]
    fn test_page_accessors() {
        let html = r#"
            <html><head>
                <title>Sign in - Example</title>
                <meta name="description" content="Log in to your account">
            </head><body class="page login-page">
                <nav><a href="/">Home</a> <a href="/help">Help</a></nav>
                <h1>Welcome back</h1>
                <script>var hidden = "secret";</script>
                <p>Enter your credentials.</p>
            </body></html>
        "#;
        let doc = parse_document(html);
        assert_eq!(page_title(&doc), "Sign in - Example");
        assert_eq!(meta_description(&doc), "Log in to your account");
        assert_eq!(h1_text(&doc), "Welcome back");
        assert_eq!(headings_text(&doc), "Welcome back");
        assert_eq!(nav_text(&doc), "Home Help");
        assert!(body_text(&doc).contains("Enter your credentials."));
        assert!(!body_text(&doc).contains("secret"));
        assert!(page_css(&doc).contains("login-page"));
    }

    #[test]
    fn test_control_accessors() {
        let doc = parse_document(LOGIN_FORM);
        let form = first_form(&doc);
        let controls = visible_controls(form);
        assert_eq!(controls.len(), 2);

        assert_eq!(control_name(controls[0]), "username");
        assert_eq!(control_type(controls[0]), "text");
        assert_eq!(control_css(controls[0]), "input-user user");
        assert_eq!(control_title(controls[0]), "Your username");
        assert_eq!(control_label(form, controls[0]), "Username");
        assert_eq!(control_label(form, controls[1]), "Password");
    }

    #[test]
    fn test_nested_label_association() {
        let html = r#"
            <form>
                <label>Email <input type="email" name="email"></label>
            </form>
        "#;
        let doc = parse_document(html);
        let form = first_form(&doc);
        let controls = visible_controls(form);
        assert_eq!(control_label(form, controls[0]), "Email");
    }

    #[test]
    fn test_malformed_markup_yields_empty_values() {
        let doc = parse_document("<form><input></form>");
        let form = first_form(&doc);
        assert_eq!(form_action(form), "");
        assert_eq!(form_css(form), "");
        assert_eq!(submit_texts(form), "");
        assert_eq!(label_text(form), "");
        assert_eq!(input_titles(form), "");
    }
}
