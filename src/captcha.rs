//! Layered CAPTCHA detection.
//!
//! Detection runs a fixed sequence of layers from most to least
//! specific: CSS classes, script domains, data attributes, element
//! IDs and image alt text, field names, iframes, and finally generic
//! markers. The first layer that matches wins, and within a layer the
//! pattern tables are ordered slices, so detection is deterministic.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// A detected CAPTCHA provider or family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaKind {
    None,
    Recaptcha,
    #[serde(rename = "recaptchav2")]
    RecaptchaV2,
    #[serde(rename = "recaptcha-invisible")]
    RecaptchaInvisible,
    HCaptcha,
    Turnstile,
    Geetest,
    FriendlyCaptcha,
    RotateCaptcha,
    ClickCaptcha,
    ImageCaptcha,
    PuzzleCaptcha,
    SliderCaptcha,
    MCaptcha,
    Datadome,
    PerimeterX,
    Argon,
    Behaviotech,
    SmartCaptcha,
    Yandex,
    Funcaptcha,
    Kasada,
    Imperva,
    AwsWaf,
    Wsiz,
    Novascape,
    SimpleCaptcha,
    Other,
}

impl CaptchaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptchaKind::None => "none",
            CaptchaKind::Recaptcha => "recaptcha",
            CaptchaKind::RecaptchaV2 => "recaptchav2",
            CaptchaKind::RecaptchaInvisible => "recaptcha-invisible",
            CaptchaKind::HCaptcha => "hcaptcha",
            CaptchaKind::Turnstile => "turnstile",
            CaptchaKind::Geetest => "geetest",
            CaptchaKind::FriendlyCaptcha => "friendlycaptcha",
            CaptchaKind::RotateCaptcha => "rotatecaptcha",
            CaptchaKind::ClickCaptcha => "clickcaptcha",
            CaptchaKind::ImageCaptcha => "imagecaptcha",
            CaptchaKind::PuzzleCaptcha => "puzzlecaptcha",
            CaptchaKind::SliderCaptcha => "slidercaptcha",
            CaptchaKind::MCaptcha => "mcaptcha",
            CaptchaKind::Datadome => "datadome",
            CaptchaKind::PerimeterX => "perimeterx",
            CaptchaKind::Argon => "argon",
            CaptchaKind::Behaviotech => "behaviotech",
            CaptchaKind::SmartCaptcha => "smartcaptcha",
            CaptchaKind::Yandex => "yandex",
            CaptchaKind::Funcaptcha => "funcaptcha",
            CaptchaKind::Kasada => "kasada",
            CaptchaKind::Imperva => "imperva",
            CaptchaKind::AwsWaf => "awswaf",
            CaptchaKind::Wsiz => "wsiz",
            CaptchaKind::Novascape => "novascape",
            CaptchaKind::SimpleCaptcha => "simplecaptcha",
            CaptchaKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "none" => CaptchaKind::None,
            "recaptcha" => CaptchaKind::Recaptcha,
            "recaptchav2" => CaptchaKind::RecaptchaV2,
            "recaptcha-invisible" => CaptchaKind::RecaptchaInvisible,
            "hcaptcha" => CaptchaKind::HCaptcha,
            "turnstile" => CaptchaKind::Turnstile,
            "geetest" => CaptchaKind::Geetest,
            "friendlycaptcha" => CaptchaKind::FriendlyCaptcha,
            "rotatecaptcha" => CaptchaKind::RotateCaptcha,
            "clickcaptcha" => CaptchaKind::ClickCaptcha,
            "imagecaptcha" => CaptchaKind::ImageCaptcha,
            "puzzlecaptcha" => CaptchaKind::PuzzleCaptcha,
            "slidercaptcha" => CaptchaKind::SliderCaptcha,
            "mcaptcha" => CaptchaKind::MCaptcha,
            "datadome" => CaptchaKind::Datadome,
            "perimeterx" => CaptchaKind::PerimeterX,
            "argon" => CaptchaKind::Argon,
            "behaviotech" => CaptchaKind::Behaviotech,
            "smartcaptcha" => CaptchaKind::SmartCaptcha,
            "yandex" => CaptchaKind::Yandex,
            "funcaptcha" => CaptchaKind::Funcaptcha,
            "kasada" => CaptchaKind::Kasada,
            "imperva" => CaptchaKind::Imperva,
            "awswaf" => CaptchaKind::AwsWaf,
            "wsiz" => CaptchaKind::Wsiz,
            "novascape" => CaptchaKind::Novascape,
            "simplecaptcha" => CaptchaKind::SimpleCaptcha,
            "other" => CaptchaKind::Other,
            _ => return None,
        })
    }
}

impl std::fmt::Display for CaptchaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type SubstringTable = &'static [(CaptchaKind, &'static [&'static str])];

/// Layer 1: CSS class fragments anywhere in the form markup.
const CLASS_PATTERNS: SubstringTable = &[
    (CaptchaKind::RecaptchaV2, &["g-recaptcha-v2", "grecaptcha-v2"]),
    (
        CaptchaKind::RecaptchaInvisible,
        &["g-recaptcha-invisible", "grecaptcha-invisible"],
    ),
    (CaptchaKind::Recaptcha, &["g-recaptcha", "grecaptcha"]),
    (CaptchaKind::HCaptcha, &["h-captcha", "hcaptcha"]),
    (CaptchaKind::Turnstile, &["cf-turnstile", "turnstile"]),
    (CaptchaKind::Geetest, &["geetest_", "geetest-box", "gee-test"]),
    (CaptchaKind::FriendlyCaptcha, &["frc-captcha", "friendlycaptcha"]),
    (CaptchaKind::MCaptcha, &["mcaptcha", "mcaptcha-container"]),
    (CaptchaKind::Kasada, &["kasada"]),
    (CaptchaKind::Imperva, &["incapsula", "imperva"]),
    (CaptchaKind::AwsWaf, &["aws-waf", "awswaf"]),
    (CaptchaKind::Datadome, &["dd-challenge", "dd-top"]),
    (CaptchaKind::PerimeterX, &["_px3", "px-container"]),
    (CaptchaKind::SmartCaptcha, &["smart-captcha", "smartcaptcha"]),
    (CaptchaKind::Argon, &["argon-captcha"]),
    (CaptchaKind::PuzzleCaptcha, &["puzzle-captcha", "__puzzle_captcha"]),
    (CaptchaKind::Yandex, &["yandex-captcha"]),
    (CaptchaKind::Funcaptcha, &["funcaptcha-container"]),
];

/// Layer 3: provider-specific data attributes.
const DATA_ATTR_PATTERNS: SubstringTable = &[
    (CaptchaKind::Kasada, &["data-kasada"]),
    (CaptchaKind::Imperva, &["data-incapsula", "data-imperva"]),
    (CaptchaKind::Datadome, &["data-datadome", "dd-challenge"]),
    (CaptchaKind::PerimeterX, &["data-px", "_pxappid"]),
    (CaptchaKind::MCaptcha, &["data-mcaptcha"]),
    (CaptchaKind::SmartCaptcha, &["data-smartcaptcha", "smartcaptcha"]),
];

/// Layer 4a: element id fragments.
const ID_PATTERNS: SubstringTable = &[
    (CaptchaKind::Geetest, &["geetest", "gt-captcha", "embed-captcha"]),
    (CaptchaKind::Recaptcha, &["recaptcha"]),
    (CaptchaKind::HCaptcha, &["hcaptcha", "h-captcha"]),
    (CaptchaKind::Turnstile, &["cf-turnstile", "turnstile"]),
    (CaptchaKind::Funcaptcha, &["funcaptcha", "arkose"]),
];

/// Layer 4b: img alt text fragments.
const ALT_PATTERNS: SubstringTable = &[
    (CaptchaKind::RotateCaptcha, &["rotatecaptcha"]),
    (CaptchaKind::ClickCaptcha, &["clickcaptcha"]),
    (CaptchaKind::ImageCaptcha, &["imagecaptcha"]),
    (CaptchaKind::PuzzleCaptcha, &["puzzlecaptcha"]),
    (CaptchaKind::SliderCaptcha, &["slidercaptcha"]),
    (CaptchaKind::SimpleCaptcha, &["textcaptcha", "text-captcha"]),
];

/// Layer 5: field names of hand-rolled text CAPTCHAs.
const SIMPLE_FIELD_PATTERNS: &[&str] = &[
    "simplecaptcha",
    "captcha_code",
    "captcha_input",
    "verify_code",
    "verification_code",
    "security_code",
    "text_captcha",
    "captcha_result",
];

/// Layer 6: iframe src fragments.
const IFRAME_PATTERNS: SubstringTable = &[
    (CaptchaKind::Recaptcha, &["google.com/recaptcha"]),
    (CaptchaKind::HCaptcha, &["hcaptcha.com"]),
    (CaptchaKind::Turnstile, &["cloudflare.com/turnstile"]),
    (CaptchaKind::Funcaptcha, &["funcaptcha"]),
    (CaptchaKind::Yandex, &["yandex", "smartcaptcha"]),
];

/// Layer 7: generic markers that indicate some CAPTCHA is present even
/// when the provider is unknown.
const GENERIC_MARKERS: &[&str] = &["captcha", "turnstile", "geetest"];

static SCRIPT_PATTERNS: LazyLock<Vec<(CaptchaKind, Vec<Regex>)>> = LazyLock::new(|| {
    regex_table(&[
        (
            CaptchaKind::RecaptchaV2,
            &[r"recaptcha.*v2", r"recaptcha/api\.js"],
        ),
        (
            CaptchaKind::RecaptchaInvisible,
            &[r"recaptcha.*invisible", r"grecaptcha\.render.*invisible"],
        ),
        (
            CaptchaKind::Recaptcha,
            &[r"google\.com/recaptcha", r"recaptcha.*\.js", r"gstatic\.com/.*recaptcha"],
        ),
        (CaptchaKind::HCaptcha, &[r"js\.hcaptcha\.com", r"hcaptcha"]),
        (
            CaptchaKind::Turnstile,
            &[r"challenges\.cloudflare\.com", r"js\.cloudflare\.com.*turnstile"],
        ),
        (CaptchaKind::Geetest, &[r"geetest"]),
        (CaptchaKind::FriendlyCaptcha, &[r"friendlycaptcha"]),
        (CaptchaKind::RotateCaptcha, &[r"api\.rotatecaptcha\.com"]),
        (CaptchaKind::ClickCaptcha, &[r"assets\.clickcaptcha\.com"]),
        (CaptchaKind::ImageCaptcha, &[r"api\.imagecaptcha\.com"]),
        (CaptchaKind::PuzzleCaptcha, &[r"puzzle.*captcha"]),
        (
            CaptchaKind::SliderCaptcha,
            &[r"slider.*captcha", r"slidercaptcha\.com"],
        ),
        (CaptchaKind::Datadome, &[r"datadome\.co"]),
        (CaptchaKind::PerimeterX, &[r"perimeterx\.net"]),
        (CaptchaKind::Argon, &[r"argon.*captcha", r"captcha\.argon"]),
        (CaptchaKind::Behaviotech, &[r"behaviotech\.com"]),
        (
            CaptchaKind::SmartCaptcha,
            &[r"captcha\.yandex\.com", r"smartcaptcha\.yandex"],
        ),
        (CaptchaKind::Yandex, &[r"yandex\.com/.*captcha", r"captcha\.yandex"]),
        (CaptchaKind::Funcaptcha, &[r"funcaptcha\.com"]),
        (CaptchaKind::Wsiz, &[r"wsiz\.com"]),
        (CaptchaKind::Novascape, &[r"novascape\.com"]),
        (CaptchaKind::MCaptcha, &[r"mcaptcha"]),
        (CaptchaKind::Kasada, &[r"kasada"]),
        (CaptchaKind::Imperva, &[r"/_incapsula_resource", r"incapsula", r"imperva"]),
        (
            CaptchaKind::AwsWaf,
            &[r"/aws-waf-captcha/", r"awswaf\.com", r"captcha\.aws\.amazon\.com"],
        ),
    ])
});

static INTEGRATION_PATTERNS: LazyLock<Vec<(CaptchaKind, Vec<Regex>)>> = LazyLock::new(|| {
    regex_table(&[
        (
            CaptchaKind::RecaptchaInvisible,
            &[r#"class="[^"]*g-recaptcha-invisible"#, r#"data-size="invisible""#],
        ),
        (CaptchaKind::RecaptchaV2, &[r#"class="[^"]*g-recaptcha-v2"#]),
        (
            CaptchaKind::Recaptcha,
            &[
                r#"src="[^"]*google\.com/recaptcha"#,
                r#"src="[^"]*gstatic\.com/[^"]*recaptcha"#,
                r#"src="[^"]*recaptcha/api\.js"#,
                r#"class="[^"]*g-recaptcha"#,
            ],
        ),
        (
            CaptchaKind::HCaptcha,
            &[
                r#"src="[^"]*js\.hcaptcha\.com"#,
                r#"class="[^"]*h-captcha"#,
                r"data-hcaptcha-widget-id",
            ],
        ),
        (
            CaptchaKind::Turnstile,
            &[r#"src="[^"]*challenges\.cloudflare\.com"#, r#"class="[^"]*cf-turnstile"#],
        ),
        (
            CaptchaKind::Geetest,
            &[r#"src="[^"]*geetest"#, r#"class="[^"]*geetest"#],
        ),
        (
            CaptchaKind::FriendlyCaptcha,
            &[r#"src="[^"]*friendlycaptcha"#, r#"class="[^"]*frc-captcha"#],
        ),
        (
            CaptchaKind::RotateCaptcha,
            &[r#"alt="[^"]*rotatecaptcha"#, r#"src="[^"]*rotatecaptcha"#],
        ),
        (
            CaptchaKind::ClickCaptcha,
            &[r#"alt="[^"]*clickcaptcha"#, r#"src="[^"]*clickcaptcha"#],
        ),
        (
            CaptchaKind::ImageCaptcha,
            &[r#"alt="[^"]*imagecaptcha"#, r#"src="[^"]*imagecaptcha"#],
        ),
        (CaptchaKind::PuzzleCaptcha, &[r#"class="[^"]*__puzzle_captcha"#]),
        (
            CaptchaKind::SliderCaptcha,
            &[r#"class="[^"]*slider-captcha"#, r#"src="[^"]*slidercaptcha"#],
        ),
        (
            CaptchaKind::MCaptcha,
            &[r#"src="[^"]*mcaptcha"#, r#"class="[^"]*mcaptcha"#, r"data-mcaptcha"],
        ),
        (
            CaptchaKind::Kasada,
            &[r#"src="[^"]*kasadaproducts\.com"#, r"data-kasada"],
        ),
        (
            CaptchaKind::Imperva,
            &[r#"src="[^"]*/_incapsula_resource"#, r"data-incapsula", r"data-imperva"],
        ),
        (
            CaptchaKind::AwsWaf,
            &[r#"src="[^"]*aws-waf-captcha"#, r#"src="[^"]*awswaf\.com"#],
        ),
        (
            CaptchaKind::Datadome,
            &[r#"src="[^"]*datadome"#, r"data-datadome", r#"class="[^"]*dd-challenge"#],
        ),
        (
            CaptchaKind::PerimeterX,
            &[r#"src="[^"]*perimeterx"#, r"data-px", r"_pxappid"],
        ),
        (CaptchaKind::Argon, &[r#"class="[^"]*argon-captcha"#]),
        (CaptchaKind::Behaviotech, &[r#"src="[^"]*behaviotech\.com"#]),
        (
            CaptchaKind::SmartCaptcha,
            &[
                r#"src="[^"]*captcha\.yandex"#,
                r#"class="[^"]*smart-captcha"#,
                r"data-smartcaptcha",
            ],
        ),
        (
            CaptchaKind::Yandex,
            &[r#"src="[^"]*smartcaptcha\.yandex"#, r#"class="[^"]*yandex-captcha"#],
        ),
        (
            CaptchaKind::Funcaptcha,
            &[
                r#"src="[^"]*funcaptcha\.com"#,
                r#"src="[^"]*arkoselabs\.com"#,
                r#"class="[^"]*funcaptcha"#,
            ],
        ),
        (CaptchaKind::Wsiz, &[r#"src="[^"]*wsiz\.com"#]),
        (CaptchaKind::Novascape, &[r#"src="[^"]*novascape"#]),
        (
            CaptchaKind::SimpleCaptcha,
            &[
                r#"name="[^"]*captcha_code"#,
                r#"name="[^"]*captcha_input"#,
                r#"id="[^"]*captcha_image"#,
            ],
        ),
    ])
});

fn regex_table(entries: &[(CaptchaKind, &[&str])]) -> Vec<(CaptchaKind, Vec<Regex>)> {
    entries
        .iter()
        .map(|(kind, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid pattern {p:?}: {e}")))
                .collect();
            (*kind, compiled)
        })
        .collect()
}

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("script[src]"));
static ID_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("[id]"));
static IMG_ALT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("img[alt]"));
static IFRAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("iframe[src]"));

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| panic!("invalid selector: {css}"))
}

fn match_substrings(haystack: &str, table: SubstringTable) -> CaptchaKind {
    for (kind, patterns) in table {
        if patterns.iter().any(|p| haystack.contains(p)) {
            return *kind;
        }
    }
    CaptchaKind::None
}

fn match_regexes(haystack: &str, table: &[(CaptchaKind, Vec<Regex>)]) -> CaptchaKind {
    for (kind, patterns) in table {
        if patterns.iter().any(|re| re.is_match(haystack)) {
            return *kind;
        }
    }
    CaptchaKind::None
}

/// Detect a CAPTCHA in one form element.
///
/// Scripts in the form's enclosing element are considered too: provider
/// scripts commonly sit next to the form rather than inside it.
pub fn detect_in_form(form: ElementRef<'_>) -> CaptchaKind {
    let markup = form.html().to_lowercase();

    let by_class = match_substrings(&markup, CLASS_PATTERNS);
    if by_class != CaptchaKind::None {
        return by_class;
    }

    let mut script_srcs: Vec<String> = form
        .select(&SCRIPT_SELECTOR)
        .filter_map(|s| s.value().attr("src"))
        .map(str::to_lowercase)
        .collect();
    if let Some(parent) = form.parent().and_then(ElementRef::wrap) {
        script_srcs.extend(
            parent
                .select(&SCRIPT_SELECTOR)
                .filter_map(|s| s.value().attr("src"))
                .map(str::to_lowercase),
        );
    }
    for src in &script_srcs {
        let by_script = match_regexes(src, &SCRIPT_PATTERNS);
        if by_script != CaptchaKind::None {
            return by_script;
        }
    }

    let by_data = match_substrings(&markup, DATA_ATTR_PATTERNS);
    if by_data != CaptchaKind::None {
        return by_data;
    }

    for (kind, patterns) in ID_PATTERNS {
        let hit = form.select(&ID_SELECTOR).any(|el| {
            el.value()
                .attr("id")
                .is_some_and(|id| patterns.iter().any(|p| id.to_lowercase().contains(p)))
        });
        if hit {
            return *kind;
        }
    }
    for img in form.select(&IMG_ALT_SELECTOR) {
        if let Some(alt) = img.value().attr("alt") {
            let by_alt = match_substrings(&alt.to_lowercase(), ALT_PATTERNS);
            if by_alt != CaptchaKind::None {
                return by_alt;
            }
        }
    }

    if markup.contains("__puzzle_captcha") || markup.contains("puzzle-captcha") {
        return CaptchaKind::PuzzleCaptcha;
    }
    if SIMPLE_FIELD_PATTERNS.iter().any(|p| markup.contains(p)) {
        return CaptchaKind::SimpleCaptcha;
    }

    for iframe in form.select(&IFRAME_SELECTOR) {
        if let Some(src) = iframe.value().attr("src") {
            let by_iframe = match_substrings(&src.to_lowercase(), IFRAME_PATTERNS);
            if by_iframe != CaptchaKind::None {
                return by_iframe;
            }
        }
    }

    if GENERIC_MARKERS.iter().any(|m| markup.contains(m)) {
        return CaptchaKind::Other;
    }
    CaptchaKind::None
}

/// Best-effort detection over a raw HTML string.
///
/// Unlike [`detect_in_form`] this never sees a DOM, so every pattern
/// requires an integration context (script src, class/id attribute,
/// data attribute, iframe src) rather than a bare keyword mention in
/// link or body text.
pub fn detect_in_html(html: &str) -> CaptchaKind {
    let lower = html.to_lowercase();
    match_regexes(&lower, &INTEGRATION_PATTERNS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{forms, parse_document};

    fn detect(html: &str) -> CaptchaKind {
        let doc = parse_document(html);
        detect_in_form(forms(&doc)[0])
    }

    #[test]
    fn test_kind_string_round_trip() {
        let all = [
            CaptchaKind::None,
            CaptchaKind::Recaptcha,
            CaptchaKind::RecaptchaV2,
            CaptchaKind::RecaptchaInvisible,
            CaptchaKind::HCaptcha,
            CaptchaKind::Turnstile,
            CaptchaKind::Geetest,
            CaptchaKind::FriendlyCaptcha,
            CaptchaKind::RotateCaptcha,
            CaptchaKind::ClickCaptcha,
            CaptchaKind::ImageCaptcha,
            CaptchaKind::PuzzleCaptcha,
            CaptchaKind::SliderCaptcha,
            CaptchaKind::MCaptcha,
            CaptchaKind::Datadome,
            CaptchaKind::PerimeterX,
            CaptchaKind::Argon,
            CaptchaKind::Behaviotech,
            CaptchaKind::SmartCaptcha,
            CaptchaKind::Yandex,
            CaptchaKind::Funcaptcha,
            CaptchaKind::Kasada,
            CaptchaKind::Imperva,
            CaptchaKind::AwsWaf,
            CaptchaKind::Wsiz,
            CaptchaKind::Novascape,
            CaptchaKind::SimpleCaptcha,
            CaptchaKind::Other,
        ];
        for kind in all {
            assert_eq!(CaptchaKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(CaptchaKind::from_str("bogus"), None);
    }

    #[test]
    fn test_no_captcha() {
        let kind = detect(
            r#"<form action="/login">
                <input type="text" name="user">
                <input type="password" name="pass">
            </form>"#,
        );
        assert_eq!(kind, CaptchaKind::None);
    }

    #[test]
    fn test_recaptcha_by_class() {
        let kind = detect(r#"<form><div class="g-recaptcha" data-sitekey="key"></div></form>"#);
        assert_eq!(kind, CaptchaKind::Recaptcha);
    }

    #[test]
    fn test_recaptcha_v2_class_beats_base_recaptcha() {
        let kind = detect(r#"<form><div class="g-recaptcha-v2"></div></form>"#);
        assert_eq!(kind, CaptchaKind::RecaptchaV2);
    }

    #[test]
    fn test_hcaptcha_by_class() {
        let kind = detect(r#"<form><div class="h-captcha" data-sitekey="key"></div></form>"#);
        assert_eq!(kind, CaptchaKind::HCaptcha);
    }

    #[test]
    fn test_turnstile_by_script_domain() {
        let kind = detect(
            r#"<form>
                <script src="https://challenges.cloudflare.com/turnstile/v0/api.js"></script>
                <input type="text" name="q">
            </form>"#,
        );
        assert_eq!(kind, CaptchaKind::Turnstile);
    }

    #[test]
    fn test_class_layer_beats_script_layer() {
        // hcaptcha class present alongside a recaptcha script: the class
        // layer runs first.
        let kind = detect(
            r#"<form>
                <div class="h-captcha"></div>
                <script src="https://www.google.com/recaptcha/api.js"></script>
            </form>"#,
        );
        assert_eq!(kind, CaptchaKind::HCaptcha);
    }

    #[test]
    fn test_geetest_by_id() {
        let kind = detect(r#"<form><div id="embed-captcha"></div></form>"#);
        assert_eq!(kind, CaptchaKind::Geetest);
    }

    #[test]
    fn test_slider_by_alt_text() {
        let kind = detect(r#"<form><img alt="slidercaptcha challenge" src="/ch.png"></form>"#);
        assert_eq!(kind, CaptchaKind::SliderCaptcha);
    }

    #[test]
    fn test_simple_captcha_by_field_name() {
        let kind = detect(r#"<form><input type="text" name="captcha_code"></form>"#);
        assert_eq!(kind, CaptchaKind::SimpleCaptcha);
    }

    #[test]
    fn test_recaptcha_by_iframe() {
        let kind = detect(
            r#"<form><iframe src="https://www.google.com/recaptcha/api2/anchor"></iframe></form>"#,
        );
        assert_eq!(kind, CaptchaKind::Recaptcha);
    }

    #[test]
    fn test_generic_marker_falls_back_to_other() {
        let kind = detect(r#"<form><div class="my-captcha-box"></div></form>"#);
        assert_eq!(kind, CaptchaKind::Other);
    }

    #[test]
    fn test_detect_in_html_requires_integration_context() {
        // A bare keyword mention in link text is not an integration.
        assert_eq!(
            detect_in_html(r#"<a href="/blog">What is a captcha?</a>"#),
            CaptchaKind::None
        );
        assert_eq!(
            detect_in_html(r#"<script src="https://www.google.com/recaptcha/api.js"></script>"#),
            CaptchaKind::Recaptcha
        );
        assert_eq!(
            detect_in_html(r#"<div class="cf-turnstile" data-sitekey="k"></div>"#),
            CaptchaKind::Turnstile
        );
    }
}
