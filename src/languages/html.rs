use super::{css, javascript, json, literal_checker, sizes_only, Language, Minifier};
use crate::config::HtmlConfig;
use crate::scanner::{ContextRuleTable, Dialect, StructuralTags};
use once_cell::sync::Lazy;
use regex::Regex;

/// Elements whose content is copied untouched.
pub const PRESERVE_ELEMENTS: [&str; 6] = ["pre", "code", "textarea", "xmp", "plaintext", "listing"];

/// Elements that flow with text, so whitespace between two of them renders.
pub const INLINE_ELEMENTS: [&str; 34] = [
    "a", "abbr", "acronym", "b", "bdo", "big", "br", "button", "cite", "code", "dfn", "em", "i",
    "img", "input", "kbd", "label", "map", "object", "q", "samp", "script", "select", "small",
    "span", "strong", "sub", "sup", "textarea", "tt", "var", "mark", "time", "s",
];

/// Elements whose body is not markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

static RE_SRC_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\s)src\s*=").expect("RE_SRC_ATTR: invalid regex"));

static RE_TYPE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)type\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("RE_TYPE_ATTR: invalid regex")
});

pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| table(&HtmlConfig::default()));

pub fn table(config: &HtmlConfig) -> ContextRuleTable {
    let mut tags = StructuralTags::new()
        .preserve(&config.preserve_elements)
        .inline(&config.inline_elements)
        .raw_text(RAW_TEXT_ELEMENTS);
    if config.minify_embedded {
        tags = tags.embed(minify_embedded);
    }

    let mut table = ContextRuleTable::new("html", Dialect::Markup { inline_spacing: true })
        .quotes(&['"', '\'']);
    if config.keep_conditional_comments {
        table = table.verbatim("<!--[if", "<![endif]-->");
    }
    table.block_comment("<!--", "-->").tags(tags)
}

/// Lowercased value of the `type` attribute, if present.
fn script_type(attrs: &str) -> Option<String> {
    let caps = RE_TYPE_ATTR.captures(attrs)?;
    let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(value.as_str().trim().to_ascii_lowercase())
}

/// Minifies `<style>` and inline `<script>` bodies. External scripts and
/// script types that are not code (templates, shaders) stay verbatim.
fn minify_embedded(element: &str, attrs: &str, body: &str) -> Option<String> {
    match element {
        "style" => Some(css::minify(body)),
        "script" if RE_SRC_ATTR.is_match(attrs) => None,
        "script" => match script_type(attrs).as_deref() {
            None
            | Some(
                "" | "module" | "text/javascript" | "application/javascript" | "text/ecmascript"
                | "application/ecmascript",
            ) => Some(javascript::minify(body)),
            Some("application/json" | "application/ld+json" | "importmap") => {
                Some(json::minify(body))
            }
            _ => None,
        },
        _ => None,
    }
}

pub fn minifier(config: &HtmlConfig) -> Minifier {
    Minifier {
        language: Language::Html,
        table: table(config),
        passes: Vec::new(),
        checker: literal_checker(),
        analyzer: sizes_only,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Html, code)
}
