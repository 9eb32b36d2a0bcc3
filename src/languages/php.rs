use super::{code_checker, code_text, Analysis, Language, Minifier};
use crate::scanner::{ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("php", Dialect::Script {
        newline_sensitive: false,
    })
    .quotes(&['"', '\''])
    .escape('\\')
    // Attributes share the `#` prefix with comments.
    .verbatim("#[", "]")
    .line_comment("//")
    .line_comment("#")
    .block_comment("/*", "*/")
});

static RE_OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\?php(?:(\S)|$)").expect("RE_OPEN_TAG: invalid regex"));

/// `<?php` must be followed by whitespace.
fn separate_open_tag(code: &str) -> String {
    RE_OPEN_TAG.replace_all(code, "<?php $1").into_owned()
}

static RE_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfunction\s+&?\s*[A-Za-z_]\w*\s*\(").expect("RE_FUNCTION: invalid regex")
});

static RE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:(?:abstract|final|readonly)\s+)*class\s+[A-Za-z_]\w*")
        .expect("RE_CLASS: invalid regex")
});

/// Named functions and methods, and class declarations.
fn analyze(code: &str, rules: &ContextRuleTable, analysis: &mut Analysis) {
    let code = code_text(code, rules);
    analysis
        .counts
        .insert("functions", RE_FUNCTION.find_iter(&code).count());
    analysis
        .counts
        .insert("classes", RE_CLASS.find_iter(&code).count());
}

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Php,
        table: TABLE.clone(),
        passes: vec![separate_open_tag],
        checker: code_checker(),
        analyzer: analyze,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Php, code)
}
