use super::{code_checker, code_text, Analysis, Language, Minifier};
use crate::scanner::{ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

/// Triple-quoted strings, docstrings included, are kept as written.
pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("python", Dialect::Indented)
        .quotes(&['"', '\''])
        .escape('\\')
        .verbatim("\"\"\"", "\"\"\"")
        .verbatim("'''", "'''")
        .line_comment("#")
});

static RE_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+\w+[ \t]*\(").expect("RE_DEF: invalid regex")
});

static RE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*class[ \t]+\w+[ \t]*[:(]").expect("RE_CLASS: invalid regex")
});

fn analyze(code: &str, rules: &ContextRuleTable, analysis: &mut Analysis) {
    let code = code_text(code, rules);
    analysis
        .counts
        .insert("functions", RE_DEF.find_iter(&code).count());
    analysis
        .counts
        .insert("classes", RE_CLASS.find_iter(&code).count());
}

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Python,
        table: TABLE.clone(),
        passes: Vec::new(),
        checker: code_checker(),
        analyzer: analyze,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Python, code)
}
