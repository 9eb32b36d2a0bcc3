use super::{code_checker, code_text, Analysis, Language, Minifier};
use crate::scanner::{is_word, ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("javascript", Dialect::Script {
        newline_sensitive: true,
    })
    .quotes(&['"', '\'', '`'])
    .escape('\\')
    .line_comment("//")
    .block_comment("/*", "*/")
    .regex_literals(regex_allowed)
});

/// Keywords after which an expression, and so a regex literal, may start.
const REGEX_KEYWORDS: [&str; 14] = [
    "return",
    "throw",
    "case",
    "in",
    "of",
    "delete",
    "void",
    "typeof",
    "new",
    "instanceof",
    "else",
    "do",
    "yield",
    "await",
];

/// Guesses whether a `/` following `emitted` starts a regex literal rather
/// than a division. Heuristic: looks only at the last token.
pub fn regex_allowed(emitted: &str) -> bool {
    let trimmed = emitted.trim_end();
    let Some(last) = trimmed.chars().next_back() else {
        return true;
    };
    // Postfix increment or decrement ends an operand.
    if trimmed.ends_with("++") || trimmed.ends_with("--") {
        return false;
    }
    if "=([{,;:!&|?+-*%/^~<>".contains(last) {
        return true;
    }

    let before = trimmed.trim_end_matches(is_word);
    let word = &trimmed[before.len()..];
    !before.ends_with('.') && REGEX_KEYWORDS.iter().any(|keyword| *keyword == word)
}

static RE_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\b|=>").expect("RE_FUNCTION: invalid regex"));

static RE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+[\w$]+").expect("RE_CLASS: invalid regex"));

/// Function expressions, declarations and arrows, plus named classes.
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
        language: Language::JavaScript,
        table: TABLE.clone(),
        passes: Vec::new(),
        checker: code_checker(),
        analyzer: analyze,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::JavaScript, code)
}
