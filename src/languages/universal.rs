use super::{code_checker, sizes_only, Language, Minifier};
use crate::scanner::{ContextRuleTable, Dialect};
use once_cell::sync::Lazy;

/// Fallback for unknown text. Line comments only count at the start of the
/// input or after whitespace so `#fff`, `i--` and `http://` survive.
pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("universal", Dialect::Plain)
        .quotes(&['"', '\''])
        .escape('\\')
        .line_comment("//")
        .line_comment("#")
        .line_comment("--")
        .comment_boundary()
        .block_comment("/*", "*/")
        .block_comment("<!--", "-->")
});

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Universal,
        table: TABLE.clone(),
        passes: Vec::new(),
        checker: code_checker(),
        analyzer: sizes_only,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Universal, code)
}
