use super::{code_checker, sizes_only, Language, Minifier};
use crate::scanner::{ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("css", Dialect::Plain)
        .quotes(&['"', '\''])
        .escape('\\')
        .block_comment("/*", "*/")
});

static RE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([{};,>~])\s*").expect("RE_PUNCTUATION: invalid regex"));

static RE_COLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s+").expect("RE_COLON: invalid regex"));

static RE_OPEN_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s+").expect("RE_OPEN_PAREN: invalid regex"));

static RE_CLOSE_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\)").expect("RE_CLOSE_PAREN: invalid regex"));

/// Drops the space the scanner keeps around punctuation that never needs it.
/// `+` is left alone because `calc()` requires spaces around it.
fn tighten_punctuation(code: &str) -> String {
    let code = RE_PUNCTUATION.replace_all(code, "$1");
    let code = RE_COLON.replace_all(&code, ":");
    let code = RE_OPEN_PAREN.replace_all(&code, "(");
    RE_CLOSE_PAREN.replace_all(&code, ")").into_owned()
}

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Css,
        table: TABLE.clone(),
        passes: vec![tighten_punctuation],
        checker: code_checker(),
        analyzer: sizes_only,
        prettifier: None,
    }
}

/// Minifies a stylesheet with the default rules. Also used for `<style>`
/// bodies inside HTML.
pub fn minify(code: &str) -> String {
    super::minify(Language::Css, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_rules() {
        let css = "/* header */\nbody {\n  margin : 0;\n  color: red ;\n}\n\na > b ,  c ~ d {\n  padding: 0 1px;\n}\n";
        assert_eq!(minify(css), "body{margin :0;color:red;}a>b,c~d{padding:0 1px;}");
    }

    #[test]
    fn comment_between_words_keeps_separator() {
        assert_eq!(minify("a /* comment */ b"), "a b");
    }

    #[test]
    fn strings_keep_their_content() {
        assert_eq!(
            minify("a::before { content: \" ; {  } \" ; }"),
            "a::before{content:\" ; {  } \";}"
        );
        assert_eq!(
            minify("a { background: url( 'a  b.png' ) }"),
            "a{background:url('a  b.png')}"
        );
    }

    #[test]
    fn selectors_and_media_queries_keep_required_spaces() {
        assert_eq!(
            minify("@media screen and ( max-width: 600px ) {\n  .a .b:hover { width: calc(100% - 2px) }\n}"),
            "@media screen and (max-width:600px){.a .b:hover{width:calc(100% - 2px)}}"
        );
        assert_eq!(minify("a :hover { }"), "a :hover{}");
    }

    #[test]
    fn validation_reports_unclosed_block() {
        let issues = minifier().validate("a {\n  color: red;\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].check, "brackets");
        assert!(minifier().validate("a { b: \"}\" }").is_empty());
    }

    #[test]
    fn strip_comments_keeps_layout() {
        assert_eq!(
            minifier().strip_comments("a {\n  /* x */ b: c;\n}"),
            "a {\n   b: c;\n}"
        );
    }
}
