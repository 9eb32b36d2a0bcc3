use super::{code_checker, code_text, Analysis, Language, Minifier};
use crate::error::Result;
use crate::scanner::{self, ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use regex::Regex;

/// Quotes are doubled to escape them (`'it''s'`), so there is no escape
/// character; two adjacent literals scan the same way.
pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("sql", Dialect::Plain)
        .quotes(&['\'', '"', '`'])
        .line_comment("--")
        .block_comment("/*", "*/")
});

static RE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([=,();<>])\s*").expect("RE_PUNCTUATION: invalid regex"));

fn tighten_punctuation(code: &str) -> String {
    RE_PUNCTUATION.replace_all(code, "$1").into_owned()
}

static RE_STATEMENT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*;\s*").expect("RE_STATEMENT_END: invalid regex"));

static RE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*\b(SELECT|INSERT|UPDATE|DELETE|CREATE|DROP|ALTER|FROM|WHERE|(?:(?:LEFT|RIGHT|INNER|OUTER|CROSS) )?JOIN|ON|GROUP BY|ORDER BY|HAVING|LIMIT|UNION)\b\s*",
    )
    .expect("RE_CLAUSE: invalid regex")
});

static RE_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").expect("RE_LINE_BREAK: invalid regex"));

/// Statements end their line and every clause keyword starts one.
fn break_clauses(code: &str) -> String {
    let code = RE_STATEMENT_END.replace_all(code, ";\n");
    let code = RE_CLAUSE.replace_all(&code, "\n$1 ");
    RE_LINE_BREAK.replace_all(&code, "\n").into_owned()
}

fn prettify(code: &str, rules: &ContextRuleTable) -> Result<String> {
    let scanned = scanner::scan_with_spans(code, rules);
    Ok(scanned.rewrite_code(break_clauses).trim().to_string())
}

/// Non-empty statements, whether or not the last one ends with `;`.
fn analyze(code: &str, rules: &ContextRuleTable, analysis: &mut Analysis) {
    let statements = code_text(code, rules)
        .split(';')
        .filter(|statement| !statement.trim().is_empty())
        .count();
    analysis.counts.insert("statements", statements);
}

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Sql,
        table: TABLE.clone(),
        passes: vec![tighten_punctuation],
        checker: code_checker(),
        analyzer: analyze,
        prettifier: Some(prettify),
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Sql, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_a_query() {
        let source = "SELECT  a ,  b -- pick\nFROM t /* tbl */ WHERE x = 'it''s  ok' AND y <> 3;\n";
        assert_eq!(minify(source), "SELECT a,b FROM t WHERE x='it''s  ok' AND y<>3;");
    }

    #[test]
    fn keeps_keyword_spacing_and_identifiers() {
        assert_eq!(
            minify("INSERT INTO \"my table\" ( id , name )\n  VALUES ( 1 , `x  y` ) ;"),
            "INSERT INTO \"my table\"(id,name)VALUES(1,`x  y`);"
        );
    }

    #[test]
    fn double_minus_stays_apart() {
        assert_eq!(minify("SELECT 1 - -1"), "SELECT 1 - -1");
    }

    #[test]
    fn prettify_starts_clauses_on_new_lines() {
        let source = "select a, b from t   -- all\n where x = 'a;b  from' order by a; delete from t";
        assert_eq!(
            minifier().prettify(source).unwrap(),
            "select a, b\nfrom t\nwhere x = 'a;b  from'\norder by a;\ndelete\nfrom t"
        );
    }

    #[test]
    fn counts_statements_outside_literals() {
        let analysis = minifier().analyze("SELECT 1; -- x;\nSELECT ';';\nUPDATE t SET a = 1");
        assert_eq!(analysis.count("statements"), Some(3));
        assert_eq!(analysis.lines, 3);
    }

    #[test]
    fn validates_parentheses() {
        assert!(minifier().validate("SELECT count(*) FROM t WHERE a IN (1, 2)").is_empty());
        let issues = minifier().validate("SELECT (a FROM t\n");
        assert_eq!(issues[0].message, "unclosed `(`");
    }
}
