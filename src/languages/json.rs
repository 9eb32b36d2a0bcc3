use super::{check_literals, Analysis, Issue, Language, Minifier};
use crate::error::{CodeminError, Result};
use crate::scanner::{self, ContextRuleTable, Dialect};
use once_cell::sync::Lazy;
use serde_json::Value;

/// JSON with `//` and `/* */` comments accepted, as in JSONC.
pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| {
    ContextRuleTable::new("json", Dialect::Compact)
        .quotes(&['"'])
        .escape('\\')
        .line_comment("//")
        .block_comment("/*", "*/")
});

/// Unterminated strings plus whatever `serde_json` rejects once comments are
/// gone.
fn validate(code: &str, rules: &ContextRuleTable) -> Vec<Issue> {
    let mut issues = check_literals(code, rules);
    if !issues.is_empty() || code.trim().is_empty() {
        return issues;
    }

    if let Err(e) = parse(code, rules) {
        issues.push(Issue {
            check: "json",
            message: e.to_string(),
            line: u32::try_from(e.line()).ok(),
        });
    }
    issues
}

/// Parses `code` once comments are removed.
fn parse(code: &str, rules: &ContextRuleTable) -> serde_json::Result<Value> {
    serde_json::from_str(&scanner::scan_layout(code, rules).text)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Top-level type plus its element or key count.
fn analyze(code: &str, rules: &ContextRuleTable, analysis: &mut Analysis) {
    match parse(code, rules) {
        Ok(value) => {
            analysis.kind = Some(type_name(&value).to_string());
            match &value {
                Value::Array(items) => {
                    analysis.counts.insert("elements", items.len());
                }
                Value::Object(map) => {
                    analysis.counts.insert("keys", map.len());
                }
                _ => {}
            }
        }
        Err(e) => analysis.error = Some(e.to_string()),
    }
}

/// Two-space indentation; key order is kept.
fn prettify(code: &str, rules: &ContextRuleTable) -> Result<String> {
    let value = parse(code, rules).map_err(|e| CodeminError::Prettify {
        language: Language::Json,
        message: e.to_string(),
    })?;
    serde_json::to_string_pretty(&value).map_err(|e| CodeminError::Prettify {
        language: Language::Json,
        message: e.to_string(),
    })
}

pub fn minifier() -> Minifier {
    Minifier {
        language: Language::Json,
        table: TABLE.clone(),
        passes: Vec::new(),
        checker: Box::new(validate),
        analyzer: analyze,
        prettifier: Some(prettify),
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Json, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_all_insignificant_whitespace() {
        let source = "{\n  \"name\" : \"a  b\",  // inline\n  /* block */\n  \"list\": [ 1, 2.5 , true, null ]\n}\n";
        assert_eq!(minify(source), "{\"name\":\"a  b\",\"list\":[1,2.5,true,null]}");
    }

    #[test]
    fn escaped_quotes_stay_inside_strings() {
        assert_eq!(minify("[ \"a\\\" // b\" ,  1 ]"), "[\"a\\\" // b\",1]");
    }

    #[test]
    fn output_parses_to_the_same_value() {
        let source = "{ \"a\": { \"b\": [1, {\"c\": \"x y\"}] }, \"d\": -0.5e3 }";
        let before: serde_json::Value = serde_json::from_str(source).unwrap();
        let after: serde_json::Value = serde_json::from_str(&minify(source)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn validation_accepts_comments() {
        assert!(minifier().validate("// settings\n{ \"a\": 1 /* one */ }").is_empty());
    }

    #[test]
    fn validation_reports_parse_errors_with_line() {
        let issues = minifier().validate("/* a\n b */\n{\n  \"a\": ,\n}");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].check, "json");
        assert_eq!(issues[0].line, Some(4));
    }

    #[test]
    fn analysis_reports_type_and_size() {
        let object = minifier().analyze("// cfg\n{ \"b\": 1, \"a\": [1, 2] }");
        assert_eq!(object.kind.as_deref(), Some("object"));
        assert_eq!(object.count("keys"), Some(2));
        assert_eq!(object.error, None);

        let array = minifier().analyze("[1, \"two\", null]");
        assert_eq!(array.kind.as_deref(), Some("array"));
        assert_eq!(array.count("elements"), Some(3));

        let scalar = minifier().analyze("42");
        assert_eq!(scalar.kind.as_deref(), Some("number"));
        assert!(scalar.counts.is_empty());

        let broken = minifier().analyze("{\"a\": }");
        assert_eq!(broken.kind, None);
        assert!(broken.error.is_some());
    }

    #[test]
    fn prettify_indents_and_keeps_key_order() {
        let pretty = minifier()
            .prettify("{\"z\":1,/* c */\"a\":[true,{\"k\":\"v  w\"}]}")
            .unwrap();
        assert_eq!(
            pretty,
            "{\n  \"z\": 1,\n  \"a\": [\n    true,\n    {\n      \"k\": \"v  w\"\n    }\n  ]\n}"
        );
    }

    #[test]
    fn prettify_rejects_invalid_json() {
        let err = minifier().prettify("[1,").unwrap_err();
        assert!(matches!(err, CodeminError::Prettify { language: Language::Json, .. }));
    }

    #[test]
    fn validation_reports_unterminated_string_once() {
        let issues = minifier().validate("{\"a\": \"open}");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].check, "unterminated");
    }
}
