//! Scanner, then whitespace-only regex passes over code segments, then trim.

use crate::languages::Language;
use crate::scanner::{self, ContextRuleTable, Unclosed};

/// A whitespace-only rewrite applied to text outside literals.
pub type Pass = fn(&str) -> String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyResult {
    pub language: Language,
    pub output: String,
    pub original_len: usize,
    pub minified_len: usize,
    /// Literal or comment the input ended inside, if any.
    pub unclosed: Option<Unclosed>,
}

impl MinifyResult {
    /// Minified size over original size; 1.0 for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_len == 0 {
            return 1.0;
        }
        self.minified_len as f64 / self.original_len as f64
    }

    pub fn reduction_pct(&self) -> f64 {
        (1.0 - self.ratio()) * 100.0
    }

    pub fn saved(&self) -> usize {
        self.original_len.saturating_sub(self.minified_len)
    }
}

pub fn run(
    language: Language,
    source: &str,
    rules: &ContextRuleTable,
    passes: &[Pass],
) -> MinifyResult {
    let scanned = scanner::scan_with_spans(source, rules);
    let rewritten = if passes.is_empty() {
        scanned.text
    } else {
        scanned.rewrite_code(|code| {
            passes
                .iter()
                .fold(code.to_string(), |acc, pass| pass(&acc))
        })
    };
    let output = rewritten
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_string();

    tracing::debug!(
        %language,
        original = source.len(),
        minified = output.len(),
        "minified"
    );

    MinifyResult {
        language,
        original_len: source.len(),
        minified_len: output.len(),
        output,
        unclosed: scanned.unclosed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Dialect;
    use pretty_assertions::assert_eq;

    fn drop_spaces(code: &str) -> String {
        code.replace(' ', "")
    }

    #[test]
    fn passes_skip_literals() {
        let rules = ContextRuleTable::new("test", Dialect::Plain).quotes(&['"']);
        let result = run(Language::Universal, "a b \"c d\" e", &rules, &[drop_spaces]);
        assert_eq!(result.output, "ab\"c d\"e");
        assert_eq!(result.original_len, 11);
        assert_eq!(result.minified_len, 8);
        assert_eq!(result.saved(), 3);
    }

    #[test]
    fn empty_input_has_neutral_stats() {
        let rules = ContextRuleTable::new("test", Dialect::Plain);
        let result = run(Language::Css, "", &rules, &[]);
        assert_eq!(result.output, "");
        assert_eq!(result.ratio(), 1.0);
        assert_eq!(result.reduction_pct(), 0.0);
    }

    #[test]
    fn reduction_is_a_percentage() {
        let result = MinifyResult {
            language: Language::Json,
            output: String::new(),
            original_len: 200,
            minified_len: 50,
            unclosed: None,
        };
        assert_eq!(result.ratio(), 0.25);
        assert_eq!(result.reduction_pct(), 75.0);
    }
}
