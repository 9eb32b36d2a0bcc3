use super::{check_literals, code_text, line_of, Analysis, Issue, Language, Minifier};
use crate::config::XmlConfig;
use crate::scanner::{self, build_line_offsets, ContextRuleTable, Dialect, StructuralTags};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ELEMENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z_][\w:.\-]*)[^<>]*?(/?)>").expect("RE_ELEMENT_TAG: invalid regex")
});

static RE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s[A-Za-z_][\w:.\-]*\s*=").expect("RE_ATTRIBUTE: invalid regex")
});

pub static TABLE: Lazy<ContextRuleTable> = Lazy::new(|| table(&XmlConfig::default()));

pub fn table(config: &XmlConfig) -> ContextRuleTable {
    let mut table = ContextRuleTable::new("xml", Dialect::Markup {
        inline_spacing: false,
    })
    .quotes(&['"', '\''])
    .verbatim("<![CDATA[", "]]>")
    .verbatim("<?xml ", "?>");
    if config.strip_processing_instructions {
        table = table.block_comment("<?", "?>");
    }
    table.block_comment("<!--", "-->").tags(StructuralTags::new())
}

/// Checks that every element is closed in the order it was opened.
fn check_nesting(code: &str, rules: &ContextRuleTable) -> Vec<Issue> {
    let masked = scanner::scan_layout(code, rules).masked();
    let offsets = build_line_offsets(&masked);
    let mut issues = Vec::new();
    let mut open: Vec<(&str, Option<u32>)> = Vec::new();

    for caps in RE_ELEMENT_TAG.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let closing = caps.get(1).is_some_and(|m| !m.is_empty());
        let self_closing = caps.get(3).is_some_and(|m| !m.is_empty());
        let line = line_of(&offsets, whole.start());
        let name = name.as_str();

        if self_closing {
            continue;
        }
        if !closing {
            open.push((name, line));
            continue;
        }
        match open.pop() {
            Some((expected, _)) if expected == name => {}
            Some((expected, _)) => issues.push(Issue {
                check: "nesting",
                message: format!("`</{name}>` closes `<{expected}>`"),
                line,
            }),
            None => issues.push(Issue {
                check: "nesting",
                message: format!("unexpected `</{name}>`"),
                line,
            }),
        }
    }

    issues.extend(open.into_iter().map(|(name, line)| Issue {
        check: "nesting",
        message: format!("unclosed `<{name}>`"),
        line,
    }));
    issues
}

/// Root element, element count and attribute count.
fn analyze(code: &str, rules: &ContextRuleTable, analysis: &mut Analysis) {
    let masked = code_text(code, rules);
    let mut elements = 0;
    let mut attributes = 0;

    for caps in RE_ELEMENT_TAG.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if caps.get(1).is_some_and(|m| !m.is_empty()) {
            continue;
        }
        if analysis.kind.is_none() {
            analysis.kind = Some(name.as_str().to_string());
        }
        elements += 1;
        attributes += RE_ATTRIBUTE.find_iter(whole.as_str()).count();
    }

    analysis.counts.insert("elements", elements);
    analysis.counts.insert("attributes", attributes);
}

pub fn minifier(config: &XmlConfig) -> Minifier {
    Minifier {
        language: Language::Xml,
        table: table(config),
        passes: Vec::new(),
        checker: Box::new(|code: &str, rules: &ContextRuleTable| {
            let mut issues = check_literals(code, rules);
            issues.extend(check_nesting(code, rules));
            issues
        }),
        analyzer: analyze,
        prettifier: None,
    }
}

pub fn minify(code: &str) -> String {
    super::minify(Language::Xml, code)
}
