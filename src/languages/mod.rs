pub mod css;
pub mod html;
pub mod javascript;
pub mod json;
pub mod php;
pub mod python;
pub mod sql;
pub mod universal;
pub mod xml;

use crate::config::Config;
use crate::error::{CodeminError, Result};
use crate::pipeline::{self, MinifyResult, Pass};
use crate::scanner::{self, build_line_offsets, offset_to_line, ContextRuleTable};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Css,
    Html,
    JavaScript,
    Json,
    Xml,
    Sql,
    Php,
    Python,
    Universal,
}

impl Language {
    /// Every language, in registry order.
    pub const ALL: [Language; 9] = [
        Language::Css,
        Language::Html,
        Language::JavaScript,
        Language::Json,
        Language::Xml,
        Language::Sql,
        Language::Php,
        Language::Python,
        Language::Universal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Css => "css",
            Language::Html => "html",
            Language::JavaScript => "javascript",
            Language::Json => "json",
            Language::Xml => "xml",
            Language::Sql => "sql",
            Language::Php => "php",
            Language::Python => "python",
            Language::Universal => "universal",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Css => &["css"],
            Language::Html => &["html", "htm", "xhtml"],
            Language::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Language::Json => &["json", "jsonc", "map", "webmanifest"],
            Language::Xml => &["xml", "svg", "xsd", "xsl", "xslt", "rss", "atom", "plist"],
            Language::Sql => &["sql"],
            Language::Php => &["php", "phtml"],
            Language::Python => &["py", "pyw", "pyi"],
            Language::Universal => &[],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Language> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.extensions().iter().any(|known| *known == ext))
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = CodeminError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let language = match lower.as_str() {
            "css" => Language::Css,
            "html" | "htm" | "xhtml" => Language::Html,
            "javascript" | "js" | "mjs" | "jsx" => Language::JavaScript,
            "json" | "jsonc" => Language::Json,
            "xml" | "svg" => Language::Xml,
            "sql" => Language::Sql,
            "php" => Language::Php,
            "python" | "py" => Language::Python,
            "universal" | "text" | "any" => Language::Universal,
            _ => return Err(CodeminError::UnknownLanguage(s.to_string())),
        };
        Ok(language)
    }
}

/// A validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub check: &'static str,
    pub message: String,
    pub line: Option<u32>,
}

/// Size and structure of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub language: Language,
    pub lines: usize,
    pub characters: usize,
    pub bytes: usize,
    /// Top-level JSON type or XML root element.
    pub kind: Option<String>,
    /// Language-specific counts such as `functions` or `statements`.
    pub counts: BTreeMap<&'static str, usize>,
    /// Why the input could not be parsed, for languages that parse it.
    pub error: Option<String>,
}

impl Analysis {
    fn new(language: Language, code: &str) -> Self {
        Self {
            language,
            lines: code.matches('\n').count() + 1,
            characters: code.chars().count(),
            bytes: code.len(),
            kind: None,
            counts: BTreeMap::new(),
            error: None,
        }
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts.get(name).copied()
    }
}

type Checker = Box<dyn Fn(&str, &ContextRuleTable) -> Vec<Issue> + Send + Sync>;

/// Adds language-specific counts to an [`Analysis`].
type Analyzer = fn(&str, &ContextRuleTable, &mut Analysis);

/// Lays text out for reading.
type Prettifier = fn(&str, &ContextRuleTable) -> Result<String>;

pub struct Minifier {
    pub language: Language,
    table: ContextRuleTable,
    passes: Vec<Pass>,
    checker: Checker,
    analyzer: Analyzer,
    prettifier: Option<Prettifier>,
}

impl Minifier {
    pub fn minify(&self, code: &str) -> String {
        self.minify_with_stats(code).output
    }

    pub fn minify_with_stats(&self, code: &str) -> MinifyResult {
        pipeline::run(self.language, code, &self.table, &self.passes)
    }

    /// Removes comments only; whitespace and layout stay as they are.
    pub fn strip_comments(&self, code: &str) -> String {
        scanner::strip_comments(code, &self.table)
    }

    pub fn validate(&self, code: &str) -> Vec<Issue> {
        (self.checker)(code, &self.table)
    }

    /// Line, character and byte counts plus whatever the language adds.
    pub fn analyze(&self, code: &str) -> Analysis {
        let mut analysis = Analysis::new(self.language, code);
        (self.analyzer)(code, &self.table, &mut analysis);
        analysis
    }

    pub fn prettify(&self, code: &str) -> Result<String> {
        match self.prettifier {
            Some(prettify) => prettify(code, &self.table),
            None => Err(CodeminError::NoPrettifier(self.language)),
        }
    }

    pub fn rules(&self) -> &ContextRuleTable {
        &self.table
    }
}

/// One configured minifier per language.
pub struct Registry {
    minifiers: Vec<Minifier>,
}

impl Registry {
    pub fn get(&self, language: Language) -> &Minifier {
        &self.minifiers[language as usize]
    }
}

pub fn load_minifiers(config: &Config) -> Registry {
    let minifiers = Language::ALL
        .into_iter()
        .map(|language| match language {
            Language::Css => css::minifier(),
            Language::Html => html::minifier(&config.html),
            Language::JavaScript => javascript::minifier(),
            Language::Json => json::minifier(),
            Language::Xml => xml::minifier(&config.xml),
            Language::Sql => sql::minifier(),
            Language::Php => php::minifier(),
            Language::Python => python::minifier(),
            Language::Universal => universal::minifier(),
        })
        .collect();
    Registry { minifiers }
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| load_minifiers(&Config::default()));

/// Minifies `code` with the default configuration.
pub fn minify(language: Language, code: &str) -> String {
    DEFAULT_REGISTRY.get(language).minify(code)
}

pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

fn line_of(offsets: &[usize], offset: usize) -> Option<u32> {
    u32::try_from(offset_to_line(offsets, offset)).ok()
}

/// Source with comments removed and literal contents blanked, so counting
/// regexes only see code.
fn code_text(code: &str, rules: &ContextRuleTable) -> String {
    scanner::scan_layout(code, rules).masked()
}

fn sizes_only(_: &str, _: &ContextRuleTable, _: &mut Analysis) {}

/// Reports a string, comment or other context left open at end of input.
pub fn check_literals(code: &str, rules: &ContextRuleTable) -> Vec<Issue> {
    let scanned = scanner::scan_layout(code, rules);
    let Some(open) = scanned.unclosed else {
        return Vec::new();
    };
    let offsets = build_line_offsets(code);
    vec![Issue {
        check: "unterminated",
        message: format!("unterminated {}", open.kind),
        line: line_of(&offsets, open.offset),
    }]
}

/// Reports unbalanced `()`, `[]` and `{}` outside literals and comments.
pub fn check_brackets(code: &str, rules: &ContextRuleTable) -> Vec<Issue> {
    let masked = scanner::scan_layout(code, rules).masked();
    let mut issues = Vec::new();
    let mut stack: Vec<(char, u32)> = Vec::new();
    let mut line = 1u32;

    for c in masked.chars() {
        match c {
            '\n' => line += 1,
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, opened_at)) => issues.push(Issue {
                        check: "brackets",
                        message: format!("`{c}` closes `{open}` opened on line {opened_at}"),
                        line: Some(line),
                    }),
                    None => issues.push(Issue {
                        check: "brackets",
                        message: format!("unexpected `{c}`"),
                        line: Some(line),
                    }),
                }
            }
            _ => {}
        }
    }

    issues.extend(stack.into_iter().map(|(open, opened_at)| Issue {
        check: "brackets",
        message: format!("unclosed `{open}`"),
        line: Some(opened_at),
    }));
    issues
}

/// Literal and bracket checks, shared by the C-like languages.
fn code_checker() -> Checker {
    Box::new(|code: &str, rules: &ContextRuleTable| {
        let mut issues = check_literals(code, rules);
        issues.extend(check_brackets(code, rules));
        issues
    })
}

fn literal_checker() -> Checker {
    Box::new(check_literals)
}
