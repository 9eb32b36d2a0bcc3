//! Per-language lexical context rules.
//!
//! A [`ContextRuleTable`] tells the scanner which characters open strings,
//! which tokens open comments and verbatim spans, whether `/` can start a
//! regex literal, and (for markup) which elements need special handling.
//! Tables are immutable once built; languages keep their defaults in
//! `once_cell` statics and clone them when configuration changes a field.

use std::collections::HashMap;

/// Decides from the text emitted so far whether a `/` opens a regex literal.
pub type RegexDetector = fn(&str) -> bool;

/// Minifies the body of a raw-text element (`element`, raw attribute text,
/// body). Returning `None` keeps the body verbatim.
pub type EmbedFn = fn(&str, &str, &str) -> Option<String>;

/// Which whitespace rule set the collapse policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Every removable gap between two significant characters keeps one space.
    Plain,
    /// No gap ever needs a space.
    Compact,
    /// C-like code: spaces only where tokens would otherwise fuse.
    Script { newline_sensitive: bool },
    /// Tags and text.
    Markup { inline_spacing: bool },
    /// Line structure and leading indentation are significant.
    Indented,
}

/// How an element's content is treated by the markup scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagRule {
    pub preserve_whitespace: bool,
    pub inline: bool,
    pub raw_text: bool,
}

/// Element classification for markup languages.
#[derive(Debug, Clone, Default)]
pub struct StructuralTags {
    elements: HashMap<String, TagRule>,
    pub embed: Option<EmbedFn>,
}

impl StructuralTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preserve<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.entry(name.as_ref()).preserve_whitespace = true;
        }
        self
    }

    pub fn inline<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.entry(name.as_ref()).inline = true;
        }
        self
    }

    pub fn raw_text<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.entry(name.as_ref()).raw_text = true;
        }
        self
    }

    pub fn embed(mut self, embed: EmbedFn) -> Self {
        self.embed = Some(embed);
        self
    }

    /// Rule for `name` (lowercase); unknown elements get the default rule.
    pub fn rule(&self, name: &str) -> TagRule {
        self.elements.get(name).copied().unwrap_or_default()
    }

    pub fn is_inline(&self, name: &str) -> bool {
        self.rule(name).inline
    }

    fn entry(&mut self, name: &str) -> &mut TagRule {
        self.elements.entry(name.to_ascii_lowercase()).or_default()
    }
}

/// Lexical contexts of one language.
#[derive(Debug, Clone)]
pub struct ContextRuleTable {
    pub language: &'static str,
    pub quote_chars: Vec<char>,
    pub escape_char: Option<char>,
    pub line_comment_starts: Vec<String>,
    /// Line comments only start at the beginning of input or after whitespace.
    pub line_comment_boundary: bool,
    pub block_comment_delims: Vec<(String, String)>,
    /// Spans copied through untouched, delimiters included. Checked first.
    pub verbatim_spans: Vec<(String, String)>,
    pub regex_detection: Option<RegexDetector>,
    pub structural_tags: Option<StructuralTags>,
    pub dialect: Dialect,
    lookahead: usize,
}

impl ContextRuleTable {
    pub fn new(language: &'static str, dialect: Dialect) -> Self {
        Self {
            language,
            quote_chars: Vec::new(),
            escape_char: None,
            line_comment_starts: Vec::new(),
            line_comment_boundary: false,
            block_comment_delims: Vec::new(),
            verbatim_spans: Vec::new(),
            regex_detection: None,
            structural_tags: None,
            dialect,
            lookahead: 1,
        }
    }

    pub fn quotes(mut self, quotes: &[char]) -> Self {
        self.quote_chars.extend_from_slice(quotes);
        self
    }

    pub fn escape(mut self, escape: char) -> Self {
        self.escape_char = Some(escape);
        self
    }

    pub fn line_comment(mut self, start: &str) -> Self {
        debug_assert!(!self.starts_with_quote(start), "{start:?} starts with a quote");
        self.widen(start);
        self.line_comment_starts.push(start.to_string());
        self
    }

    pub fn comment_boundary(mut self) -> Self {
        self.line_comment_boundary = true;
        self
    }

    pub fn block_comment(mut self, start: &str, end: &str) -> Self {
        debug_assert!(!self.starts_with_quote(start), "{start:?} starts with a quote");
        self.widen(start);
        self.block_comment_delims
            .push((start.to_string(), end.to_string()));
        self
    }

    /// Verbatim spans are matched before quotes, so `start` may begin with a
    /// quote character (`"""`). It must then be longer than the quote alone.
    pub fn verbatim(mut self, start: &str, end: &str) -> Self {
        debug_assert!(
            !self.starts_with_quote(start) || start.chars().nth(1).is_some(),
            "{start:?} would hide every string"
        );
        self.widen(start);
        self.verbatim_spans.push((start.to_string(), end.to_string()));
        self
    }

    pub fn regex_literals(mut self, detector: RegexDetector) -> Self {
        self.regex_detection = Some(detector);
        self
    }

    pub fn tags(mut self, tags: StructuralTags) -> Self {
        self.structural_tags = Some(tags);
        self
    }

    /// Byte width of the longest opening token.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    pub fn is_markup(&self) -> bool {
        self.structural_tags.is_some()
    }

    /// Every token that switches the scanner out of normal text, in
    /// precedence order.
    pub fn openers(&self) -> impl Iterator<Item = &str> {
        self.verbatim_spans
            .iter()
            .map(|(start, _)| start.as_str())
            .chain(self.block_comment_delims.iter().map(|(start, _)| start.as_str()))
            .chain(self.line_comment_starts.iter().map(String::as_str))
    }

    fn widen(&mut self, token: &str) {
        self.lookahead = self.lookahead.max(token.len());
    }

    fn starts_with_quote(&self, token: &str) -> bool {
        token
            .chars()
            .next()
            .is_some_and(|c| self.quote_chars.contains(&c))
    }
}
