//! Context-aware lexical scanner shared by every minifier.
//!
//! One pass over the input, one character (or one recognised token) at a
//! time. The active [`Mode`] decides whether the text is copied, dropped or
//! handed to the whitespace policy. Languages differ only in the
//! [`ContextRuleTable`] they pass in.
//!
//! Tracks ASCII delimiters only. UTF-8 content is copied untouched since
//! multi-byte sequences never contain ASCII delimiter bytes.

mod policy;
mod table;
mod tags;

use std::fmt;
use std::ops::Range;

pub use policy::{decide, is_word, Decision, Gap};
pub use table::{ContextRuleTable, Dialect, EmbedFn, RegexDetector, StructuralTags, TagRule};
pub use tags::{read_tag_head, TagHead};

/// Lexical context the scanner is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'r> {
    Normal,
    InString(char),
    InLineComment,
    /// Carries the terminator to look for.
    InBlockComment(&'r str),
    InRegex { in_class: bool },
    InVerbatim(&'r str),
    InPreserveElement,
}

/// Kind of literal or comment left open at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    String(char),
    BlockComment,
    Regex,
    Verbatim,
    Element,
    Tag,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::String(q) => write!(f, "string literal ({q})"),
            ContextKind::BlockComment => write!(f, "block comment"),
            ContextKind::Regex => write!(f, "regex literal"),
            ContextKind::Verbatim => write!(f, "verbatim section"),
            ContextKind::Element => write!(f, "element"),
            ContextKind::Tag => write!(f, "tag"),
        }
    }
}

/// A context still open when the input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unclosed {
    pub kind: ContextKind,
    /// Byte offset in the source where the context started.
    pub offset: usize,
}

/// Scanner output plus the literal ranges it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scanned {
    pub text: String,
    /// Byte ranges of `text` that were copied from literals. Sorted and
    /// disjoint.
    pub literals: Vec<Range<usize>>,
    pub unclosed: Option<Unclosed>,
}

impl Scanned {
    /// Applies `f` to every stretch of `text` outside the literal ranges.
    pub fn rewrite_code<F>(&self, mut f: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        let mut out = String::with_capacity(self.text.len());
        let mut pos = 0;
        for range in &self.literals {
            out.push_str(&f(&self.text[pos..range.start]));
            out.push_str(&self.text[range.clone()]);
            pos = range.end;
        }
        out.push_str(&f(&self.text[pos..]));
        out
    }

    /// `text` with literal contents blanked out. Line breaks survive so line
    /// numbers still match.
    pub fn masked(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut pos = 0;
        for range in &self.literals {
            out.push_str(&self.text[pos..range.start]);
            out.extend(self.text[range.clone()].chars().map(|c| match c {
                '\n' | '\r' => c,
                _ => ' ',
            }));
            pos = range.end;
        }
        out.push_str(&self.text[pos..]);
        out
    }
}

/// Mutable state of one scan.
#[derive(Debug)]
pub struct ScanState<'r> {
    pub mode: Mode<'r>,
    /// Open whitespace-preserving elements, innermost last.
    pub preserve_stack: Vec<String>,
    pub cursor: usize,
    pub last_emitted: Option<char>,
    pending: Option<Pending>,
    tag: Option<OpenTag>,
    last_tag: Option<String>,
    context_start: usize,
}

impl ScanState<'_> {
    fn new() -> Self {
        Self {
            mode: Mode::Normal,
            preserve_stack: Vec::new(),
            cursor: 0,
            last_emitted: None,
            pending: None,
            tag: None,
            last_tag: None,
            context_start: 0,
        }
    }
}

/// Whitespace and removed comments since the last emitted character. An
/// empty `raw` means only comments were removed.
#[derive(Debug, Default)]
struct Pending {
    raw: String,
}

impl Pending {
    fn whitespace(&self) -> bool {
        !self.raw.is_empty()
    }

    fn newline(&self) -> bool {
        self.raw.contains(['\n', '\r'])
    }

    fn indent(&self) -> &str {
        match self.raw.rfind(['\n', '\r']) {
            Some(idx) => &self.raw[idx + 1..],
            None => "",
        }
    }
}

#[derive(Debug)]
struct OpenTag {
    name: String,
    closing: bool,
    attrs_start: usize,
    start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    /// Gaps go through the whitespace policy; embedded bodies are minified.
    Minify,
    /// Comments are removed, whitespace is copied.
    StripComments,
    /// Like `StripComments`, but removed comments keep their line breaks.
    Layout,
}

/// Minifies `source` according to `rules`. Never fails.
pub fn scan(source: &str, rules: &ContextRuleTable) -> String {
    scan_with_spans(source, rules).text
}

pub fn scan_with_spans(source: &str, rules: &ContextRuleTable) -> Scanned {
    Scanner::new(source, rules, Output::Minify).run()
}

/// Removes comments and leaves all other text, whitespace included, alone.
pub fn strip_comments(source: &str, rules: &ContextRuleTable) -> String {
    Scanner::new(source, rules, Output::StripComments).run().text
}

/// Comment-free text whose line numbers match `source`. Used by validators.
pub fn scan_layout(source: &str, rules: &ContextRuleTable) -> Scanned {
    Scanner::new(source, rules, Output::Layout).run()
}

struct Scanner<'s, 'r> {
    source: &'s str,
    rules: &'r ContextRuleTable,
    output: Output,
    state: ScanState<'r>,
    out: String,
    literals: Vec<Range<usize>>,
    literal_start: Option<usize>,
    dangling: Option<Unclosed>,
}

impl<'s, 'r> Scanner<'s, 'r> {
    fn new(source: &'s str, rules: &'r ContextRuleTable, output: Output) -> Self {
        Self {
            source,
            rules,
            output,
            state: ScanState::new(),
            out: String::with_capacity(source.len()),
            literals: Vec::new(),
            literal_start: None,
            dangling: None,
        }
    }

    fn run(mut self) -> Scanned {
        while self.state.cursor < self.source.len() {
            match self.state.mode {
                Mode::Normal => self.normal(),
                Mode::InString(quote) => self.string(quote),
                Mode::InLineComment => self.line_comment(),
                Mode::InBlockComment(end) => self.block_comment(end),
                Mode::InRegex { in_class } => self.regex(in_class),
                Mode::InVerbatim(end) => self.verbatim(end),
                Mode::InPreserveElement => self.preserve(),
            }
        }
        self.finish()
    }

    fn rest(&self) -> &'s str {
        &self.source[self.state.cursor..]
    }

    /// The next `lookahead` bytes, widened to a char boundary.
    fn window(&self) -> &'s str {
        let rest = self.rest();
        let mut end = self.rules.lookahead().min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        &rest[..end]
    }

    fn advance(&mut self, bytes: usize) {
        self.state.cursor += bytes;
    }

    fn enter(&mut self, mode: Mode<'r>, start: usize) {
        self.state.mode = mode;
        self.state.context_start = start;
    }

    fn emit(&mut self, c: char) {
        self.out.push(c);
        self.state.last_emitted = Some(c);
        self.state.last_tag = None;
    }

    fn emit_str(&mut self, s: &str) {
        if let Some(last) = s.chars().next_back() {
            self.out.push_str(s);
            self.state.last_emitted = Some(last);
            self.state.last_tag = None;
        }
    }

    fn open_literal(&mut self) {
        self.literal_start = Some(self.out.len());
    }

    fn close_literal(&mut self) {
        if let Some(start) = self.literal_start.take() {
            if start < self.out.len() {
                self.literals.push(start..self.out.len());
            }
        }
    }

    fn markup(&self) -> Option<&'r StructuralTags> {
        self.rules.structural_tags.as_ref()
    }

    fn normal(&mut self) {
        let rules = self.rules;
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return;
        };
        let start = self.state.cursor;

        if c.is_ascii_whitespace() {
            self.state.pending.get_or_insert_with(Pending::default).raw.push(c);
            self.advance(1);
            return;
        }

        if self.state.tag.is_some() {
            self.tag_interior(c);
            return;
        }

        let window = self.window();
        if let Some((open, close)) = find_pair(&rules.verbatim_spans, window) {
            self.flush_pending();
            self.open_literal();
            self.emit_str(open);
            self.advance(open.len());
            self.enter(Mode::InVerbatim(close), start);
            return;
        }

        if self.quote_opens(c) {
            self.flush_pending();
            self.open_literal();
            self.emit(c);
            self.advance(c.len_utf8());
            self.enter(Mode::InString(c), start);
            return;
        }

        if let Some((open, close)) = find_pair(&rules.block_comment_delims, window) {
            self.state.pending.get_or_insert_with(Pending::default);
            self.advance(open.len());
            self.enter(Mode::InBlockComment(close), start);
            return;
        }

        if let Some(open) = rules
            .line_comment_starts
            .iter()
            .find(|token| window.starts_with(token.as_str()))
        {
            if self.at_comment_boundary() {
                self.state.pending.get_or_insert_with(Pending::default);
                self.advance(open.len());
                self.enter(Mode::InLineComment, start);
                return;
            }
        }

        if c == '/' && rules.regex_detection.is_some_and(|detect| detect(&self.out)) {
            self.flush_pending();
            self.open_literal();
            self.emit(c);
            self.advance(1);
            self.enter(Mode::InRegex { in_class: false }, start);
            return;
        }

        if c == '<' && self.markup().is_some() {
            if let Some(head) = read_tag_head(rest) {
                self.open_tag(head);
                return;
            }
        }

        self.flush_pending();
        self.emit(c);
        self.advance(c.len_utf8());
    }

    fn quote_opens(&self, c: char) -> bool {
        if self.markup().is_some() || !self.rules.quote_chars.contains(&c) {
            return false;
        }
        let escaped = self.state.pending.is_none()
            && self.rules.escape_char.is_some()
            && self.state.last_emitted == self.rules.escape_char;
        !escaped
    }

    fn at_comment_boundary(&self) -> bool {
        !self.rules.line_comment_boundary
            || self.state.pending.is_some()
            || self
                .state
                .last_emitted
                .map_or(true, |c| c.is_ascii_whitespace())
    }

    fn tag_interior(&mut self, c: char) {
        let start = self.state.cursor;
        self.flush_pending();
        if self.rules.quote_chars.contains(&c) {
            self.open_literal();
            self.emit(c);
            self.advance(c.len_utf8());
            self.enter(Mode::InString(c), start);
            return;
        }
        self.emit(c);
        self.advance(c.len_utf8());
        if c == '>' {
            self.close_tag();
        }
    }

    fn open_tag(&mut self, head: TagHead) {
        self.flush_pending();
        let source = self.source;
        let start = self.state.cursor;
        self.emit_str(&source[start..start + head.len]);
        self.advance(head.len);
        self.state.context_start = start;
        self.state.tag = Some(OpenTag {
            name: head.name,
            closing: head.closing,
            attrs_start: self.state.cursor,
            start,
        });
    }

    /// Called right after a tag's `>` was emitted.
    fn close_tag(&mut self) {
        let Some(tag) = self.state.tag.take() else {
            return;
        };
        let Some(structural) = self.markup() else {
            return;
        };
        let gt = self.state.cursor - 1;
        let self_closing = self.out.ends_with("/>");
        self.state.last_tag = Some(tag.name.clone());
        if tag.closing || self_closing {
            return;
        }

        let rule = structural.rule(&tag.name);
        if rule.raw_text {
            let source = self.source;
            self.consume_raw_text(structural, &tag, &source[tag.attrs_start..gt]);
        } else if rule.preserve_whitespace {
            self.state.preserve_stack.push(tag.name);
            self.open_literal();
            self.enter(Mode::InPreserveElement, tag.start);
        }
    }

    /// Copies (or minifies) the body of `<script>`-like elements up to their
    /// closing tag, which is then scanned as a normal tag.
    fn consume_raw_text(&mut self, structural: &StructuralTags, tag: &OpenTag, attrs: &str) {
        let body_start = self.state.cursor;
        let body_end = match tags::find_closing_tag(self.source, body_start, &tag.name) {
            Some(at) => at,
            None => {
                self.dangling = Some(Unclosed {
                    kind: ContextKind::Element,
                    offset: tag.start,
                });
                self.source.len()
            }
        };
        let source = self.source;
        let body = &source[body_start..body_end];
        let embedded = match (self.output, structural.embed) {
            (Output::Minify, Some(embed)) => embed(&tag.name, attrs, body),
            _ => None,
        };

        self.open_literal();
        match embedded {
            Some(text) => self.emit_str(&text),
            None => self.emit_str(body),
        }
        self.close_literal();
        self.state.cursor = body_end;
    }

    fn string(&mut self, quote: char) {
        let rest = self.rest();
        let mut end = rest.len();
        let mut closed = false;
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if Some(c) == self.rules.escape_char {
                chars.next();
            } else if c == quote {
                end = i + c.len_utf8();
                closed = true;
                break;
            }
        }

        self.emit_str(&rest[..end]);
        self.advance(end);
        if closed {
            self.close_literal();
            self.state.mode = Mode::Normal;
        }
    }

    fn line_comment(&mut self) {
        let rest = self.rest();
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        self.advance(end);
        self.state.mode = Mode::Normal;
    }

    fn block_comment(&mut self, close: &'r str) {
        let rest = self.rest();
        let (end, closed) = match rest.find(close) {
            Some(idx) => (idx + close.len(), true),
            None => (rest.len(), false),
        };
        if self.output == Output::Layout {
            let breaks = rest[..end].chars().filter(|c| matches!(c, '\n' | '\r'));
            self.state
                .pending
                .get_or_insert_with(Pending::default)
                .raw
                .extend(breaks);
        }
        self.advance(end);
        if closed {
            self.state.mode = Mode::Normal;
        }
    }

    fn regex(&mut self, mut in_class: bool) {
        let rest = self.rest();
        let escape = self.rules.escape_char.unwrap_or('\\');
        let mut end = None;
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                _ if c == escape => {
                    chars.next();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    end = Some(i + 1);
                    break;
                }
                _ => {}
            }
        }

        match end {
            Some(end) => {
                self.emit_str(&rest[..end]);
                self.advance(end);
                self.close_literal();
                self.state.mode = Mode::Normal;
            }
            None => {
                self.emit_str(rest);
                self.advance(rest.len());
                self.state.mode = Mode::InRegex { in_class };
            }
        }
    }

    fn verbatim(&mut self, close: &'r str) {
        let rest = self.rest();
        match rest.find(close) {
            Some(idx) => {
                let end = idx + close.len();
                self.emit_str(&rest[..end]);
                self.advance(end);
                self.close_literal();
                self.state.mode = Mode::Normal;
            }
            None => {
                self.emit_str(rest);
                self.advance(rest.len());
            }
        }
    }

    fn preserve(&mut self) {
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return;
        };

        if c == '<' {
            if let (Some(head), Some(structural)) = (read_tag_head(rest), self.markup()) {
                let closes_top = head.closing && self.state.preserve_stack.last() == Some(&head.name);
                if closes_top {
                    self.state.preserve_stack.pop();
                    if self.state.preserve_stack.is_empty() {
                        self.close_literal();
                        self.state.mode = Mode::Normal;
                        self.open_tag(head);
                        return;
                    }
                } else if !head.closing
                    && structural.rule(&head.name).preserve_whitespace
                    && !tags::is_self_closing(rest)
                {
                    self.state.preserve_stack.push(head.name.clone());
                }
                self.emit_str(&rest[..head.len]);
                self.advance(head.len);
                return;
            }
        }

        self.emit(c);
        self.advance(c.len_utf8());
    }

    fn flush_pending(&mut self) {
        let Some(pending) = self.state.pending.take() else {
            return;
        };
        if self.output != Output::Minify && pending.whitespace() {
            self.emit_str(&pending.raw);
            return;
        }

        let rest = self.rest();
        let mut chars = rest.chars();
        let next = chars.next();
        let after_next = chars.find(|c| !c.is_ascii_whitespace());
        let next_tag = match (self.markup(), self.state.tag.is_some(), next) {
            (Some(_), false, Some('<')) => read_tag_head(rest).map(|head| head.name),
            _ => None,
        };
        let gap = Gap {
            prev: self.state.last_emitted,
            next,
            after_next,
            whitespace: pending.whitespace(),
            newline: pending.newline(),
            in_tag: self.state.tag.is_some(),
            prev_tag: self.state.last_tag.as_deref(),
            next_tag: next_tag.as_deref(),
            creates_opener: self.creates_opener(rest),
        };

        match decide(self.rules, &gap) {
            Decision::Drop => {}
            Decision::EmitSingleSpace => self.emit(' '),
            Decision::EmitNewline { keep_indent } => {
                self.emit('\n');
                if keep_indent {
                    self.emit_str(pending.indent());
                }
            }
        }
    }

    /// True when writing `rest` right after the output would form an opening
    /// token that was not in the source, or would put an escape character
    /// in front of a quote that opened a string.
    fn creates_opener(&self, rest: &str) -> bool {
        let out = self.out.as_str();
        if let (Some(escape), Some(next)) = (self.rules.escape_char, rest.chars().next()) {
            if out.ends_with(escape) && self.rules.quote_chars.contains(&next) {
                return true;
            }
        }
        let joins = |token: &str| {
            (1..token.len()).any(|split| {
                token.is_char_boundary(split)
                    && out.ends_with(&token[..split])
                    && rest.starts_with(&token[split..])
            })
        };
        if self.rules.openers().any(joins) {
            return true;
        }
        self.markup().is_some()
            && out.ends_with('<')
            && rest.chars().next().is_some_and(tags::starts_tag)
    }

    fn finish(mut self) -> Scanned {
        if self.output != Output::Minify {
            self.flush_pending();
        }
        self.close_literal();

        let start = self.state.context_start;
        let kind = match self.state.mode {
            Mode::Normal if self.state.tag.is_some() => Some(ContextKind::Tag),
            Mode::Normal => None,
            Mode::InString(quote) => Some(ContextKind::String(quote)),
            Mode::InLineComment => None,
            Mode::InBlockComment(_) => Some(ContextKind::BlockComment),
            Mode::InRegex { .. } => Some(ContextKind::Regex),
            Mode::InVerbatim(_) => Some(ContextKind::Verbatim),
            Mode::InPreserveElement => Some(ContextKind::Element),
        };
        let unclosed = kind
            .map(|kind| Unclosed {
                kind,
                offset: start,
            })
            .or(self.dangling);

        if let Some(open) = unclosed {
            tracing::trace!(
                language = self.rules.language,
                offset = open.offset,
                "input ended inside {}",
                open.kind
            );
        }

        Scanned {
            text: self.out,
            literals: self.literals,
            unclosed,
        }
    }
}

fn find_pair<'r>(pairs: &'r [(String, String)], window: &str) -> Option<(&'r str, &'r str)> {
    pairs
        .iter()
        .find(|(open, _)| window.starts_with(open.as_str()))
        .map(|(open, close)| (open.as_str(), close.as_str()))
}

/// Pre-compute line offsets for O(log n) line number lookup.
pub fn build_line_offsets(content: &str) -> Vec<usize> {
    content
        .char_indices()
        .filter_map(|(i, c)| if c == '\n' { Some(i) } else { None })
        .collect()
}

/// Convert byte offset to 1-based line number using binary search.
/// Offsets pointing to newline characters belong to the line ending at that position.
pub fn offset_to_line(offsets: &[usize], offset: usize) -> usize {
    match offsets.binary_search(&offset) {
        Ok(idx) | Err(idx) => idx + 1,
    }
}
