//! Whitespace collapse policy.
//!
//! The scanner never writes whitespace from normal text directly. It records
//! a pending [`Gap`] and, once the next significant character is known, asks
//! [`decide`] what the gap turns into.

use super::table::{ContextRuleTable, Dialect};

/// What a pending gap becomes in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Drop,
    EmitSingleSpace,
    EmitNewline { keep_indent: bool },
}

/// Everything the policy may look at for one gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gap<'a> {
    /// Last character already written.
    pub prev: Option<char>,
    /// First character about to be written.
    pub next: Option<char>,
    /// First non-whitespace character after `next`.
    pub after_next: Option<char>,
    /// False when the gap held only removed comments.
    pub whitespace: bool,
    pub newline: bool,
    pub in_tag: bool,
    /// Name of the tag that `prev` closed, if it closed one.
    pub prev_tag: Option<&'a str>,
    /// Name of the tag that `next` opens, if it opens one.
    pub next_tag: Option<&'a str>,
    /// Writing `prev` and `next` side by side would form a comment or
    /// verbatim opener or a tag start, or would escape an opening quote.
    pub creates_opener: bool,
}

const OPERATOR_PAIRS: [(char, char); 8] = [
    ('>', '='),
    ('<', '='),
    ('!', '='),
    ('=', '='),
    ('&', '&'),
    ('|', '|'),
    ('+', '+'),
    ('-', '-'),
];

pub fn decide(rules: &ContextRuleTable, gap: &Gap<'_>) -> Decision {
    let (Some(prev), Some(next)) = (gap.prev, gap.next) else {
        return Decision::Drop;
    };
    if prev.is_ascii_whitespace() {
        return Decision::Drop;
    }
    // A kept line break already separates the two sides.
    match collapse(rules, gap, prev, next) {
        Decision::Drop if gap.creates_opener => Decision::EmitSingleSpace,
        decision => decision,
    }
}

fn collapse(rules: &ContextRuleTable, gap: &Gap<'_>, prev: char, next: char) -> Decision {
    if !gap.whitespace {
        return match rules.dialect {
            Dialect::Markup { .. } => Decision::Drop,
            Dialect::Script { .. } if OPERATOR_PAIRS.contains(&(prev, next)) => {
                Decision::EmitSingleSpace
            }
            _ if fuses(prev, next) => Decision::EmitSingleSpace,
            _ => Decision::Drop,
        };
    }

    match rules.dialect {
        Dialect::Plain => Decision::EmitSingleSpace,
        Dialect::Compact => Decision::Drop,
        Dialect::Script { newline_sensitive } => script(gap, prev, next, newline_sensitive),
        Dialect::Markup { inline_spacing } => markup(rules, gap, prev, next, inline_spacing),
        Dialect::Indented => {
            if gap.newline {
                Decision::EmitNewline { keep_indent: true }
            } else if fuses(prev, next) {
                Decision::EmitSingleSpace
            } else {
                Decision::Drop
            }
        }
    }
}

fn script(gap: &Gap<'_>, prev: char, next: char, newline_sensitive: bool) -> Decision {
    // Automatic semicolon insertion depends on the line break.
    if newline_sensitive && gap.newline && ends_statement(prev) && starts_statement(next) {
        return Decision::EmitNewline { keep_indent: false };
    }
    if fuses(prev, next) || OPERATOR_PAIRS.contains(&(prev, next)) {
        return Decision::EmitSingleSpace;
    }
    Decision::Drop
}

fn markup(
    rules: &ContextRuleTable,
    gap: &Gap<'_>,
    prev: char,
    next: char,
    inline_spacing: bool,
) -> Decision {
    if gap.in_tag {
        let closes = next == '>' || (matches!(next, '/' | '?') && gap.after_next == Some('>'));
        if prev == '=' || next == '=' || closes {
            return Decision::Drop;
        }
        return Decision::EmitSingleSpace;
    }

    if !inline_spacing && prev == '>' && next == '<' {
        return Decision::Drop;
    }

    if let (Some(before), Some(after)) = (gap.prev_tag, gap.next_tag) {
        let inline = |name: &str| {
            rules
                .structural_tags
                .as_ref()
                .is_some_and(|tags| tags.is_inline(name))
        };
        if inline_spacing && inline(before) && inline(after) {
            return Decision::EmitSingleSpace;
        }
        return Decision::Drop;
    }

    Decision::EmitSingleSpace
}

/// Identifier-like characters that merge into one token when adjacent.
pub fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

fn fuses(prev: char, next: char) -> bool {
    (is_word(prev) && is_word(next)) || (prev.is_ascii_digit() && next == '.')
}

fn ends_statement(c: char) -> bool {
    is_word(c) || matches!(c, ')' | ']' | '}' | '"' | '\'' | '`' | '/' | '+' | '-')
}

fn starts_statement(c: char) -> bool {
    is_word(c)
        || matches!(
            c,
            '(' | '[' | '{' | '"' | '\'' | '`' | '/' | '+' | '-' | '!' | '~' | '@' | '#'
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::table::StructuralTags;

    fn gap(prev: char, next: char) -> Gap<'static> {
        Gap {
            prev: Some(prev),
            next: Some(next),
            whitespace: true,
            ..Gap::default()
        }
    }

    fn table(dialect: Dialect) -> ContextRuleTable {
        ContextRuleTable::new("test", dialect)
    }

    #[test]
    fn edges_are_dropped() {
        let rules = table(Dialect::Plain);
        let mut g = gap('a', 'b');
        g.prev = None;
        assert_eq!(decide(&rules, &g), Decision::Drop);
        let mut g = gap('a', 'b');
        g.next = None;
        assert_eq!(decide(&rules, &g), Decision::Drop);
    }

    #[test]
    fn already_collapsed_gap_is_dropped() {
        let rules = table(Dialect::Plain);
        assert_eq!(decide(&rules, &gap('\n', 'b')), Decision::Drop);
    }

    #[test]
    fn opener_guard_wins_over_dialect() {
        let rules = table(Dialect::Compact);
        let mut g = gap('/', '*');
        g.creates_opener = true;
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
    }

    #[test]
    fn comment_between_operators_keeps_them_apart() {
        let rules = table(Dialect::Script {
            newline_sensitive: true,
        });
        let mut g = gap('-', '-');
        g.whitespace = false;
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
        let mut g = gap('-', 'a');
        g.whitespace = false;
        assert_eq!(decide(&rules, &g), Decision::Drop);
    }

    #[test]
    fn opener_guard_keeps_a_line_break() {
        let rules = table(Dialect::Indented);
        let mut g = gap('\\', '"');
        g.newline = true;
        g.creates_opener = true;
        assert_eq!(decide(&rules, &g), Decision::EmitNewline { keep_indent: true });
    }

    #[test]
    fn script_keeps_token_separation() {
        let rules = table(Dialect::Script {
            newline_sensitive: true,
        });
        assert_eq!(decide(&rules, &gap('n', 'x')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('$', '_')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('1', '.')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('+', '+')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('-', '-')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('=', '=')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('a', '=')), Decision::Drop);
        assert_eq!(decide(&rules, &gap(')', '{')), Decision::Drop);
        assert_eq!(decide(&rules, &gap('+', 'b')), Decision::Drop);
    }

    #[test]
    fn script_keeps_statement_breaks() {
        let rules = table(Dialect::Script {
            newline_sensitive: true,
        });
        let mut g = gap(')', 'b');
        g.newline = true;
        assert_eq!(
            decide(&rules, &g),
            Decision::EmitNewline { keep_indent: false }
        );
        let mut g = gap(';', 'b');
        g.newline = true;
        assert_eq!(decide(&rules, &g), Decision::Drop);

        let php = table(Dialect::Script {
            newline_sensitive: false,
        });
        let mut g = gap(')', 'b');
        g.newline = true;
        assert_eq!(decide(&php, &g), Decision::Drop);
    }

    #[test]
    fn comment_only_gaps_separate_words_outside_markup() {
        let rules = table(Dialect::Plain);
        let mut g = gap('a', 'b');
        g.whitespace = false;
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
        let mut g = gap('a', ';');
        g.whitespace = false;
        assert_eq!(decide(&rules, &g), Decision::Drop);

        let markup = table(Dialect::Markup {
            inline_spacing: true,
        });
        let mut g = gap('a', 'b');
        g.whitespace = false;
        assert_eq!(decide(&markup, &g), Decision::Drop);
    }

    #[test]
    fn markup_tag_interior() {
        let rules = table(Dialect::Markup {
            inline_spacing: false,
        });
        let mut g = gap('a', 'h');
        g.in_tag = true;
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
        g.next = Some('=');
        assert_eq!(decide(&rules, &g), Decision::Drop);
        g.prev = Some('=');
        g.next = Some('"');
        assert_eq!(decide(&rules, &g), Decision::Drop);
        g.prev = Some('"');
        g.next = Some('/');
        g.after_next = Some('>');
        assert_eq!(decide(&rules, &g), Decision::Drop);
        g.next = Some('>');
        assert_eq!(decide(&rules, &g), Decision::Drop);
    }

    #[test]
    fn markup_inline_neighbours_keep_a_space() {
        let rules = table(Dialect::Markup {
            inline_spacing: true,
        })
        .tags(StructuralTags::new().inline(["b", "i"]));
        let mut g = gap('>', '<');
        g.prev_tag = Some("b");
        g.next_tag = Some("i");
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
        g.next_tag = Some("div");
        assert_eq!(decide(&rules, &g), Decision::Drop);
        g.prev_tag = None;
        assert_eq!(decide(&rules, &g), Decision::EmitSingleSpace);
    }

    #[test]
    fn markup_without_inline_spacing_drops_between_constructs() {
        let rules = table(Dialect::Markup {
            inline_spacing: false,
        });
        assert_eq!(decide(&rules, &gap('>', '<')), Decision::Drop);
        assert_eq!(decide(&rules, &gap('>', 'x')), Decision::EmitSingleSpace);
        assert_eq!(decide(&rules, &gap('x', '<')), Decision::EmitSingleSpace);
    }

    #[test]
    fn indented_keeps_lines() {
        let rules = table(Dialect::Indented);
        let mut g = gap(':', 'r');
        g.newline = true;
        assert_eq!(
            decide(&rules, &g),
            Decision::EmitNewline { keep_indent: true }
        );
        assert_eq!(decide(&rules, &gap('=', '1')), Decision::Drop);
        assert_eq!(decide(&rules, &gap('f', 'x')), Decision::EmitSingleSpace);
    }
}
