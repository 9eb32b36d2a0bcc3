//! Markup tag recognition used by the scanner.

/// The `<name` or `</name` prefix of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHead {
    /// Lowercased element name. Declarations and processing instructions
    /// keep their sigil (`!doctype`, `?xml`).
    pub name: String,
    pub closing: bool,
    /// Byte length of the prefix, `<` included.
    pub len: usize,
}

/// Reads a tag head at the start of `rest`. A `<` that is not followed by a
/// tag name is plain text and yields `None`.
pub fn read_tag_head(rest: &str) -> Option<TagHead> {
    let bytes = rest.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }

    let closing = bytes.get(1) == Some(&b'/');
    let start = if closing { 2 } else { 1 };
    let mut i = start;
    if !closing && matches!(bytes.get(i), Some(b'!' | b'?')) {
        i += 1;
    }
    if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    while let Some(b) = bytes.get(i) {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') {
            i += 1;
        } else {
            break;
        }
    }

    Some(TagHead {
        name: rest[start..i].to_ascii_lowercase(),
        closing,
        len: i,
    })
}

/// Byte offset of the `</name` that closes a raw-text element, searching
/// `source` from `from`.
pub fn find_closing_tag(source: &str, from: usize, name: &str) -> Option<usize> {
    let haystack = &source[from..];
    let mut search = 0;
    while let Some(idx) = haystack[search..].find("</") {
        let at = search + idx;
        if let Some(head) = read_tag_head(&haystack[at..]) {
            if head.name == name {
                return Some(from + at);
            }
        }
        search = at + 2;
    }
    None
}

/// True when the tag starting at `rest` ends with `/>`.
pub fn is_self_closing(rest: &str) -> bool {
    rest.find('>')
        .is_some_and(|end| rest[..end].trim_end().ends_with('/'))
}

/// True when `c` can follow `<` to begin a tag.
pub fn starts_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_opening_and_closing_heads() {
        let head = read_tag_head("<PRE class=x>").unwrap();
        assert_eq!(head.name, "pre");
        assert!(!head.closing);
        assert_eq!(head.len, 4);

        let head = read_tag_head("</code>").unwrap();
        assert_eq!(head.name, "code");
        assert!(head.closing);
        assert_eq!(head.len, 6);
    }

    #[test]
    fn reads_declarations_and_namespaced_names() {
        assert_eq!(read_tag_head("<!DOCTYPE html>").unwrap().name, "!doctype");
        assert_eq!(read_tag_head("<?xml version").unwrap().name, "?xml");
        assert_eq!(read_tag_head("<svg:rect/>").unwrap().name, "svg:rect");
    }

    #[test]
    fn rejects_text_angle_brackets() {
        assert!(read_tag_head("< b").is_none());
        assert!(read_tag_head("<3").is_none());
        assert!(read_tag_head("<![CDATA[").is_none());
        assert!(read_tag_head("x<b>").is_none());
    }

    #[test]
    fn finds_closing_tag_case_insensitively() {
        let source = "<script>if (a</b) {}</SCRIPT>";
        let at = find_closing_tag(source, 8, "script").unwrap();
        assert_eq!(&source[at..], "</SCRIPT>");
        assert!(find_closing_tag(source, 8, "style").is_none());
    }

    #[test]
    fn detects_self_closing_tags() {
        assert!(is_self_closing("<code/>rest"));
        assert!(!is_self_closing("<code>a/>"));
        assert!(!is_self_closing("<code"));
    }
}
