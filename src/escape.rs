//! Quoting rules for every format the engine speaks.
//!
//! All functions are pure string transforms. The PO pair is shared by Apple
//! `.strings`, Ren'Py and Godot, which use the same backslash conventions.

use std::borrow::Cow;

/// Escapes `\`, `"`, newline and tab with backslash sequences.
pub fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_po`]. Unknown sequences are kept verbatim.
///
/// Single pass, so `\\n` decodes to a backslash followed by `n`.
pub fn unescape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encodes the five predefined XML entities.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Decodes predefined and numeric XML entities. Malformed references are left
/// as they are rather than rejected.
pub fn unescape_xml(s: &str) -> Cow<'_, str> {
    match quick_xml::escape::unescape(s) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("keeping undecodable XML text as-is: {}", e);
            Cow::Borrowed(s)
        }
    }
}

/// Java `.properties` escaping. Separators are escaped in keys and values alike.
pub fn escape_properties(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '=' => out.push_str("\\="),
            ':' => out.push_str("\\:"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_properties`], also decoding `\uXXXX`.
pub fn unescape_properties(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            // `\=`, `\:`, `\\`, `\#`, `\!` and `\ ` all stand for the character itself.
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Removes `//` line comments and `/* */` block comments outside string
/// literals, keeping line breaks so error positions stay meaningful.
pub fn strip_json_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (ch, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_po_escape_round_trip() {
        let original = "Say \"hi\"\n\tto C:\\temp";
        let escaped = escape_po(original);
        assert_eq!(escaped, "Say \\\"hi\\\"\\n\\tto C:\\\\temp");
        assert_eq!(unescape_po(&escaped), original);
    }

    #[test]
    fn test_po_unescape_does_not_double_decode() {
        assert_eq!(unescape_po("a\\\\nb"), "a\\nb");
        assert_eq!(unescape_po("trailing\\"), "trailing\\");
        assert_eq!(unescape_po("\\x41"), "\\x41");
    }

    #[test]
    fn test_xml_entities() {
        assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
        assert_eq!(unescape_xml("&quot;x&quot; &#65;"), "\"x\" A");
        assert_eq!(unescape_xml("broken &nope"), "broken &nope");
    }

    #[test]
    fn test_properties_escaping() {
        assert_eq!(escape_properties("a=b:c\n"), "a\\=b\\:c\\n");
        assert_eq!(unescape_properties("a\\=b\\:c\\n\\\\"), "a=b:c\n\\");
        assert_eq!(unescape_properties("caf\\u00e9"), "café");
    }

    #[test]
    fn test_strip_json_comments_keeps_strings() {
        let input = "{\n  // note\n  \"url\": \"http://x/*y*/\", /* gone */ \"a\": 1\n}";
        let stripped = strip_json_comments(input);
        assert!(stripped.contains("\"http://x/*y*/\""));
        assert!(!stripped.contains("note"));
        assert!(!stripped.contains("gone"));
        let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["a"], 1);
    }
}
