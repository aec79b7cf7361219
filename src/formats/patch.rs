//! Write-back for the heuristic dialects.
//!
//! Dialect parsers record where each value came from: a byte `offset` plus the
//! exact `literal` text found there (text formats), or a JSON `pointer`. The
//! serializers use these anchors to patch only the overridden values in the
//! retained raw content, leaving every other byte untouched.

use serde_json::Value;

use crate::{
    error::Error,
    types::{Entry, Translations},
};

pub(crate) const OFFSET: &str = "offset";
pub(crate) const LITERAL: &str = "literal";
pub(crate) const POINTER: &str = "pointer";
pub(crate) const RULE: &str = "rule";

/// Tags `entry` with a text anchor and the sub-rule that produced it.
pub(crate) fn text_anchor(
    entry: Entry,
    rule: &str,
    content: &str,
    offset: usize,
    literal: &str,
) -> Entry {
    let line = content[..offset].matches('\n').count() + 1;
    entry
        .with_meta(RULE, rule)
        .with_meta("line", line)
        .with_meta(OFFSET, offset)
        .with_meta(LITERAL, literal)
}

/// Tags `entry` with a JSON pointer anchor.
pub(crate) fn pointer_anchor(entry: Entry, rule: &str, pointer: &str) -> Entry {
    entry.with_meta(RULE, rule).with_meta(POINTER, pointer)
}

/// Replaces the recorded literal of every overridden entry with the encoded
/// override. Anchors that no longer match the raw text are skipped, and
/// overlapping anchors are applied once.
pub(crate) fn splice_literals(
    raw: &str,
    entries: &[Entry],
    translations: &Translations,
    encode: impl Fn(&Entry, &str) -> String,
) -> String {
    let mut edits = entries
        .iter()
        .filter_map(|entry| {
            let text = translations.get(&entry.key)?;
            let offset = entry.meta(OFFSET)?.parse::<usize>().ok()?;
            let literal = entry.meta(LITERAL)?;
            Some((offset, literal, text, entry))
        })
        .collect::<Vec<_>>();
    edits.sort_by_key(|(offset, _, _, _)| *offset);

    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    for (offset, literal, text, entry) in edits {
        if offset < cursor || raw.get(offset..offset + literal.len()) != Some(literal) {
            tracing::debug!("skipping stale write-back anchor at byte {}", offset);
            continue;
        }
        out.push_str(&raw[cursor..offset]);
        out.push_str(&encode(entry, text));
        cursor = offset + literal.len();
    }
    out.push_str(&raw[cursor..]);
    out
}

/// Sets each overridden entry's JSON pointer to its override and re-renders
/// the document, compact or pretty to match the raw input.
pub(crate) fn patch_json(
    raw: &str,
    entries: &[Entry],
    translations: &Translations,
) -> Result<String, Error> {
    let mut document: Value = serde_json::from_str(raw)?;
    for entry in entries {
        let (Some(pointer), Some(text)) = (entry.meta(POINTER), translations.get(&entry.key))
        else {
            continue;
        };
        match document.pointer_mut(pointer) {
            Some(slot) if slot.is_string() => *slot = Value::from(text.as_str()),
            _ => tracing::debug!("JSON pointer {} no longer names a string", pointer),
        }
    }

    let pretty = raw.trim().contains('\n');
    let mut out = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    if raw.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Escapes one JSON pointer reference token.
pub(crate) fn pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> Translations {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_splice_only_overridden_literals() {
        let raw = "a = \"One\"\nb = \"Two\"\n";
        let entries = vec![
            text_anchor(Entry::new("a", "One"), "property", raw, 5, "One"),
            text_anchor(Entry::new("b", "Two"), "property", raw, 15, "Two"),
        ];
        let out = splice_literals(raw, &entries, &overrides(&[("b", "Due \"x\"")]), |_, s| {
            s.replace('"', "\\\"")
        });
        assert_eq!(out, "a = \"One\"\nb = \"Due \\\"x\\\"\"\n");
        assert_eq!(entries[1].line(), Some(2));
    }

    #[test]
    fn test_splice_skips_stale_and_overlapping_anchors() {
        let raw = "text = \"Hi\"";
        let entries = vec![
            text_anchor(Entry::new("first", "Hi"), "property", raw, 8, "Hi"),
            text_anchor(Entry::new("second", "Hi"), "inline_text", raw, 8, "Hi"),
            text_anchor(Entry::new("stale", "Gone"), "property", raw, 0, "Gone"),
        ];
        let translations = overrides(&[("first", "Ciao"), ("second", "Salve"), ("stale", "X")]);
        let out = splice_literals(raw, &entries, &translations, |_, s| s.to_string());
        assert_eq!(out, "text = \"Ciao\"");
    }

    #[test]
    fn test_patch_json_keeps_layout_style() {
        let raw = r#"[null,{"id":1,"name":"Harold","note":""}]"#;
        let entries = vec![pointer_anchor(Entry::new("1.name", "Harold"), "database_field", "/1/name")];
        let out = patch_json(raw, &entries, &overrides(&[("1.name", "Aroldo")])).unwrap();
        assert_eq!(out, r#"[null,{"id":1,"name":"Aroldo","note":""}]"#);
    }

    #[test]
    fn test_pointer_token_escaping() {
        assert_eq!(pointer_token("a/b~c"), "a~1b~0c");
    }
}
