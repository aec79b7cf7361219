//! Support for Unity text: serialized `m_Text` fields in `.asset`/`.prefab`
//! YAML and XUnity.AutoTranslator `original=translation` dumps.
//!
//! Rules run in [`Rule::ORDER`]; the first one that yields entries decides how
//! the whole file is read.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::{
        FormatType,
        patch::{self, RULE},
    },
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

lazy_static! {
    static ref SERIALIZED_TEXT: Regex =
        Regex::new(r"(?m)^[ \t-]*(m_[Tt]ext):[ \t]*").unwrap();
}

const QUOTE: &str = "quote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `m_Text:` fields of serialized UI components.
    SerializedText,
    /// XUnity.AutoTranslator `original=translation` lines.
    AutoTranslator,
}

impl Rule {
    pub const ORDER: [Rule; 2] = [Rule::SerializedText, Rule::AutoTranslator];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::SerializedText => "serialized_text",
            Rule::AutoTranslator => "auto_translator",
        }
    }

    fn apply(&self, content: &str, entries: &mut EntryList) {
        match self {
            Rule::SerializedText => serialized_text(content, entries),
            Rule::AutoTranslator => auto_translator(content, entries),
        }
    }
}

/// Finds the extent of the scalar starting at `start`, returning its style and
/// the byte range of its text without quotes. Quoted scalars may span several
/// lines; plain ones continue on lines indented past `column`.
fn scalar_span(content: &str, start: usize, column: usize) -> Option<(&'static str, usize, usize)> {
    let rest = &content[start..];
    let bytes = rest.as_bytes();
    match bytes.first() {
        Some(b'"') => {
            let mut escaped = false;
            for (i, &b) in bytes.iter().enumerate().skip(1) {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => return Some(("double", start + 1, start + i)),
                    _ => {}
                }
            }
            None
        }
        Some(b'\'') => {
            let mut i = 1;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    return Some(("single", start + 1, start + i));
                }
                i += 1;
            }
            None
        }
        _ => {
            let first = rest.split('\n').next().unwrap_or_default();
            let mut end = start + first.trim_end().len();
            let mut cursor = start + first.len() + 1;
            while cursor < content.len() {
                let line = content[cursor..].split('\n').next().unwrap_or_default();
                let body = line.trim_end();
                if !body.is_empty() {
                    let indent = body.len() - body.trim_start_matches(' ').len();
                    if indent <= column || body.trim_start().starts_with('#') {
                        break;
                    }
                    end = cursor + body.len();
                }
                cursor += line.len() + 1;
            }
            Some(("plain", start, end))
        }
    }
}

/// Folds a multi-line scalar: single breaks become spaces, blank lines become
/// newlines, and an escaped break in a double-quoted scalar joins directly.
fn fold_lines(literal: &str, quote: &str) -> String {
    let lines = literal.split('\n').collect::<Vec<_>>();
    if lines.len() == 1 {
        return literal.to_string();
    }
    let mut out = String::with_capacity(literal.len());
    let mut breaks = 0;
    for (i, line) in lines.iter().enumerate() {
        let mut piece = *line;
        if i > 0 {
            piece = piece.trim_start_matches([' ', '\t']);
        }
        if i + 1 < lines.len() {
            piece = piece.trim_end_matches([' ', '\t', '\r']);
        }
        if i > 0 && i + 1 < lines.len() && piece.is_empty() {
            breaks += 1;
            continue;
        }
        if i > 0 {
            let trailing = out.chars().rev().take_while(|&c| c == '\\').count();
            if breaks > 0 {
                out.push_str(&"\n".repeat(breaks));
                breaks = 0;
            } else if quote == "double" && trailing % 2 == 1 {
                out.pop();
            } else {
                out.push(' ');
            }
        }
        out.push_str(piece);
    }
    out
}

fn serialized_text(content: &str, entries: &mut EntryList) {
    for caps in SERIALIZED_TEXT.captures_iter(content) {
        let (Some(field), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let line_start = content[..field.start()].rfind('\n').map_or(0, |i| i + 1);
        let column = field.start() - line_start;
        let Some((quote, from, to)) = scalar_span(content, whole.end(), column) else {
            tracing::debug!("unterminated m_Text scalar at byte {}", whole.end());
            continue;
        };
        let literal = &content[from..to];
        let folded = fold_lines(literal, quote);
        let text = match quote {
            "double" => unescape_po(&folded),
            "single" => folded.replace("''", "'"),
            _ => folded,
        };
        if text.trim().is_empty() {
            continue;
        }
        let line = content[..whole.end()].matches('\n').count() + 1;
        let entry = Entry::new(format!("{}:{}", field.as_str(), line), text).with_meta(QUOTE, quote);
        entries.push(patch::text_anchor(
            entry,
            Rule::SerializedText.name(),
            content,
            from,
            literal,
        ));
    }
}

/// Splits at the first `=` not escaped with a backslash.
fn split_translation(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape_translation(s: &str) -> String {
    unescape_po(&s.replace("\\=", "="))
}

fn escape_translation(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('=', "\\=")
}

fn auto_translator(content: &str, entries: &mut EntryList) {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.trim_end_matches(['\n', '\r']);
        let trimmed = body.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(['#', ';']) || trimmed.starts_with("//") {
            continue;
        }
        let Some((original, translation)) = split_translation(body) else {
            continue;
        };
        let source = unescape_translation(original);
        if source.trim().is_empty() {
            continue;
        }
        let translation_at = start + original.len() + 1;
        let entry = Entry::new(source.clone(), source)
            .with_target(Some(unescape_translation(translation)));
        entries.push(patch::text_anchor(
            entry,
            Rule::AutoTranslator.name(),
            content,
            translation_at,
            translation,
        ));
    }
}

fn encode(entry: &Entry, text: &str) -> String {
    if entry.meta(RULE) == Some(Rule::AutoTranslator.name()) {
        return escape_translation(text);
    }
    match entry.meta(QUOTE) {
        Some("single") => text.replace('\'', "''"),
        Some("double") => escape_po(text),
        // A plain scalar is re-quoted, since overrides may contain YAML syntax.
        _ => format!("\"{}\"", escape_po(text)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Unity
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut metadata = Metadata::default();
        let mut entries = EntryList::new();
        for rule in Rule::ORDER {
            rule.apply(content, &mut entries);
            if !entries.is_empty() {
                tracing::debug!("unity content matched rule {}", rule.name());
                break;
            }
        }
        metadata.note = Some("heuristic Unity extraction; review results".to_string());

        Ok(
            ParseResult::new(FormatType::Unity, entries.into_vec(), metadata)
                .with_raw(Some(content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        _options: &WriteOptions,
    ) -> Result<String, Error> {
        if let Some(raw) = &result.raw {
            return Ok(patch::splice_literals(raw, &result.entries, translations, encode));
        }

        // Without the original asset, emit an XUnity translation file.
        let mut out = String::new();
        for entry in &result.entries {
            let translation = translations
                .get(&entry.key)
                .map(String::as_str)
                .or(entry.target.as_deref())
                .unwrap_or(&entry.source);
            out.push_str(&format!(
                "{}={}\n",
                escape_translation(&entry.source),
                escape_translation(translation)
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const ASSET: &str = indoc! {r#"
        --- !u!114 &1
        MonoBehaviour:
          m_Name: Title
          m_Text: "Welcome, <b>hero</b>!\nPress start"
        --- !u!114 &2
        MonoBehaviour:
          m_text: Quit game
          m_Text: ''
          m_Text: 'It''s over'
    "#};

    const DUMP: &str = indoc! {"
        # XUnity.AutoTranslator
        ; comment
        Start Game=Inizia
        Quit=
        a\\=b=c
    "};

    #[test]
    fn test_rule_order_and_names() {
        assert_eq!(
            Rule::ORDER.iter().map(Rule::name).collect::<Vec<_>>(),
            vec!["serialized_text", "auto_translator"]
        );
    }

    #[test]
    fn test_serialized_text_rule() {
        let result = Format.parse(ASSET, &ParseOptions::default()).unwrap();
        let sources = result.entries.iter().map(|e| e.source.as_str()).collect::<Vec<_>>();
        assert_eq!(
            sources,
            vec!["Welcome, <b>hero</b>!\nPress start", "Quit game", "It's over"]
        );
        assert_eq!(result.entries[0].key, "m_Text:4");
        assert_eq!(result.entries[1].key, "m_text:7");
        assert!(result.entries.iter().all(|e| e.meta(RULE) == Some("serialized_text")));
        assert!(result.metadata.note.is_some());
    }

    const WRAPPED: &str = indoc! {r#"
        MonoBehaviour:
          m_Text: "A long line that Unity wraps
            onto a second line"
          m_FontSize: 14
          m_text: Plain text that
            keeps going
          m_Name: Label
    "#};

    #[test]
    fn test_serialized_text_rule_reads_wrapped_scalars() {
        let result = Format.parse(WRAPPED, &ParseOptions::default()).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["m_Text:2", "m_text:5"]);
        assert_eq!(result.entries[0].source, "A long line that Unity wraps onto a second line");
        assert_eq!(result.entries[1].source, "Plain text that keeps going");
    }

    #[test]
    fn test_wrapped_scalar_write_back_stays_valid_yaml() {
        let result = Format.parse(WRAPPED, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert("m_Text:2".to_string(), "Tradotto".to_string());
        translations.insert("m_text:5".to_string(), "Testo semplice".to_string());
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        assert_eq!(
            out,
            "MonoBehaviour:\n  m_Text: \"Tradotto\"\n  m_FontSize: 14\n  m_text: \"Testo semplice\"\n  m_Name: Label\n"
        );
        let value: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(value["MonoBehaviour"]["m_Text"].as_str(), Some("Tradotto"));

        let untouched = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(untouched, WRAPPED);
    }

    #[test]
    fn test_fold_lines() {
        assert_eq!(fold_lines("one\n   two", "double"), "one two");
        assert_eq!(fold_lines("one\n\n   two", "double"), "one\ntwo");
        assert_eq!(fold_lines("one\\\n   two", "double"), "onetwo");
        assert_eq!(fold_lines("single", "plain"), "single");
    }

    #[test]
    fn test_unterminated_quote_is_skipped() {
        let result = Format
            .parse("  m_Text: \"never closed\n", &ParseOptions::default())
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_auto_translator_rule() {
        let result = Format.parse(DUMP, &ParseOptions::default()).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["Start Game", "Quit", "a=b"]);
        assert_eq!(result.get("Start Game").unwrap().target.as_deref(), Some("Inizia"));
        assert_eq!(result.get("Quit").unwrap().target, None);
        assert_eq!(result.get("a=b").unwrap().source, "a=b");
        assert_eq!(result.entries[0].meta(RULE), Some("auto_translator"));
    }

    #[test]
    fn test_asset_write_back_patches_only_overrides() {
        let result = Format.parse(ASSET, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert("m_Text:4".to_string(), "Benvenuto \"eroe\"".to_string());
        translations.insert("m_text:7".to_string(), "Esci: ora".to_string());
        translations.insert("m_Text:9".to_string(), "E' finita".to_string());
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        assert!(out.contains("  m_Text: \"Benvenuto \\\"eroe\\\"\"\n"));
        assert!(out.contains("  m_text: \"Esci: ora\"\n"));
        assert!(out.contains("  m_Text: 'E'' finita'\n"));
        assert!(out.contains("  m_Name: Title\n"));

        let untouched = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(untouched, ASSET);
    }

    #[test]
    fn test_dump_write_back_fills_translations() {
        let result = Format.parse(DUMP, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert("Quit".to_string(), "Esci".to_string());
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        assert!(out.contains("Quit=Esci\n"));
        assert!(out.contains("Start Game=Inizia\n"));
        assert!(out.starts_with("# XUnity.AutoTranslator\n"));
    }

    #[test]
    fn test_fallback_without_raw() {
        let result = Format
            .parse(DUMP, &ParseOptions::default())
            .unwrap()
            .with_raw(None);
        let out = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(out, "Start Game=Inizia\nQuit=Quit\na\\=b=c\n");
    }
}
