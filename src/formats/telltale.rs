//! Support for text exported from Telltale games (`.langdb`, `.landb`,
//! `.dlog`).
//!
//! Exports come in several shapes, so the rules in [`Rule::ORDER`] are tried
//! one at a time and the first that yields entries wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::{
        FormatType,
        patch::{self, POINTER},
    },
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

lazy_static! {
    static ref KEY_VALUE: Regex =
        Regex::new(r"(?m)^[ \t]*([A-Za-z0-9_.\-]+)[ \t]*=[ \t]*(.*?)[ \t]*\r?$").unwrap();
    static ref DIALOGUE: Regex = Regex::new(
        r#"(?m)^[ \t]*([A-Za-z][A-Za-z0-9_ .'\-]*?)[ \t]*:[ \t]*"((?:[^"\\\n]|\\.)*)"[ \t]*\r?$"#
    )
    .unwrap();
    static ref STRING_CALL: Regex = Regex::new(
        r#"String\(\s*"((?:[^"\\]|\\.)*)"\s*,\s*"((?:[^"\\]|\\.)*)"\s*\)"#
    )
    .unwrap();
}

const QUOTED: &str = "quoted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// A JSON export: string leaves of an object, or key/text records.
    Json,
    /// `key=value` lines, value optionally quoted.
    KeyValue,
    /// `Speaker: "line"` dialogue.
    Dialogue,
    /// `String("key","value")` calls in scripts.
    StringCall,
}

impl Rule {
    pub const ORDER: [Rule; 4] = [Rule::Json, Rule::KeyValue, Rule::Dialogue, Rule::StringCall];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Json => "json",
            Rule::KeyValue => "key_value",
            Rule::Dialogue => "dialogue",
            Rule::StringCall => "string_call",
        }
    }

    fn apply(&self, content: &str, entries: &mut EntryList) {
        match self {
            Rule::Json => json(content, entries),
            Rule::KeyValue => key_value(content, entries),
            Rule::Dialogue => dialogue(content, entries),
            Rule::StringCall => string_call(content, entries),
        }
    }
}

fn json_leaves(value: &Value, path: &mut Vec<String>, entries: &mut EntryList) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                path.push(key.clone());
                json_leaves(child, path, entries);
                path.pop();
            }
        }
        Value::String(text) if !text.trim().is_empty() => {
            let pointer = path
                .iter()
                .map(|t| format!("/{}", patch::pointer_token(t)))
                .collect::<String>();
            entries.push(patch::pointer_anchor(
                Entry::new(path.join("."), text.as_str()),
                Rule::Json.name(),
                &pointer,
            ));
        }
        _ => {}
    }
}

fn json(content: &str, entries: &mut EntryList) {
    let Ok(document) = serde_json::from_str::<Value>(content) else {
        return;
    };
    match &document {
        Value::Object(_) => json_leaves(&document, &mut Vec::new(), entries),
        Value::Array(records) => {
            for (index, record) in records.iter().enumerate() {
                let Some(object) = record.as_object() else {
                    continue;
                };
                let key = ["key", "id", "name"]
                    .iter()
                    .find_map(|f| match object.get(*f) {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    });
                let text = ["text", "value", "string"]
                    .iter()
                    .find_map(|f| object.get(*f).and_then(Value::as_str).map(|t| (*f, t)));
                let (Some(key), Some((field, text))) = (key, text) else {
                    continue;
                };
                let speaker = ["speaker", "character"]
                    .iter()
                    .find_map(|f| object.get(*f).and_then(Value::as_str))
                    .map(str::to_string);
                entries.push(patch::pointer_anchor(
                    Entry::new(key, text).with_context(speaker),
                    Rule::Json.name(),
                    &format!("/{}/{}", index, field),
                ));
            }
        }
        _ => {}
    }
}

fn key_value(content: &str, entries: &mut EntryList) {
    for caps in KEY_VALUE.captures_iter(content) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let raw = value.as_str();
        let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
        let (literal, offset, text) = if quoted {
            let inner = &raw[1..raw.len() - 1];
            (inner, value.start() + 1, unescape_po(inner))
        } else {
            (raw, value.start(), raw.to_string())
        };
        if text.trim().is_empty() {
            continue;
        }
        let entry = Entry::new(key.as_str(), text).with_meta(QUOTED, quoted);
        entries.push(patch::text_anchor(
            entry,
            Rule::KeyValue.name(),
            content,
            offset,
            literal,
        ));
    }
}

fn dialogue(content: &str, entries: &mut EntryList) {
    for caps in DIALOGUE.captures_iter(content) {
        let (Some(speaker), Some(line)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let text = unescape_po(line.as_str());
        if text.trim().is_empty() {
            continue;
        }
        let number = content[..line.start()].matches('\n').count() + 1;
        let entry = Entry::new(format!("{}:{}", speaker.as_str(), number), text)
            .with_context(Some(speaker.as_str().to_string()))
            .with_meta(QUOTED, true);
        entries.push(patch::text_anchor(
            entry,
            Rule::Dialogue.name(),
            content,
            line.start(),
            line.as_str(),
        ));
    }
}

fn string_call(content: &str, entries: &mut EntryList) {
    for caps in STRING_CALL.captures_iter(content) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let entry = Entry::new(unescape_po(key.as_str()), unescape_po(value.as_str()))
            .with_meta(QUOTED, true);
        entries.push(patch::text_anchor(
            entry,
            Rule::StringCall.name(),
            content,
            value.start(),
            value.as_str(),
        ));
    }
}

fn encode(entry: &Entry, text: &str) -> String {
    if entry.meta(QUOTED) == Some("true") {
        escape_po(text)
    } else {
        text.replace('\n', "\\n")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Telltale
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        for rule in Rule::ORDER {
            rule.apply(content, &mut entries);
            if !entries.is_empty() {
                tracing::debug!("telltale content matched rule {}", rule.name());
                break;
            }
        }

        let metadata = Metadata {
            note: Some("heuristic Telltale extraction; binary langdb tables are not decoded".to_string()),
            ..Default::default()
        };
        Ok(
            ParseResult::new(FormatType::Telltale, entries.into_vec(), metadata)
                .with_raw(Some(content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        _options: &WriteOptions,
    ) -> Result<String, Error> {
        match &result.raw {
            Some(raw) if result.entries.iter().any(|e| e.meta(POINTER).is_some()) => {
                patch::patch_json(raw, &result.entries, translations)
            }
            Some(raw) => Ok(patch::splice_literals(raw, &result.entries, translations, encode)),
            None => {
                let mut table = Map::new();
                for entry in &result.entries {
                    table.insert(entry.key.clone(), Value::from(entry.resolve(translations)));
                }
                Ok(format!("{}\n", serde_json::to_string_pretty(&Value::Object(table))?))
            }
        }
    }
}
