//! Support for JSON string tables.
//!
//! Two shapes are read: an array of records (`{"key": .., "value": ..}`) and an
//! arbitrarily nested object whose string leaves are flattened into
//! dot-separated keys. `//` and `/* */` comments are stripped first.

use serde_json::{Map, Value};

use crate::{
    error::Error,
    escape::strip_json_comments,
    formats::FormatType,
    options::{JsonLayout, ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport},
};

const KEY_FIELDS: [&str; 3] = ["key", "id", "name"];
const VALUE_FIELDS: [&str; 4] = ["value", "text", "translation", "source"];

/// Marks entries that came from an array of records, so the array shape can
/// be written back.
const RECORD_META: &str = "record";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

fn first_string<'a>(record: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
}

fn parse_records(items: &[Value], entries: &mut EntryList) {
    for (index, item) in items.iter().enumerate() {
        let Some(record) = item.as_object() else {
            tracing::debug!("skipping non-object JSON record at index {}", index);
            continue;
        };
        let (Some(key), Some(value)) = (
            first_string(record, &KEY_FIELDS),
            first_string(record, &VALUE_FIELDS),
        ) else {
            tracing::debug!("skipping JSON record without key or value at index {}", index);
            continue;
        };
        let text = |field: &str| record.get(field).and_then(Value::as_str).map(str::to_string);
        entries.push(
            Entry::new(key, value)
                .with_context(text("context"))
                .with_comment(text("comment"))
                .with_meta(RECORD_META, true),
        );
    }
}

/// Depth-first flattening of string leaves into `a.b.c` keys.
fn flatten(value: &Value, prefix: String, entries: &mut EntryList) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(val, new_prefix, entries);
            }
        }
        Value::String(s) => entries.push(Entry::new(prefix, s.clone())),
        _ => {}
    }
}

/// Insert a value at a nested path, creating intermediate objects as needed.
pub(crate) fn insert_nested(
    root: &mut Map<String, Value>,
    path: &[&str],
    value: Value,
) -> Result<(), Error> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        if root.get(*head).is_some_and(Value::is_object) {
            return Err(Error::DataMismatch(format!(
                "key `{}` is both a value and a group of nested keys",
                head
            )));
        }
        root.insert(head.to_string(), value);
        return Ok(());
    }

    let next_level = root
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    match next_level.as_object_mut() {
        Some(inner) => insert_nested(inner, rest, value),
        None => Err(Error::DataMismatch(format!(
            "key `{}` is both a value and a group of nested keys",
            head
        ))),
    }
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Json
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let stripped = strip_json_comments(content);
        let value: Value = serde_json::from_str(&stripped)?;

        let mut entries = EntryList::new();
        match &value {
            Value::Array(items) => parse_records(items, &mut entries),
            Value::Object(_) => flatten(&value, String::new(), &mut entries),
            _ => tracing::debug!("JSON root is neither an object nor an array"),
        }

        Ok(
            ParseResult::new(FormatType::Json, entries.into_vec(), Metadata::default())
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let records = !result.entries.is_empty()
            && result.entries.iter().all(|e| e.meta(RECORD_META).is_some());

        let value = if records {
            Value::Array(
                result
                    .entries
                    .iter()
                    .map(|entry| {
                        let mut record = Map::new();
                        record.insert("key".to_string(), Value::from(entry.key.as_str()));
                        record.insert("value".to_string(), Value::from(entry.resolve(translations)));
                        if let Some(context) = &entry.context {
                            record.insert("context".to_string(), Value::from(context.as_str()));
                        }
                        if let (true, Some(comment)) = (options.preserve_comments, &entry.comment) {
                            record.insert("comment".to_string(), Value::from(comment.as_str()));
                        }
                        Value::Object(record)
                    })
                    .collect(),
            )
        } else {
            let mut root = Map::new();
            for entry in &result.entries {
                let text = Value::from(entry.resolve(translations));
                match options.json_layout {
                    JsonLayout::Flat => {
                        root.insert(entry.key.clone(), text);
                    }
                    JsonLayout::Nested => {
                        let parts: Vec<&str> = entry.key.split('.').collect();
                        insert_nested(&mut root, &parts, text)?;
                    }
                }
            }
            Value::Object(root)
        };

        Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let stripped = strip_json_comments(content);
        match serde_json::from_str::<Value>(&stripped) {
            Ok(Value::Object(_)) | Ok(Value::Array(_)) => {
                if let Ok(result) = self.parse(content, &ParseOptions::default()) {
                    if result.is_empty() {
                        report.warning(None, "no string values found");
                    }
                }
            }
            Ok(_) => report.warning(None, "root is neither an object nor an array"),
            Err(e) => report.error(
                Some(e.line()),
                format!("syntax error at line {}, column {}: {}", e.line(), e.column(), e),
            ),
        }
        report
    }
}
