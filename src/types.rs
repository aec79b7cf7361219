//! Core, format-agnostic types for locfmt.
//! Parsers decode into these; serializers read these back out.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Display,
};

use serde::{Deserialize, Serialize};

use crate::{error::Error, formats::FormatType};

/// Key → translated text overrides handed to the serializers.
pub type Translations = HashMap<String, String>;

/// Everything one parse pass produced from one piece of content.
///
/// A `ParseResult` is a snapshot: serializers only borrow it and produce a new
/// string, they never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParseResult {
    /// The format recorded at parse time; serialization dispatches on it.
    pub format: FormatType,

    /// Ordered entries, keys unique within this result.
    #[serde(default)]
    pub entries: Vec<Entry>,

    /// Header-level metadata, sparsely populated per format.
    #[serde(default)]
    pub metadata: Metadata,

    /// The original content, kept when requested or when a dialect serializer
    /// needs it to patch values in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub raw: Option<String>,
}

impl ParseResult {
    pub fn new(format: FormatType, entries: Vec<Entry>, metadata: Metadata) -> Self {
        ParseResult {
            format,
            entries,
            metadata,
            raw: None,
        }
    }

    /// An empty result for `format`, used by the lenient paths.
    pub fn empty(format: FormatType) -> Self {
        Self::new(format, Vec::new(), Metadata::default())
    }

    pub fn with_raw(mut self, raw: Option<String>) -> Self {
        self.raw = raw;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Header-level metadata. Each parser fills only what its format can express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plural_forms: Option<String>,
    /// Advisory set by stub and heuristic parsers: results may be incomplete.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl Metadata {
    /// The language a serializer should write as the target language.
    pub fn output_language(&self) -> Option<&str> {
        self.target_language
            .as_deref()
            .or(self.language.as_deref())
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = [
            ("language", &self.language),
            ("sourceLanguage", &self.source_language),
            ("targetLanguage", &self.target_language),
            ("projectName", &self.project_name),
            ("generator", &self.generator),
            ("pluralForms", &self.plural_forms),
            ("note", &self.note),
        ];
        write!(
            f,
            "Metadata {{ {} }}",
            fields
                .iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| format!("{}: {}", k, v)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// A single translatable string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique key within one parse result. Context-bearing formats use
    /// `context|source`.
    pub key: String,

    /// The original text.
    pub source: String,

    /// Translated text, when the file already carries one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,

    /// Grouping hint (msgctxt, INI section, speaker...).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<String>,

    /// Note for translators.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_length: Option<usize>,

    /// Format-specific extras (source snapshot, line number, write-back anchors).
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Entry {
            key: key.into(),
            source: source.into(),
            target: None,
            context: None,
            comment: None,
            max_length: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target.filter(|t| !t.is_empty());
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context.filter(|c| !c.is_empty());
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment.filter(|c| !c.is_empty());
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// The text to write for this entry: the override for its key, else the source.
    pub fn resolve<'a>(&'a self, translations: &'a Translations) -> &'a str {
        translations
            .get(&self.key)
            .map(String::as_str)
            .unwrap_or(&self.source)
    }

    /// The source line this entry came from, when the parser recorded one.
    pub fn line(&self) -> Option<usize> {
        self.meta("line").and_then(|l| l.parse().ok())
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry {{ key: {}, source: {} }}", self.key, self.source)
    }
}

/// Builds the `context|source` key used by context-bearing formats.
pub fn context_key(context: Option<&str>, source: &str) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => format!("{}|{}", ctx, source),
        _ => source.to_string(),
    }
}

/// Collects entries while keeping keys unique.
///
/// A key seen before gets a `#2`, `#3`, ... suffix, so the result stays a
/// function of the content.
#[derive(Debug, Default)]
pub(crate) struct EntryList {
    entries: Vec<Entry>,
    seen: HashSet<String>,
    seen_sources: HashSet<String>,
}

impl EntryList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, mut entry: Entry) {
        if self.seen.contains(&entry.key) {
            let base = entry.key.clone();
            let mut n = 2;
            while self.seen.contains(&format!("{}#{}", base, n)) {
                n += 1;
            }
            entry.key = format!("{}#{}", base, n);
        }
        self.seen.insert(entry.key.clone());
        self.seen_sources.insert(entry.source.clone());
        self.entries.push(entry);
    }

    /// Pushes only if no earlier entry carried the same source text.
    pub(crate) fn push_unique_source(&mut self, entry: Entry) -> bool {
        if self.seen_sources.contains(&entry.source) {
            return false;
        }
        self.push(entry);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<Entry> {
        self.entries
    }
}

/// Structured outcome of the opt-in strict validation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<usize>,
    pub message: String,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue {
            line,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            line,
            message: message.into(),
        });
    }

    /// `Ok` for a valid report, otherwise [`Error::Validation`] listing the errors.
    pub fn check(&self) -> Result<(), Error> {
        if self.valid {
            return Ok(());
        }
        let messages = self
            .errors
            .iter()
            .map(|issue| match issue.line {
                Some(line) => format!("line {}: {}", line, issue.message),
                None => issue.message.clone(),
            })
            .collect::<Vec<_>>();
        Err(Error::validation_error(messages.join("; ")))
    }
}
