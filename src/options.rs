//! Options controlling parsing and serialization.
//!
//! Both structs deserialize with per-field defaults, so a host can keep them in
//! its own configuration file and only spell out what differs.

use serde::{Deserialize, Serialize};

use crate::formats::FormatType;

/// Parse behavior options for [`crate::codec::parse_file`] and the per-format codecs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Forces a format instead of detecting one.
    pub format_hint: Option<FormatType>,
    /// CSV field delimiter.
    pub csv_delimiter: u8,
    /// Whether the first CSV row is a header.
    pub csv_has_header: bool,
    /// Keep the original content in [`crate::types::ParseResult::raw`].
    pub retain_raw: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            format_hint: None,
            csv_delimiter: b',',
            csv_has_header: true,
            retain_raw: false,
        }
    }
}

impl ParseOptions {
    /// Creates default parse options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a format hint.
    pub fn with_format_hint(mut self, format_hint: Option<FormatType>) -> Self {
        self.format_hint = format_hint;
        self
    }

    /// Sets the CSV delimiter.
    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    /// Declares whether CSV input starts with a header row.
    pub fn with_csv_header(mut self, has_header: bool) -> Self {
        self.csv_has_header = has_header;
        self
    }

    /// Enables/disables keeping the raw content.
    pub fn with_raw(mut self, retain_raw: bool) -> Self {
        self.retain_raw = retain_raw;
        self
    }
}

/// Shape of serialized JSON/YAML output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonLayout {
    /// One level, dotted keys kept as-is.
    #[default]
    Flat,
    /// Dotted keys rebuilt into nested objects.
    Nested,
}

/// Write behavior options for [`crate::codec::write_file`] and the per-format codecs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Emit entry comments in formats that can carry them.
    pub preserve_comments: bool,
    pub json_layout: JsonLayout,
    /// Target language written into headers; falls back to the parsed metadata.
    pub language: Option<String>,
    pub csv_delimiter: u8,
    pub csv_has_header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            preserve_comments: false,
            json_layout: JsonLayout::Flat,
            language: None,
            csv_delimiter: b',',
            csv_has_header: true,
        }
    }
}

impl WriteOptions {
    /// Creates default write options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(mut self, preserve_comments: bool) -> Self {
        self.preserve_comments = preserve_comments;
        self
    }

    pub fn with_json_layout(mut self, json_layout: JsonLayout) -> Self {
        self.json_layout = json_layout;
        self
    }

    /// Shorthand for `with_json_layout(JsonLayout::Nested)` when `nested` is true.
    pub fn nested(self, nested: bool) -> Self {
        self.with_json_layout(if nested {
            JsonLayout::Nested
        } else {
            JsonLayout::Flat
        })
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn with_csv_header(mut self, has_header: bool) -> Self {
        self.csv_has_header = has_header;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_defaults() {
        let options = ParseOptions::new();
        assert_eq!(options.csv_delimiter, b',');
        assert!(options.csv_has_header);
        assert!(!options.retain_raw);
        assert_eq!(options.format_hint, None);
    }

    #[test]
    fn test_parse_options_from_partial_json() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"csv_delimiter": 59, "format_hint": "renpy"}"#).unwrap();
        assert_eq!(options.csv_delimiter, b';');
        assert!(options.csv_has_header);
        assert_eq!(options.format_hint, Some(FormatType::RenPy));
    }

    #[test]
    fn test_write_options_nested_shorthand() {
        let options = WriteOptions::new().nested(true);
        assert_eq!(options.json_layout, JsonLayout::Nested);
        let options = options.nested(false);
        assert_eq!(options.json_layout, JsonLayout::Flat);
    }
}
