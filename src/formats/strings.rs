//! Support for Apple `.strings` tables.
//!
//! Pairs look like `"key" = "value";`, optionally preceded by a `/* */` or `//`
//! comment. A `//: Language: xx` header line carries the table language.

use indoc::formatdoc;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport},
};

lazy_static! {
    static ref PAIR: Regex =
        Regex::new(r#"^"((?:[^"\\]|\\.)*)"\s*=\s*"((?:[^"\\]|\\.)*)"\s*;"#).unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl Format {
    /// Folds values spanning several physical lines into one line, joining the
    /// pieces with an escaped `\n` and dropping their leading indentation.
    pub fn multiline_values_to_one_line(content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();
        let mut inside_value = false;
        let mut value_buf = String::new();

        while let Some(c) = chars.next() {
            if !inside_value {
                result.push(c);
                if c == '=' {
                    // Seek the opening quote of the value.
                    while let Some(&d) = chars.peek() {
                        if d != '"' && !d.is_whitespace() {
                            break;
                        }
                        result.push(d);
                        chars.next();
                        if d == '"' {
                            inside_value = true;
                            value_buf.clear();
                            break;
                        }
                    }
                }
            } else if c == '"' {
                let prev_backslashes = value_buf.chars().rev().take_while(|&x| x == '\\').count();
                if prev_backslashes % 2 == 0 {
                    inside_value = false;
                    let value_one_line = value_buf
                        .split('\n')
                        .enumerate()
                        .map(|(i, piece)| if i == 0 { piece } else { piece.trim_start() })
                        .collect::<Vec<_>>()
                        .join(r"\n");
                    result.push_str(&value_one_line);
                    result.push('"');
                    value_buf.clear();
                } else {
                    value_buf.push('"');
                }
            } else {
                value_buf.push(c);
            }
        }

        // An unterminated value is kept as written.
        if inside_value {
            result.push_str(&value_buf);
        }
        result
    }
}

/// Returns a comment without its marker.
fn comment_text(comment: &str) -> String {
    let comment = comment.trim();
    if let Some(inner) = comment
        .strip_prefix("/*")
        .map(|c| c.strip_suffix("*/").unwrap_or(c))
    {
        inner.trim().to_string()
    } else if let Some(inner) = comment.strip_prefix("//") {
        inner.trim().to_string()
    } else {
        comment.to_string()
    }
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Strings
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let folded = Format::multiline_values_to_one_line(content);

        let mut metadata = Metadata::default();
        let mut entries = EntryList::new();
        let mut last_comment: Option<String> = None;
        let mut open_block: Option<String> = None;

        for (index, line) in folded.lines().enumerate() {
            let trimmed = line.trim();

            if let Some(block) = open_block.as_mut() {
                block.push('\n');
                block.push_str(trimmed);
                if trimmed.ends_with("*/") {
                    last_comment = open_block.take().map(|b| comment_text(&b));
                }
                continue;
            }

            if trimmed.starts_with("//:") {
                // Example: "//: Language: English"
                let parts: Vec<&str> = trimmed.splitn(3, ':').collect();
                if parts.len() == 3 && parts[1].trim() == "Language" {
                    let value = parts[2].trim();
                    if !value.is_empty() {
                        metadata.language = Some(value.to_string());
                    }
                }
                continue;
            }
            if trimmed.is_empty() {
                last_comment = None;
                continue;
            }

            // A block comment may precede the pair on the same line.
            let mut rest = trimmed;
            if trimmed.starts_with("/*") {
                match trimmed.find("*/") {
                    Some(end) => {
                        last_comment = Some(comment_text(&trimmed[..end + 2]));
                        rest = trimmed[end + 2..].trim_start();
                    }
                    None => {
                        open_block = Some(trimmed.to_string());
                        continue;
                    }
                }
            } else if trimmed.starts_with("//") {
                last_comment = Some(comment_text(trimmed));
                continue;
            }
            if rest.is_empty() {
                continue;
            }

            match PAIR.captures(rest) {
                Some(caps) => {
                    let key = unescape_po(&caps[1]);
                    let value = unescape_po(&caps[2]);
                    entries.push(
                        Entry::new(key, value)
                            .with_comment(last_comment.take())
                            .with_meta("line", index + 1),
                    );
                }
                None => {
                    tracing::debug!("skipping unrecognized .strings line {}", index + 1);
                    last_comment = None;
                }
            }
        }

        Ok(
            ParseResult::new(FormatType::Strings, entries.into_vec(), metadata)
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let language = options
            .language
            .as_deref()
            .or(result.metadata.output_language())
            .unwrap_or_default();

        let mut content = formatdoc! {"
            // This file is generated by locfmt.
            // The header below records the table language for later parses.
            //
            //: Language: {}
            //

            ", language};

        for entry in &result.entries {
            if options.preserve_comments {
                if let Some(comment) = &entry.comment {
                    content.push_str(&format!("/* {} */\n", comment.replace("*/", "* /")));
                }
            }
            content.push_str(&format!(
                "\"{}\" = \"{}\";\n",
                escape_po(&entry.key),
                escape_po(entry.resolve(translations))
            ));
        }
        Ok(content)
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let folded = Format::multiline_values_to_one_line(content);
        let mut in_block = false;
        for (index, line) in folded.lines().enumerate() {
            let trimmed = line.trim();
            if in_block {
                in_block = !trimmed.ends_with("*/");
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            if trimmed.starts_with("/*") {
                match trimmed.find("*/") {
                    Some(end) if trimmed[end + 2..].trim().is_empty() => continue,
                    Some(end) => {
                        if !PAIR.is_match(trimmed[end + 2..].trim_start()) {
                            report.error(Some(index + 1), "expected \"key\" = \"value\";");
                        }
                    }
                    None => in_block = true,
                }
                continue;
            }
            if !PAIR.is_match(trimmed) {
                report.error(Some(index + 1), "expected \"key\" = \"value\";");
            }
        }
        if in_block {
            report.error(None, "unterminated /* comment");
        }
        if report.valid && folded.lines().all(|l| !PAIR.is_match(l.trim())) {
            report.warning(None, "no translatable entries found");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_pairs_and_comments() {
        let content = indoc! {r#"
            //: Language: fr
            /* Title of the main window */
            "title" = "Bonjour";
            // Button
            "ok" = "D'accord";

            "quote" = "Say \"hi\"\n";
        "#};
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(result.metadata.language.as_deref(), Some("fr"));
        assert_eq!(result.len(), 3);
        let title = result.get("title").unwrap();
        assert_eq!(title.source, "Bonjour");
        assert_eq!(title.comment.as_deref(), Some("Title of the main window"));
        assert_eq!(result.get("ok").unwrap().comment.as_deref(), Some("Button"));
        let quote = result.get("quote").unwrap();
        assert_eq!(quote.source, "Say \"hi\"\n");
        assert_eq!(quote.comment, None);
    }

    #[test]
    fn test_multiline_values_are_folded() {
        let content = "\"poem\" = \"Roses are red,\n    violets are blue\";\n\"next\" = \"x\";";
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(
            result.get("poem").unwrap().source,
            "Roses are red,\nviolets are blue"
        );
        assert_eq!(result.get("next").unwrap().source, "x");
    }

    #[test]
    fn test_multiline_block_comment() {
        let content = "/* First line\n   second line */\n\"a\" = \"b\";";
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(
            result.get("a").unwrap().comment.as_deref(),
            Some("First line\nsecond line")
        );
    }

    #[test]
    fn test_inline_block_comment_before_pair() {
        let result = Format
            .parse("/* note */ \"a\" = \"b\";", &ParseOptions::default())
            .unwrap();
        let entry = result.get("a").unwrap();
        assert_eq!(entry.source, "b");
        assert_eq!(entry.comment.as_deref(), Some("note"));
    }

    #[test]
    fn test_serialize_comment_above_pair() {
        let result = Format
            .parse("/* Greeting */\n\"hello\" = \"Hello\";", &ParseOptions::default())
            .unwrap();
        let mut translations = Translations::new();
        translations.insert("hello".to_string(), "Ciao \"tu\"".to_string());
        let options = WriteOptions::default()
            .with_comments(true)
            .with_language(Some("it".to_string()));
        let out = Format.serialize(&result, &translations, &options).unwrap();
        assert!(out.contains("//: Language: it\n"));
        assert!(out.contains("/* Greeting */\n\"hello\" = \"Ciao \\\"tu\\\"\";\n"));
    }

    #[test]
    fn test_round_trip_keeps_language_and_pairs() {
        let content = "//: Language: de\n\"a\" = \"Tab\\there\";\n\"b\" = \"B\";\n";
        let first = Format.parse(content, &ParseOptions::default()).unwrap();
        let written = Format
            .serialize(&first, &Translations::new(), &WriteOptions::default())
            .unwrap();
        let second = Format.parse(&written, &ParseOptions::default()).unwrap();
        assert_eq!(second.metadata.language.as_deref(), Some("de"));
        let pairs = |r: &ParseResult| {
            r.entries
                .iter()
                .map(|e| (e.key.clone(), e.source.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&first), pairs(&second));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let result = Format
            .parse("\"a\" = \"b\";\ngarbage here\n\"c\" = \"d\";", &ParseOptions::default())
            .unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_validate_flags_bad_line() {
        let report = Format.validate("\"a\" = \"b\";\n\"c\" = d;\n");
        assert!(!report.valid);
        assert_eq!(report.errors[0].line, Some(2));
        assert!(Format.validate("/* ok */\n\"a\" = \"b\";").valid);
    }
}
