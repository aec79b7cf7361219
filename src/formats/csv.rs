//! Support for delimited string tables (CSV and friends).
//!
//! The delimiter and header presence come from the options. With a header,
//! columns are located by name; without one, column 0 is the key and column 1
//! the value.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport},
};

lazy_static! {
    static ref KEY_HEADER: Regex = Regex::new(r"(?i)^(key|id|name)$").unwrap();
    static ref VALUE_HEADER: Regex = Regex::new(r"(?i)^(value|text|string|translation)$").unwrap();
    static ref CONTEXT_HEADER: Regex = Regex::new(r"(?i)^(context|msgctxt)$").unwrap();
    static ref COMMENT_HEADER: Regex =
        Regex::new(r"(?i)^(comment|note|notes|description)$").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    key: usize,
    value: usize,
    context: Option<usize>,
    comment: Option<usize>,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            key: 0,
            value: 1,
            context: None,
            comment: None,
        }
    }
}

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        let find = |re: &Regex| header.iter().position(|cell| re.is_match(cell.trim()));
        let key = find(&KEY_HEADER).unwrap_or(0);
        let value = find(&VALUE_HEADER)
            .filter(|&v| v != key)
            .unwrap_or(if key == 1 { 0 } else { 1 });
        Columns {
            key,
            value,
            context: find(&CONTEXT_HEADER),
            comment: find(&COMMENT_HEADER),
        }
    }
}

fn reader(content: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn writer(delimiter: u8) -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, Error> {
    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Splits one delimited row into its fields, honoring quoting.
pub fn parse_csv_row(line: &str, delimiter: u8) -> Result<Vec<String>, Error> {
    let mut rdr = reader(line, delimiter);
    match rdr.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Joins fields into one delimited row, quoting only where needed.
pub fn format_csv_row<S: AsRef<str>>(fields: &[S], delimiter: u8) -> Result<String, Error> {
    let mut wtr = writer(delimiter);
    wtr.write_record(fields.iter().map(|f| f.as_ref()))?;
    let mut row = finish(wtr)?;
    if row.ends_with('\n') {
        row.pop();
    }
    Ok(row)
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Csv
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut rdr = reader(content, options.csv_delimiter);
        let mut entries = EntryList::new();
        let mut columns = Columns::default();
        let mut header_pending = options.csv_has_header;

        for result in rdr.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!("skipping unreadable CSV row: {}", e);
                    continue;
                }
            };
            if header_pending {
                columns = Columns::from_header(&record);
                header_pending = false;
                continue;
            }

            let cell = |index: Option<usize>| {
                index
                    .and_then(|i| record.get(i))
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
            };
            let Some(key) = cell(Some(columns.key)) else {
                continue;
            };
            let value = cell(Some(columns.value)).unwrap_or_default();
            let mut entry = Entry::new(key, value)
                .with_context(cell(columns.context))
                .with_comment(cell(columns.comment));
            if let Some(position) = record.position() {
                entry = entry.with_meta("line", position.line());
            }
            entries.push(entry);
        }

        Ok(
            ParseResult::new(FormatType::Csv, entries.into_vec(), Metadata::default())
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let with_context = result.entries.iter().any(|e| e.context.is_some());
        let with_comment =
            options.preserve_comments && result.entries.iter().any(|e| e.comment.is_some());

        let mut wtr = writer(options.csv_delimiter);
        if options.csv_has_header {
            let mut header = vec!["key", "value"];
            if with_context {
                header.push("context");
            }
            if with_comment {
                header.push("comment");
            }
            wtr.write_record(&header)?;
        }
        for entry in &result.entries {
            let mut row = vec![entry.key.as_str(), entry.resolve(translations)];
            if with_context {
                row.push(entry.context.as_deref().unwrap_or_default());
            }
            if with_comment {
                row.push(entry.comment.as_deref().unwrap_or_default());
            }
            wtr.write_record(&row)?;
        }
        finish(wtr)
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let options = ParseOptions::default();
        let mut report = ValidationReport::new();
        let mut rdr = reader(content, options.csv_delimiter);
        let mut width = None;

        for result in rdr.records() {
            match result {
                Ok(record) => {
                    let line = record.position().map(|p| p.line() as usize);
                    match width {
                        None => width = Some(record.len()),
                        Some(expected) if expected != record.len() => report.warning(
                            line,
                            format!("row has {} fields, expected {}", record.len(), expected),
                        ),
                        Some(_) => {}
                    }
                }
                Err(e) => {
                    let line = e.position().map(|p| p.line() as usize);
                    report.error(line, e.to_string());
                }
            }
        }
        if report.valid && width.is_none() {
            report.warning(None, "no rows found");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_quoted_fields() {
        let fields = parse_csv_row(r#""a,b","c""d""#, b',').unwrap();
        assert_eq!(fields, vec!["a,b", "c\"d"]);
        assert_eq!(
            format_csv_row(&["a,b", "c\"d"], b',').unwrap(),
            r#""a,b","c""d""#
        );
    }

    #[test]
    fn test_header_locates_columns() {
        let content = indoc! {"
            Notes,Translation,ID,Context
            Main menu,Start,menu.start,menu
            ,Quit,menu.quit,
        "};
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["menu.start", "menu.quit"]);
        let start = result.get("menu.start").unwrap();
        assert_eq!(start.source, "Start");
        assert_eq!(start.comment.as_deref(), Some("Main menu"));
        assert_eq!(start.context.as_deref(), Some("menu"));
        assert_eq!(start.line(), Some(2));
        assert_eq!(result.get("menu.quit").unwrap().comment, None);
    }

    #[test]
    fn test_unmatched_header_defaults_to_first_columns() {
        let result = Format
            .parse("a,b\nk,v\n", &ParseOptions::default())
            .unwrap();
        assert_eq!(result.get("k").unwrap().source, "v");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_no_header_and_custom_delimiter() {
        let options = ParseOptions::default()
            .with_csv_header(false)
            .with_csv_delimiter(b';');
        let result = Format
            .parse("greet;\"Hi; there\"\nbye;Bye\n", &options)
            .unwrap();
        assert_eq!(result.get("greet").unwrap().source, "Hi; there");
        assert_eq!(result.get("bye").unwrap().source, "Bye");
    }

    #[test]
    fn test_multiline_quoted_value() {
        let result = Format
            .parse("key,value\npoem,\"line one\nline two\"\n", &ParseOptions::default())
            .unwrap();
        assert_eq!(result.get("poem").unwrap().source, "line one\nline two");
    }

    #[test]
    fn test_serialize_with_overrides() {
        let result = Format
            .parse("key,value,context\na,Hello,greeting\nb,\"x,y\",\n", &ParseOptions::default())
            .unwrap();
        let mut translations = Translations::new();
        translations.insert("a".to_string(), "Ciao \"amico\"".to_string());
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        assert_eq!(
            out,
            "key,value,context\na,\"Ciao \"\"amico\"\"\",greeting\nb,\"x,y\",\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let content = "key,value\none,\"a,b\"\ntwo,\"say \"\"hi\"\"\"\nthree,\"multi\nline\"\n";
        let first = Format.parse(content, &ParseOptions::default()).unwrap();
        let written = Format
            .serialize(&first, &Translations::new(), &WriteOptions::default())
            .unwrap();
        let second = Format.parse(&written, &ParseOptions::default()).unwrap();
        assert_eq!(first.len(), 3);
        for (a, b) in first.entries.iter().zip(&second.entries) {
            assert_eq!((&a.key, &a.source), (&b.key, &b.source));
        }
    }

    #[test]
    fn test_validate_warns_on_ragged_rows() {
        let report = Format.validate("key,value\na,b\nc\n");
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, Some(3));
    }
}
