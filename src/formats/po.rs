//! Support for GNU gettext `.po` catalogs and `.pot` templates.
//!
//! Entries are blank-line separated blocks of `msgctxt`/`msgid`/`msgstr`
//! keywords with quoted, backslash-escaped values and `"..."` continuation
//! lines. The block whose `msgid` is empty is the header; it feeds
//! [`Metadata`] and never shows up as an entry.

use std::fmt::Write as _;

use unic_langid::LanguageIdentifier;

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{
        Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport, context_key,
    },
};

/// gettext codec. `template` selects `.pot` behavior: the recorded format is
/// [`FormatType::Pot`] and every written `msgstr` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format {
    pub template: bool,
}

impl Format {
    pub const fn po() -> Self {
        Format { template: false }
    }

    pub const fn pot() -> Self {
        Format { template: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

/// One raw block, before it becomes an [`Entry`] or the header.
#[derive(Debug, Default)]
struct Message {
    line: usize,
    comments: Vec<String>,
    context: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Vec<String>,
}

impl Message {
    fn is_blank(&self) -> bool {
        self.msgid.is_none() && self.context.is_none() && self.comments.is_empty()
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Context => self.context.get_or_insert_with(String::new),
            Field::Id => self.msgid.get_or_insert_with(String::new),
            Field::IdPlural => self.msgid_plural.get_or_insert_with(String::new),
            Field::Str(n) => {
                if self.msgstr.len() <= n {
                    self.msgstr.resize(n + 1, String::new());
                }
                &mut self.msgstr[n]
            }
        }
    }
}

/// Splits a keyword line into the keyword's field and its quoted payload.
fn keyword(line: &str) -> Option<(Field, &str)> {
    if let Some(rest) = line.strip_prefix("msgctxt") {
        return Some((Field::Context, rest));
    }
    if let Some(rest) = line.strip_prefix("msgid_plural") {
        return Some((Field::IdPlural, rest));
    }
    if let Some(rest) = line.strip_prefix("msgid") {
        return Some((Field::Id, rest));
    }
    if let Some(rest) = line.strip_prefix("msgstr[") {
        let (index, rest) = rest.split_once(']')?;
        return Some((Field::Str(index.trim().parse().ok()?), rest));
    }
    line.strip_prefix("msgstr").map(|rest| (Field::Str(0), rest))
}

/// Returns the unescaped contents of a `"..."` token, or `None` if it is not
/// a properly terminated string.
fn quoted(token: &str) -> Option<String> {
    let token = token.trim();
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    let trailing_backslashes = inner.chars().rev().take_while(|&c| c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        return None;
    }
    Some(unescape_po(inner))
}

fn strip_comment_marker(line: &str) -> &str {
    let body = line.trim_start_matches('#');
    body.strip_prefix(['.', ':', ',', '|'])
        .unwrap_or(body)
        .trim()
}

fn apply_header(metadata: &mut Metadata, header: &str) {
    for line in header.split('\n') {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let slot = match name.trim() {
            "Language" => &mut metadata.language,
            "Plural-Forms" => &mut metadata.plural_forms,
            "Project-Id-Version" => &mut metadata.project_name,
            "X-Generator" => &mut metadata.generator,
            _ => continue,
        };
        *slot = Some(value.to_string());
    }
}

fn parse_messages(content: &str) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut current = Message::default();
    let mut field: Option<Field> = None;

    let mut flush = |current: &mut Message| {
        let done = std::mem::take(current);
        if done.msgid.is_some() {
            messages.push(done);
        }
    };

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        let line_no = index + 1;

        if line.is_empty() {
            flush(&mut current);
            field = None;
            continue;
        }

        // A new block may start without a separating blank line.
        let starts_block = line.starts_with('#')
            || line.starts_with("msgctxt")
            || (line.starts_with("msgid") && !line.starts_with("msgid_plural"));
        if starts_block && !current.msgstr.is_empty() {
            flush(&mut current);
            field = None;
        }
        if current.is_blank() {
            current.line = line_no;
        }

        if line.starts_with("#~") {
            continue;
        }
        if line.starts_with('#') {
            let comment = strip_comment_marker(line);
            if !comment.is_empty() {
                current.comments.push(comment.to_string());
            }
            continue;
        }

        if let Some((next, payload)) = keyword(line) {
            match quoted(payload) {
                Some(text) => {
                    current.field_mut(next).push_str(&text);
                    field = Some(next);
                }
                None => {
                    tracing::debug!("skipping malformed gettext line {}", line_no);
                    field = None;
                }
            }
        } else if line.starts_with('"') {
            match (field, quoted(line)) {
                (Some(open), Some(text)) => current.field_mut(open).push_str(&text),
                _ => tracing::debug!("skipping stray continuation at line {}", line_no),
            }
        }
    }
    flush(&mut current);
    messages
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        if self.template {
            FormatType::Pot
        } else {
            FormatType::Po
        }
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut metadata = Metadata::default();
        let mut entries = EntryList::new();

        for message in parse_messages(content) {
            let msgid = message.msgid.unwrap_or_default();
            let msgstr = message.msgstr.into_iter().next();

            if msgid.is_empty() && message.context.is_none() {
                apply_header(&mut metadata, msgstr.as_deref().unwrap_or_default());
                continue;
            }

            let mut entry = Entry::new(context_key(message.context.as_deref(), &msgid), msgid)
                .with_target(msgstr)
                .with_context(message.context)
                .with_comment(Some(message.comments.join("\n")))
                .with_meta("line", message.line);
            if let Some(plural) = message.msgid_plural {
                entry = entry.with_meta("plural", plural);
            }
            entries.push(entry);
        }

        Ok(
            ParseResult::new(self.format_type(), entries.into_vec(), metadata)
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let mut out = String::new();
        let language = options
            .language
            .as_deref()
            .or(result.metadata.output_language())
            .unwrap_or_default();

        out.push_str("msgid \"\"\nmsgstr \"\"\n");
        if let Some(project) = &result.metadata.project_name {
            writeln!(out, "\"Project-Id-Version: {}\\n\"", escape_po(project)).ok();
        }
        out.push_str("\"Content-Type: text/plain; charset=UTF-8\\n\"\n");
        writeln!(out, "\"Language: {}\\n\"", escape_po(language)).ok();
        if let Some(plural_forms) = &result.metadata.plural_forms {
            writeln!(out, "\"Plural-Forms: {}\\n\"", escape_po(plural_forms)).ok();
        }
        if let Some(generator) = &result.metadata.generator {
            writeln!(out, "\"X-Generator: {}\\n\"", escape_po(generator)).ok();
        }

        for entry in &result.entries {
            out.push('\n');
            if options.preserve_comments {
                if let Some(comment) = &entry.comment {
                    for line in comment.lines() {
                        writeln!(out, "#. {}", line).ok();
                    }
                }
            }
            if let Some(context) = &entry.context {
                write_keyword(&mut out, "msgctxt", context);
            }
            write_keyword(&mut out, "msgid", &entry.source);

            let text = if self.template {
                ""
            } else {
                entry.resolve(translations)
            };
            match entry.meta("plural") {
                Some(plural) => {
                    write_keyword(&mut out, "msgid_plural", plural);
                    let plural_text = match (self.template, translations.get(&entry.key)) {
                        (true, _) => "",
                        (false, Some(translated)) => translated.as_str(),
                        (false, None) => plural,
                    };
                    write_keyword(&mut out, "msgstr[0]", text);
                    write_keyword(&mut out, "msgstr[1]", plural_text);
                }
                None => write_keyword(&mut out, "msgstr", text),
            }
        }
        Ok(out)
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut has_msgid = false;
        let mut has_msgstr = false;
        let mut block_start = 0;
        let mut saw_header = false;

        let close_block =
            |report: &mut ValidationReport, has_msgid: bool, has_msgstr: bool, line: usize| {
                if has_msgid && !has_msgstr {
                    report.error(Some(line), "msgid without msgstr");
                }
            };

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            let line_no = index + 1;
            if line.is_empty() {
                close_block(&mut report, has_msgid, has_msgstr, block_start);
                has_msgid = false;
                has_msgstr = false;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if line.starts_with("msgid") && !line.starts_with("msgid_plural") {
                if has_msgstr {
                    close_block(&mut report, has_msgid, has_msgstr, block_start);
                    has_msgstr = false;
                }
                has_msgid = true;
                block_start = line_no;
                if line == "msgid \"\"" && !saw_header {
                    saw_header = true;
                }
            } else if line.starts_with("msgstr") {
                if !has_msgid {
                    report.error(Some(line_no), "msgstr without a preceding msgid");
                }
                has_msgstr = true;
            }

            let payload = match keyword(line) {
                Some((_, payload)) => Some(payload),
                None if line.starts_with('"') => Some(line),
                None => {
                    report.warning(Some(line_no), format!("unrecognized line `{}`", line));
                    None
                }
            };
            if let Some(payload) = payload {
                if quoted(payload).is_none() {
                    report.error(Some(line_no), "unterminated or missing string literal");
                }
            }
        }
        close_block(&mut report, has_msgid, has_msgstr, block_start);

        match self.parse(content, &ParseOptions::default()) {
            Ok(result) => {
                if !saw_header && !self.template {
                    report.warning(None, "missing header entry");
                }
                if let Some(language) = &result.metadata.language {
                    if language.parse::<LanguageIdentifier>().is_err() {
                        report.warning(None, format!("invalid Language header `{}`", language));
                    }
                }
                if result.is_empty() {
                    report.warning(None, "no translatable entries found");
                }
            }
            Err(e) => report.error(None, e.to_string()),
        }
        report
    }
}

/// Writes `keyword "value"`, switching to one continuation line per text line
/// for multi-line values.
fn write_keyword(out: &mut String, keyword: &str, value: &str) {
    let pieces = value.split_inclusive('\n').collect::<Vec<_>>();
    if pieces.len() <= 1 {
        writeln!(out, "{} \"{}\"", keyword, escape_po(value)).ok();
        return;
    }
    writeln!(out, "{} \"\"", keyword).ok();
    for piece in pieces {
        writeln!(out, "\"{}\"", escape_po(piece)).ok();
    }
}
