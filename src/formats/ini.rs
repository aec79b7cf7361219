//! Support for INI files.
//!
//! `[section]` headers scope the keys below them: `key=value` inside a section
//! becomes `section.key` with the section name as context. Values carry no
//! escaping.

use crate::{
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// The section an entry is written under, and its key within that section.
fn placement(entry: &Entry) -> (Option<&str>, &str) {
    match entry.context.as_deref() {
        Some(section) => {
            let key = entry
                .key
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(&entry.key);
            (Some(section), key)
        }
        None => match entry.key.split_once('.') {
            Some((section, key)) if !section.is_empty() && !key.is_empty() => (Some(section), key),
            _ => (None, entry.key.as_str()),
        },
    }
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Ini
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        let mut section: Option<String> = None;
        let mut comments: Vec<String> = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                comments.clear();
                continue;
            }
            if let Some(comment) = trimmed
                .strip_prefix(';')
                .or_else(|| trimmed.strip_prefix('#'))
            {
                comments.push(comment.trim().to_string());
                continue;
            }
            if let Some(name) = section_header(trimmed) {
                section = Some(name.to_string()).filter(|s| !s.is_empty());
                comments.clear();
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                tracing::debug!("skipping INI line {} without '='", index + 1);
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let full_key = match &section {
                Some(section) => format!("{}.{}", section, key),
                None => key.to_string(),
            };
            let comment = (!comments.is_empty()).then(|| comments.join("\n"));
            comments.clear();
            entries.push(
                Entry::new(full_key, value.trim())
                    .with_context(section.clone())
                    .with_comment(comment)
                    .with_meta("line", index + 1),
            );
        }

        Ok(
            ParseResult::new(FormatType::Ini, entries.into_vec(), Metadata::default())
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let mut ungrouped = Vec::new();
        let mut sections: Vec<(&str, Vec<(&str, &Entry)>)> = Vec::new();

        for entry in &result.entries {
            match placement(entry) {
                (None, key) => ungrouped.push((key, entry)),
                (Some(section), key) => match sections.iter_mut().find(|(s, _)| *s == section) {
                    Some((_, members)) => members.push((key, entry)),
                    None => sections.push((section, vec![(key, entry)])),
                },
            }
        }

        let mut out = String::new();
        let write_pair = |out: &mut String, key: &str, entry: &Entry| {
            if options.preserve_comments {
                if let Some(comment) = &entry.comment {
                    for line in comment.lines() {
                        out.push_str(&format!("; {}\n", line));
                    }
                }
            }
            out.push_str(&format!("{}={}\n", key, entry.resolve(translations)));
        };

        for (key, entry) in ungrouped {
            write_pair(&mut out, key, entry);
        }
        for (section, members) in sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            for (key, entry) in members {
                write_pair(&mut out, key, entry);
            }
        }
        Ok(out)
    }
}
