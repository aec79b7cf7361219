//! Support for Java `.properties` files.

use crate::{
    error::Error,
    escape::{escape_properties, unescape_properties},
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

/// Whether a physical line ends in an odd number of backslashes.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped `=`, `:` or whitespace. A
/// whitespace terminator may still be followed by one `=` or `:`.
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], &line[i + 1..]),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Properties
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        let mut comments: Vec<String> = Vec::new();
        let mut lines = content.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                comments.clear();
                continue;
            }
            if let Some(comment) = trimmed
                .strip_prefix('#')
                .or_else(|| trimmed.strip_prefix('!'))
            {
                comments.push(comment.trim().to_string());
                continue;
            }

            let mut logical = trimmed.to_string();
            while continues(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_pair(&logical);
            let key = unescape_properties(key.trim_end());
            if key.is_empty() {
                continue;
            }
            let value = unescape_properties(value.trim_start());
            let comment = (!comments.is_empty()).then(|| comments.join("\n"));
            comments.clear();
            entries.push(
                Entry::new(key, value)
                    .with_comment(comment)
                    .with_meta("line", index + 1),
            );
        }

        Ok(
            ParseResult::new(FormatType::Properties, entries.into_vec(), Metadata::default())
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        // Entries sharing the prefix before their first dot are written together.
        let mut groups: Vec<(&str, Vec<&Entry>)> = Vec::new();
        for entry in &result.entries {
            let prefix = entry.key.split_once('.').map_or("", |(p, _)| p);
            match groups.iter_mut().find(|(p, _)| *p == prefix) {
                Some((_, members)) => members.push(entry),
                None => groups.push((prefix, vec![entry])),
            }
        }

        let mut out = String::new();
        for (i, (_, members)) in groups.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for entry in members {
                if options.preserve_comments {
                    if let Some(comment) = &entry.comment {
                        for line in comment.lines() {
                            out.push_str(&format!("# {}\n", line));
                        }
                    }
                }
                let key = escape_properties(&entry.key).replace(' ', "\\ ");
                let value = escape_properties(entry.resolve(translations));
                // A leading space in the value would be eaten by the parser.
                let value = match value.strip_prefix(' ') {
                    Some(rest) => format!("\\ {}", rest),
                    None => value,
                };
                out.push_str(&format!("{}={}\n", key, value));
            }
        }
        Ok(out)
    }
}
