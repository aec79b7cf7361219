//! Support for Godot resources and scenes (`.tres`, `.tscn`, `.cfg`,
//! `.translation`).
//!
//! All rules in [`Rule::ORDER`] run over the whole file. `property` and
//! `inline_text` can both match a `text = "..."` line; both entries are kept
//! under distinct keys, and write-back applies the first.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::{FormatType, patch},
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

lazy_static! {
    static ref GETTEXT_PAIR: Regex = Regex::new(
        r#"(?m)^[ \t]*msgid[ \t]+"((?:[^"\\\n]|\\.)*)"[ \t]*\r?\n[ \t]*msgstr[ \t]+"((?:[^"\\\n]|\\.)*)""#
    )
    .unwrap();
    static ref PROPERTY: Regex = Regex::new(
        r#"(?m)^[ \t]*([A-Za-z_][A-Za-z0-9_/]*)[ \t]*=[ \t]*"((?:[^"\\]|\\.)*)"[ \t]*\r?$"#
    )
    .unwrap();
    static ref UI_PROPERTY: Regex = Regex::new(
        r"(?i)(text|title|label|caption|tooltip|hint|placeholder|description|message|dialog|name)"
    )
    .unwrap();
    static ref INLINE_TEXT: Regex =
        Regex::new(r#"\btext[ \t]*=[ \t]*"((?:[^"\\]|\\.)*)""#).unwrap();
    // Scripts embedded in scenes are stored as escaped strings: `tr(\"KEY\")`.
    static ref TR_CALL: Regex =
        Regex::new(r#"\btr\(\s*\\?"((?:[^"\\]|\\.)*?)\\?"\s*\)"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `msgid "..."` directly followed by `msgstr "..."`.
    GettextPair,
    /// Line-anchored `key = "value"` whose key names UI text.
    Property,
    /// `text = "..."` anywhere on a line, inline sub-resources included.
    InlineText,
    /// `tr("...")` call sites in embedded scripts.
    TrCall,
}

impl Rule {
    pub const ORDER: [Rule; 4] = [Rule::GettextPair, Rule::Property, Rule::InlineText, Rule::TrCall];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::GettextPair => "gettext_pair",
            Rule::Property => "property",
            Rule::InlineText => "inline_text",
            Rule::TrCall => "tr_call",
        }
    }

    fn apply(&self, content: &str, entries: &mut EntryList) {
        match self {
            Rule::GettextPair => gettext_pair(content, entries),
            Rule::Property => property(content, entries),
            Rule::InlineText => inline_text(content, entries),
            Rule::TrCall => tr_call(content, entries),
        }
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Resource paths and node references are not player-visible text.
fn is_text(value: &str) -> bool {
    !value.trim().is_empty() && !value.starts_with("res://") && !value.starts_with("uid://")
}

fn gettext_pair(content: &str, entries: &mut EntryList) {
    for caps in GETTEXT_PAIR.captures_iter(content) {
        let (Some(msgid), Some(msgstr)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let source = unescape_po(msgid.as_str());
        if source.is_empty() {
            continue;
        }
        let entry = Entry::new(source.clone(), source)
            .with_target(Some(unescape_po(msgstr.as_str())));
        entries.push(patch::text_anchor(
            entry,
            Rule::GettextPair.name(),
            content,
            msgstr.start(),
            msgstr.as_str(),
        ));
    }
}

fn property(content: &str, entries: &mut EntryList) {
    for caps in PROPERTY.captures_iter(content) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let text = unescape_po(value.as_str());
        if !UI_PROPERTY.is_match(name.as_str()) || !is_text(&text) {
            continue;
        }
        let key = format!("{}:{}", name.as_str(), line_of(content, value.start()));
        entries.push(patch::text_anchor(
            Entry::new(key, text).with_context(Some(name.as_str().to_string())),
            Rule::Property.name(),
            content,
            value.start(),
            value.as_str(),
        ));
    }
}

fn inline_text(content: &str, entries: &mut EntryList) {
    for caps in INLINE_TEXT.captures_iter(content) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let text = unescape_po(value.as_str());
        if !is_text(&text) {
            continue;
        }
        let key = format!("text:{}", line_of(content, value.start()));
        entries.push(patch::text_anchor(
            Entry::new(key, text),
            Rule::InlineText.name(),
            content,
            value.start(),
            value.as_str(),
        ));
    }
}

fn tr_call(content: &str, entries: &mut EntryList) {
    for caps in TR_CALL.captures_iter(content) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let source = unescape_po(value.as_str());
        if source.trim().is_empty() {
            continue;
        }
        // tr() arguments are lookup keys, so they carry no write-back anchor.
        let entry = Entry::new(source.clone(), source)
            .with_meta(patch::RULE, Rule::TrCall.name())
            .with_meta("line", line_of(content, value.start()));
        entries.push_unique_source(entry);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Godot
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        for rule in Rule::ORDER {
            rule.apply(content, &mut entries);
        }

        let metadata = Metadata {
            note: Some("heuristic Godot extraction; overlapping matches are possible".to_string()),
            ..Default::default()
        };
        Ok(
            ParseResult::new(FormatType::Godot, entries.into_vec(), metadata)
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
            return Ok(patch::splice_literals(
                raw,
                &result.entries,
                translations,
                |_, text| escape_po(text),
            ));
        }

        // Without the original resource, emit gettext pairs Godot can import.
        let mut out = String::new();
        for entry in &result.entries {
            out.push_str(&format!(
                "msgid \"{}\"\nmsgstr \"{}\"\n\n",
                escape_po(&entry.source),
                escape_po(entry.resolve(translations))
            ));
        }
        Ok(out)
    }
}
