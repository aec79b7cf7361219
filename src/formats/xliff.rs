//! Support for XLIFF 1.2 and 2.0.
//!
//! Both `<trans-unit>` (1.2) and `<unit>`/`<segment>` (2.0) shapes are read.
//! Output is always XLIFF 1.2.

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Source,
    Target,
    Note,
    Context,
}

#[derive(Debug, Default)]
struct Unit {
    id: String,
    source: Option<String>,
    target: Option<String>,
    notes: Vec<String>,
    context: Option<String>,
    seen_source: bool,
    seen_target: bool,
}

impl Unit {
    fn buffer(&mut self, capture: Capture) -> &mut String {
        match capture {
            Capture::Source => self.source.get_or_insert_with(String::new),
            Capture::Target => self.target.get_or_insert_with(String::new),
            Capture::Context => self.context.get_or_insert_with(String::new),
            Capture::Note => {
                if self.notes.is_empty() {
                    self.notes.push(String::new());
                }
                let last = self.notes.len() - 1;
                &mut self.notes[last]
            }
        }
    }

    fn into_entry(self, index: usize) -> Option<Entry> {
        let source = self.source?;
        let key = if self.id.is_empty() {
            format!("unit-{}", index)
        } else {
            self.id
        };
        let notes = self
            .notes
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>();
        Some(
            Entry::new(key, source.clone())
                .with_target(self.target)
                .with_context(self.context.map(|c| c.trim().to_string()))
                .with_comment(Some(notes.join("\n")))
                .with_meta("source", source),
        )
    }
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, Error> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

fn read_units(content: &str, metadata: &mut Metadata, entries: &mut EntryList) -> Result<(), Error> {
    let mut reader = Reader::from_str(content);
    let mut unit: Option<Unit> = None;
    // Open elements inside the current unit, the unit itself first.
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut capture: Option<(Capture, usize)> = None;
    let mut count = 0;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = e.local_name().as_ref().to_vec();
                match unit.as_mut() {
                    Some(u) => {
                        if capture.is_none() {
                            capture = capture_for(u, &name, &path).map(|c| (c, path.len() + 1));
                        }
                        path.push(name);
                    }
                    None => match name.as_slice() {
                        b"xliff" => {
                            metadata.source_language = attribute(e, b"srcLang")?;
                            metadata.target_language = attribute(e, b"trgLang")?;
                        }
                        b"file" => {
                            if let Some(lang) = attribute(e, b"source-language")? {
                                metadata.source_language.get_or_insert(lang);
                            }
                            if let Some(lang) = attribute(e, b"target-language")? {
                                metadata.target_language.get_or_insert(lang);
                            }
                        }
                        b"trans-unit" | b"unit" => {
                            unit = Some(Unit {
                                id: attribute(e, b"id")?.unwrap_or_default(),
                                ..Default::default()
                            });
                            path.push(name);
                        }
                        _ => {}
                    },
                }
            }
            Event::Text(ref e) => {
                if let (Some(u), Some((c, _))) = (unit.as_mut(), capture) {
                    u.buffer(c).push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let (Some(u), Some((c, _))) = (unit.as_mut(), capture) {
                    u.buffer(c).push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) if unit.is_some() => {
                if capture.is_some_and(|(_, depth)| depth == path.len()) {
                    capture = None;
                }
                path.pop();
                if path.is_empty() {
                    if let Some(done) = unit.take() {
                        count += 1;
                        match done.into_entry(count) {
                            Some(entry) => entries.push(entry),
                            None => tracing::debug!("skipping XLIFF unit without <source>"),
                        }
                    }
                    capture = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Decides whether an element opened inside a unit holds unit text.
///
/// Only the first `<source>`/`<target>` directly under `<trans-unit>` or
/// `<segment>` count; anything under `<alt-trans>` is a suggestion and ignored.
fn capture_for(unit: &mut Unit, name: &[u8], path: &[Vec<u8>]) -> Option<Capture> {
    if path.iter().any(|p| p == b"alt-trans") {
        return None;
    }
    let parent = path.last().map(Vec::as_slice);
    let owns_text = matches!(parent, Some(b"trans-unit") | Some(b"segment"));
    match name {
        b"source" if owns_text && !unit.seen_source => {
            unit.seen_source = true;
            Some(Capture::Source)
        }
        b"target" if owns_text && !unit.seen_target => {
            unit.seen_target = true;
            Some(Capture::Target)
        }
        b"note" if matches!(parent, Some(b"trans-unit") | Some(b"notes")) => {
            unit.notes.push(String::new());
            Some(Capture::Note)
        }
        b"context" if parent == Some(b"context-group") => Some(Capture::Context),
        _ => None,
    }
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Xliff
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut metadata = Metadata::default();
        let mut entries = EntryList::new();

        if let Err(e) = read_units(content, &mut metadata, &mut entries) {
            if entries.is_empty() {
                return Err(e);
            }
            tracing::warn!("XLIFF document truncated by XML error: {}", e);
            metadata.note = Some(format!("document truncated at XML error: {}", e));
        }

        Ok(
            ParseResult::new(FormatType::Xliff, entries.into_vec(), metadata)
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let mut buffer = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut xliff = BytesStart::new("xliff");
        xliff.push_attribute(("version", "1.2"));
        xliff.push_attribute(("xmlns", "urn:oasis:names:tc:xliff:document:1.2"));
        writer.write_event(Event::Start(xliff))?;

        let source_language = result
            .metadata
            .source_language
            .as_deref()
            .or(result.metadata.language.as_deref())
            .unwrap_or("en");
        let target_language = options
            .language
            .as_deref()
            .or(result.metadata.target_language.as_deref());

        let mut file = BytesStart::new("file");
        file.push_attribute(("source-language", source_language));
        if let Some(target) = target_language {
            file.push_attribute(("target-language", target));
        }
        file.push_attribute(("datatype", "plaintext"));
        file.push_attribute((
            "original",
            result.metadata.project_name.as_deref().unwrap_or("messages"),
        ));
        writer.write_event(Event::Start(file))?;
        writer.write_event(Event::Start(BytesStart::new("body")))?;

        for entry in &result.entries {
            let mut unit = BytesStart::new("trans-unit");
            unit.push_attribute(("id", entry.key.as_str()));
            writer.write_event(Event::Start(unit))?;

            let source = entry.meta("source").unwrap_or(&entry.source);
            write_text_element(&mut writer, "source", source)?;
            write_text_element(&mut writer, "target", entry.resolve(translations))?;

            if let Some(context) = &entry.context {
                let mut group = BytesStart::new("context-group");
                group.push_attribute(("purpose", "information"));
                writer.write_event(Event::Start(group))?;
                let mut ctx = BytesStart::new("context");
                ctx.push_attribute(("context-type", "x-context"));
                writer.write_event(Event::Start(ctx))?;
                writer.write_event(Event::Text(BytesText::new(context)))?;
                writer.write_event(Event::End(BytesEnd::new("context")))?;
                writer.write_event(Event::End(BytesEnd::new("context-group")))?;
            }
            if options.preserve_comments {
                if let Some(comment) = &entry.comment {
                    write_text_element(&mut writer, "note", comment)?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new("trans-unit")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("body")))?;
        writer.write_event(Event::End(BytesEnd::new("file")))?;
        writer.write_event(Event::End(BytesEnd::new("xliff")))?;

        let mut out = String::from_utf8(buffer)?;
        out.push('\n');
        Ok(out)
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_well_formed(content, &mut report);
        if report.valid {
            if !content.contains("<xliff") {
                report.warning(None, "no <xliff> root element");
            }
            match self.parse(content, &ParseOptions::default()) {
                Ok(result) if result.is_empty() => {
                    report.warning(None, "no translation units found")
                }
                Ok(_) => {}
                Err(e) => report.error(None, e.to_string()),
            }
        }
        report
    }
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Reads the whole document, recording the first XML error with its line.
pub(crate) fn check_well_formed(content: &str, report: &mut ValidationReport) {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                let position = reader.error_position() as usize;
                let line = content[..position.min(content.len())].matches('\n').count() + 1;
                report.error(Some(line), format!("malformed XML: {}", e));
                break;
            }
        }
    }
}
