//! Support for .NET `.resx` resource files.
//!
//! Only string resources are read; `<data>` elements typed as anything other
//! than `System.String` (images, byte arrays...) are skipped.

use indoc::indoc;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    error::Error,
    escape::escape_xml,
    formats::{FormatType, xliff::check_well_formed},
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations, ValidationReport},
};

const RESX_HEADER: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <root>
      <xsd:schema id="root" xmlns="" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:msdata="urn:schemas-microsoft-com:xml-msdata">
        <xsd:import namespace="http://www.w3.org/XML/1998/namespace" />
        <xsd:element name="root" msdata:IsDataSet="true">
          <xsd:complexType>
            <xsd:choice maxOccurs="unbounded">
              <xsd:element name="data">
                <xsd:complexType>
                  <xsd:sequence>
                    <xsd:element name="value" type="xsd:string" minOccurs="0" msdata:Ordinal="1" />
                    <xsd:element name="comment" type="xsd:string" minOccurs="0" msdata:Ordinal="2" />
                  </xsd:sequence>
                  <xsd:attribute name="name" type="xsd:string" use="required" msdata:Ordinal="1" />
                  <xsd:attribute name="type" type="xsd:string" msdata:Ordinal="3" />
                  <xsd:attribute name="mimetype" type="xsd:string" msdata:Ordinal="4" />
                  <xsd:attribute ref="xml:space" />
                </xsd:complexType>
              </xsd:element>
              <xsd:element name="resheader">
                <xsd:complexType>
                  <xsd:sequence>
                    <xsd:element name="value" type="xsd:string" minOccurs="0" msdata:Ordinal="1" />
                  </xsd:sequence>
                  <xsd:attribute name="name" type="xsd:string" use="required" />
                </xsd:complexType>
              </xsd:element>
            </xsd:choice>
          </xsd:complexType>
        </xsd:element>
      </xsd:schema>
      <resheader name="resmimetype">
        <value>text/microsoft-resx</value>
      </resheader>
      <resheader name="version">
        <value>2.0</value>
      </resheader>
      <resheader name="reader">
        <value>System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
      <resheader name="writer">
        <value>System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
"#};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Value,
    Comment,
}

#[derive(Debug, Default)]
struct Data {
    name: String,
    value: Option<String>,
    comment: Option<String>,
}

fn is_string_resource(e: &BytesStart) -> Result<(String, bool), Error> {
    let mut name = String::new();
    let mut is_string = true;
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = attr.unescape_value()?.to_string(),
            b"type" => {
                is_string = attr.unescape_value()?.starts_with("System.String");
            }
            b"mimetype" => is_string = false,
            _ => {}
        }
    }
    Ok((name, is_string))
}

fn read_data(content: &str, entries: &mut EntryList) -> Result<(), Error> {
    let mut reader = Reader::from_str(content);
    let mut data: Option<Data> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"data" => {
                    let (name, is_string) = is_string_resource(e)?;
                    if is_string && !name.is_empty() {
                        data = Some(Data {
                            name,
                            ..Default::default()
                        });
                    } else {
                        tracing::debug!("skipping non-string resource {:?}", name);
                    }
                }
                b"value" if data.is_some() => capture = Some(Capture::Value),
                b"comment" if data.is_some() => capture = Some(Capture::Comment),
                _ => {}
            },
            Event::Text(ref e) => {
                if let (Some(d), Some(c)) = (data.as_mut(), capture) {
                    let text = e.unescape()?;
                    let slot = match c {
                        Capture::Value => &mut d.value,
                        Capture::Comment => &mut d.comment,
                    };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(e) => {
                if let (Some(d), Some(Capture::Value)) = (data.as_mut(), capture) {
                    d.value
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"value" | b"comment" => capture = None,
                b"data" => {
                    if let Some(d) = data.take() {
                        let source = d.value.unwrap_or_default();
                        entries.push(
                            Entry::new(d.name, source.clone())
                                .with_comment(d.comment.map(|c| c.trim().to_string()))
                                .with_meta("source", source),
                        );
                    }
                    capture = None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Resx
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        let mut metadata = Metadata::default();

        if let Err(e) = read_data(content, &mut entries) {
            if entries.is_empty() {
                return Err(e);
            }
            tracing::warn!("RESX document truncated by XML error: {}", e);
            metadata.note = Some(format!("document truncated at XML error: {}", e));
        }

        Ok(
            ParseResult::new(FormatType::Resx, entries.into_vec(), metadata)
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let mut out = String::from(RESX_HEADER);
        for entry in &result.entries {
            out.push_str(&format!(
                "  <data name=\"{}\" xml:space=\"preserve\">\n",
                escape_xml(&entry.key)
            ));
            out.push_str(&format!(
                "    <value>{}</value>\n",
                escape_xml(entry.resolve(translations))
            ));
            if options.preserve_comments {
                if let Some(comment) = &entry.comment {
                    out.push_str(&format!("    <comment>{}</comment>\n", escape_xml(comment)));
                }
            }
            out.push_str("  </data>\n");
        }
        out.push_str("</root>\n");
        Ok(out)
    }

    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_well_formed(content, &mut report);
        if !report.valid {
            return report;
        }
        if !content.contains("<root") {
            report.warning(None, "no <root> element");
        }
        if !content.contains("text/microsoft-resx") {
            report.warning(None, "missing resmimetype resheader");
        }
        match self.parse(content, &ParseOptions::default()) {
            Ok(result) if result.is_empty() => report.warning(None, "no string resources found"),
            Ok(_) => {}
            Err(e) => report.error(None, e.to_string()),
        }
        report
    }
}
