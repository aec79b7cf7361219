//! The format-agnostic parse/serialize seam of locfmt.

use std::io::Read;

use crate::{
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    types::{ParseResult, Translations, ValidationReport},
};

/// A parser/serializer pair for one localization format.
///
/// Implementations are stateless and pure: no I/O, no shared mutable state, so
/// one instance can serve any number of threads.
///
/// # Example
///
/// ```rust
/// use locfmt::{formats::PropertiesFormat, traits::FormatCodec, ParseOptions, WriteOptions};
/// use std::collections::HashMap;
///
/// let parsed = PropertiesFormat.parse("greeting=Hello", &ParseOptions::default())?;
/// let mut overrides = HashMap::new();
/// overrides.insert("greeting".to_string(), "Ciao".to_string());
/// let out = PropertiesFormat.serialize(&parsed, &overrides, &WriteOptions::default())?;
/// assert!(out.contains("greeting=Ciao"));
/// # Ok::<(), locfmt::Error>(())
/// ```
pub trait FormatCodec: Send + Sync {
    /// The format this codec produces and consumes.
    fn format_type(&self) -> FormatType;

    /// Parse in-memory content into a [`ParseResult`].
    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error>;

    /// Serialize `result`, writing each entry's override from `translations`
    /// when present and its source otherwise.
    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error>;

    /// Strict, opt-in validation. The default parses and reports failures.
    fn validate(&self, content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self.parse(content, &ParseOptions::default()) {
            Ok(result) if result.is_empty() => {
                report.warning(None, "no translatable entries found");
            }
            Ok(_) => {}
            Err(e) => report.error(None, e.to_string()),
        }
        report
    }

    /// Parse from bytes, honoring a UTF-8 or UTF-16 byte order mark.
    fn parse_bytes(&self, bytes: &[u8], options: &ParseOptions) -> Result<ParseResult, Error> {
        let content = decode_bytes(bytes)?;
        self.parse(&content, options)
    }
}

/// Decodes raw file bytes to text: a BOM selects UTF-8/UTF-16, otherwise the
/// input must already be UTF-8.
pub fn decode_bytes(bytes: &[u8]) -> Result<String, Error> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        tracing::debug!("decoding input with BOM as {}", encoding.name());
    }
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .bom_override(true)
        .build(bytes);

    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).map_err(Error::Io)?;
    Ok(decoded)
}
