//! Placeholder for Unreal Engine `.locres` tables.
//!
//! `.locres` is a binary, versioned format. Parsing it yields no entries and a
//! note saying so; serializing hands back the retained content untouched.

use crate::{
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Metadata, ParseResult, Translations, ValidationReport},
};

const NOTE: &str = "Unreal .locres tables are binary; export them to .po or .csv with the Unreal localization dashboard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Locres
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        tracing::warn!("{}", NOTE);
        let metadata = Metadata {
            note: Some(NOTE.to_string()),
            ..Default::default()
        };
        Ok(ParseResult::new(FormatType::Locres, Vec::new(), metadata)
            .with_raw(options.retain_raw.then(|| content.to_string())))
    }

    fn serialize(
        &self,
        result: &ParseResult,
        _translations: &Translations,
        _options: &WriteOptions,
    ) -> Result<String, Error> {
        Ok(result.raw.clone().unwrap_or_default())
    }

    fn validate(&self, _content: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.warning(None, NOTE);
        report
    }
}
