//! Picks a [`FormatType`] from a filename and/or raw content.
//!
//! A recognized filename extension wins outright. Otherwise the trimmed content
//! is sniffed in a fixed precedence order, and [`FormatType::Unknown`] comes
//! back when nothing matches.

use std::path::Path;

use crate::formats::FormatType;

/// Returns the lower-cased extension of `filename`, without the dot.
///
/// # Example
/// ```rust
/// use locfmt::detect::extension_of;
/// assert_eq!(extension_of("locale/it/messages.PO"), Some("po".to_string()));
/// assert_eq!(extension_of("Makefile"), None);
/// ```
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Maps a standard-format extension (with or without leading dot, any case) to
/// its format. Dialect extensions are resolved by the registry instead.
pub fn format_from_extension(extension: &str) -> Option<FormatType> {
    match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "po" => Some(FormatType::Po),
        "pot" => Some(FormatType::Pot),
        "xlf" | "xliff" => Some(FormatType::Xliff),
        "resx" => Some(FormatType::Resx),
        "strings" => Some(FormatType::Strings),
        "json" => Some(FormatType::Json),
        "ini" => Some(FormatType::Ini),
        "csv" => Some(FormatType::Csv),
        "properties" => Some(FormatType::Properties),
        "yaml" | "yml" => Some(FormatType::Yaml),
        _ => None,
    }
}

fn is_section_header(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2 && line.starts_with('[') && line.ends_with(']')
}

fn sniff(content: &str) -> FormatType {
    let trimmed = content.trim();

    if trimmed.starts_with("msgid") || trimmed.lines().any(|l| l.starts_with("msgid ")) {
        return FormatType::Po;
    }
    if trimmed.contains("<xliff") || trimmed.contains("<trans-unit") {
        return FormatType::Xliff;
    }
    if trimmed.contains("<root>") && trimmed.contains("<data name=") {
        return FormatType::Resx;
    }
    if trimmed.starts_with('"') && trimmed.contains("\" = \"") {
        return FormatType::Strings;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return FormatType::Json;
    }
    if trimmed.starts_with('<') {
        return FormatType::Xml;
    }
    if trimmed.contains('=') && !trimmed.contains('<') {
        if trimmed.lines().any(is_section_header) {
            return FormatType::Ini;
        }
        return FormatType::Properties;
    }
    FormatType::Unknown
}

/// Detects the format of `content`, optionally named `filename`.
///
/// # Example
/// ```rust
/// use locfmt::{detect, FormatType};
/// assert_eq!(detect("", Some("file.PO")), FormatType::Po);
/// assert_eq!(detect("{\"a\": \"b\"}", None), FormatType::Json);
/// assert_eq!(detect("; settings\n[app]\ntitle=Hi", None), FormatType::Ini);
/// ```
pub fn detect(content: &str, filename: Option<&str>) -> FormatType {
    if let Some(format) = filename
        .and_then(extension_of)
        .and_then(|ext| format_from_extension(&ext))
    {
        tracing::debug!("format {} chosen from filename extension", format);
        return format;
    }

    let format = sniff(content);
    tracing::debug!("format {} detected from content", format);
    format
}
