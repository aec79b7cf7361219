//! The unified façade: parse any supported content and write it back.
//!
//! Every function takes the [`Registry`] to dispatch through, so registration
//! order and test isolation stay in the caller's hands.
//!
//! [`parse_file`] resolves a handler in this order:
//!
//! 1. `options.format_hint`, via [`Registry::lookup_format`];
//! 2. the filename extension, via [`Registry::lookup`], so registered dialect
//!    and custom extensions win;
//! 3. [`detect`] on the content.
//!
//! When no handler is found or the handler fails, JSON and then INI are tried;
//! a fallback only counts when it yields at least one entry.

use crate::{
    detect::{detect, extension_of},
    error::Error,
    formats::FormatType,
    options::{ParseOptions, WriteOptions},
    registry::{Plugin, Registry},
    traits::decode_bytes,
    types::{ParseResult, Translations, ValidationReport},
};

const FALLBACKS: [FormatType; 2] = [FormatType::Json, FormatType::Ini];

fn resolve<'r>(
    registry: &'r Registry,
    content: &str,
    filename: Option<&str>,
    hint: Option<FormatType>,
) -> Option<&'r Plugin> {
    if let Some(plugin) = hint.and_then(|format| registry.lookup_format(format)) {
        tracing::debug!("using {} from format hint", plugin.id);
        return Some(plugin);
    }
    if let Some(plugin) = filename
        .and_then(extension_of)
        .and_then(|ext| registry.lookup(&ext))
    {
        tracing::debug!("using {} from filename extension", plugin.id);
        return Some(plugin);
    }
    let plugin = registry.lookup_format(detect(content, filename));
    if let Some(plugin) = plugin {
        tracing::debug!("using {} from content detection", plugin.id);
    }
    plugin
}

/// Parses `content` into a [`ParseResult`].
///
/// Unlike [`parse_file_lenient`], failure is explicit: when neither the
/// resolved handler nor a fallback produced a result, the error carries the
/// reason.
///
/// # Example
/// ```rust
/// use locfmt::{parse_file, ParseOptions, Registry};
///
/// let registry = Registry::with_builtins();
/// let parsed = parse_file(
///     &registry,
///     "msgid \"Hello\"\nmsgstr \"Ciao\"\n",
///     Some("it.po"),
///     &ParseOptions::default(),
/// )?;
/// assert_eq!(parsed.get("Hello").unwrap().target.as_deref(), Some("Ciao"));
/// # Ok::<(), locfmt::Error>(())
/// ```
pub fn parse_file(
    registry: &Registry,
    content: &str,
    filename: Option<&str>,
    options: &ParseOptions,
) -> Result<ParseResult, Error> {
    let mut tried = None;
    let mut reason = match resolve(registry, content, filename, options.format_hint) {
        Some(plugin) => match plugin.codec.parse(content, options) {
            Ok(result) => return Ok(result),
            Err(e) => {
                tracing::warn!("{} failed to parse {:?}: {}", plugin.id, filename, e);
                tried = Some(plugin.format_type());
                format!("{} parser failed: {}", plugin.format_type(), e)
            }
        },
        None => format!("no handler for {}", filename.unwrap_or("content")),
    };

    for format in FALLBACKS {
        if tried == Some(format) {
            continue;
        }
        let Some(plugin) = registry.lookup_format(format) else {
            continue;
        };
        match plugin.codec.parse(content, options) {
            Ok(result) if !result.is_empty() => {
                tracing::warn!("parsed {:?} with the {} fallback", filename, format);
                return Ok(result);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("{} fallback failed: {}", format, e),
        }
    }

    reason.push_str("; JSON and INI fallbacks found nothing");
    Err(Error::unrecognized(reason))
}

/// [`parse_file`] that never fails: any error becomes an empty result of
/// format [`FormatType::Unknown`].
pub fn parse_file_lenient(
    registry: &Registry,
    content: &str,
    filename: Option<&str>,
    options: &ParseOptions,
) -> ParseResult {
    parse_file(registry, content, filename, options).unwrap_or_else(|e| {
        tracing::warn!("returning empty result: {}", e);
        ParseResult::empty(FormatType::Unknown)
    })
}

/// Decodes `bytes` (UTF-8, or UTF-8/UTF-16 with a byte order mark) and parses
/// the text with [`parse_file`].
pub fn parse_bytes(
    registry: &Registry,
    bytes: &[u8],
    filename: Option<&str>,
    options: &ParseOptions,
) -> Result<ParseResult, Error> {
    let content = decode_bytes(bytes)?;
    parse_file(registry, &content, filename, options)
}

/// Serializes `result` in the format it was parsed from, writing each entry's
/// override from `translations` when present and its source otherwise.
pub fn write_file(
    registry: &Registry,
    result: &ParseResult,
    translations: &Translations,
    options: &WriteOptions,
) -> Result<String, Error> {
    let plugin = registry.lookup_format(result.format).ok_or_else(|| {
        Error::UnsupportedFormat(format!("no handler writes {}", result.format))
    })?;
    plugin.codec.serialize(result, translations, options)
}

/// [`write_file`] that returns an empty string on failure.
pub fn write_file_lenient(
    registry: &Registry,
    result: &ParseResult,
    translations: &Translations,
    options: &WriteOptions,
) -> String {
    write_file(registry, result, translations, options).unwrap_or_else(|e| {
        tracing::warn!("returning empty output: {}", e);
        String::new()
    })
}

/// Strict validation of `content` with the handler [`parse_file`] would pick.
pub fn validate(registry: &Registry, content: &str, filename: Option<&str>) -> ValidationReport {
    match resolve(registry, content, filename, None) {
        Some(plugin) => plugin.codec.validate(content),
        None => {
            let mut report = ValidationReport::new();
            report.error(None, "unrecognized format");
            report
        }
    }
}
