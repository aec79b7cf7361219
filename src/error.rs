//! All error types for the locfmt crate.
//!
//! These are returned from every fallible operation (detection, parsing,
//! serialization, registry dispatch). The lenient façade entry points turn them
//! into empty results instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    DataMismatch(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unrecognized content: {reason}")]
    Unrecognized { reason: String },
}

impl Error {
    /// Creates a new validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Creates the façade's failure-with-reason error.
    pub fn unrecognized(reason: impl Into<String>) -> Self {
        Error::Unrecognized {
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Error::DataMismatch(value.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(value: quick_xml::escape::EscapeError) -> Self {
        Error::DataMismatch(value.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Error::DataMismatch(value.to_string())
    }
}
