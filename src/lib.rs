#![forbid(unsafe_code)]
//! Localization file format engine for Rust.
//!
//! Parses translation catalogs and game-engine text files into one entry model,
//! then writes them back with translated text substituted per key.
//!
//! # Quick Start
//!
//! ```rust
//! use locfmt::{parse_file, write_file, ParseOptions, Registry, Translations, WriteOptions};
//!
//! let registry = Registry::with_builtins();
//! let parsed = parse_file(
//!     &registry,
//!     "[menu]\ntitle = Hello\n",
//!     Some("ui.ini"),
//!     &ParseOptions::default(),
//! )?;
//!
//! let mut translations = Translations::new();
//! translations.insert("menu.title".to_string(), "Ciao".to_string());
//! let out = write_file(&registry, &parsed, &translations, &WriteOptions::default())?;
//! assert_eq!(out, "[menu]\ntitle=Ciao\n");
//! # Ok::<(), locfmt::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **gettext `.po`/`.pot`**: catalogs and templates, plurals and headers included
//! - **XLIFF** 1.2 and 2.0 (written as 1.2)
//! - **`.resx`**: .NET string resources
//! - **Apple `.strings`**
//! - **JSON** and **YAML**: nested objects flattened to dotted keys, or record arrays
//! - **INI**, **Java `.properties`**, **CSV**
//! - **Game engines**: Unity text, RPG Maker MV/MZ data, Telltale text, Godot
//!   resources, Ren'Py scripts. These are heuristic; check `metadata.note`.
//! - **Unreal `.locres`**: recognized, not parsed
//!
//! # Features
//!
//! - Format detection from filename and content
//! - An injected [`Registry`] open to custom codecs
//! - Explicit errors from [`parse_file`], with [`parse_file_lenient`] on top
//! - In-place write-back for game-engine files
//! - Opt-in strict [`validate`]

pub mod codec;
pub mod detect;
pub mod error;
pub mod escape;
pub mod formats;
pub mod options;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    codec::{
        parse_bytes, parse_file, parse_file_lenient, validate, write_file, write_file_lenient,
    },
    detect::detect,
    error::Error,
    formats::FormatType,
    options::{JsonLayout, ParseOptions, WriteOptions},
    registry::{Plugin, PluginDescriptor, Registry},
    traits::FormatCodec,
    types::{
        Entry, Metadata, ParseResult, Translations, ValidationIssue, ValidationReport,
        context_key,
    },
};
