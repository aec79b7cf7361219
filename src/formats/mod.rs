//! All supported localization file formats for locfmt.
//!
//! This module re-exports the codec type of each format and provides the
//! [`FormatType`] enum used for detection, registry lookup and dispatch.

pub mod csv;
pub mod godot;
pub mod ini;
pub mod json;
pub mod locres;
pub mod po;
pub mod properties;
pub mod renpy;
pub mod resx;
pub mod rpgmaker;
pub mod strings;
pub mod telltale;
pub mod unity;
pub mod xliff;
pub mod yaml;

mod patch;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

// Reexporting the formats for easier access
pub use csv::Format as CsvFormat;
pub use godot::Format as GodotFormat;
pub use ini::Format as IniFormat;
pub use json::Format as JsonFormat;
pub use locres::Format as LocresFormat;
pub use po::Format as PoFormat;
pub use properties::Format as PropertiesFormat;
pub use renpy::Format as RenPyFormat;
pub use resx::Format as ResxFormat;
pub use rpgmaker::Format as RpgMakerFormat;
pub use strings::Format as StringsFormat;
pub use telltale::Format as TelltaleFormat;
pub use unity::Format as UnityFormat;
pub use xliff::Format as XliffFormat;
pub use yaml::Format as YamlFormat;

use crate::Error;

/// Every format the engine can name.
///
/// `Xml` and `Unknown` are detector outcomes only; no builtin codec handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// GNU gettext catalog.
    Po,
    /// GNU gettext template.
    Pot,
    Xliff,
    /// .NET resource file.
    Resx,
    /// Apple `.strings`.
    Strings,
    Json,
    Yaml,
    Ini,
    /// Java `.properties`.
    Properties,
    Csv,
    /// Generic XML the detector could not narrow down.
    Xml,
    /// Unity serialized text fields and XUnity translation dumps.
    Unity,
    /// RPG Maker MV/MZ database and map JSON.
    RpgMaker,
    /// Telltale `langdb`/`dlog` text.
    Telltale,
    /// Godot resources and scenes.
    Godot,
    /// Ren'Py scripts.
    RenPy,
    /// Unreal `.locres` (stubbed).
    Locres,
    Unknown,
}

impl FormatType {
    pub const ALL: [FormatType; 18] = [
        FormatType::Po,
        FormatType::Pot,
        FormatType::Xliff,
        FormatType::Resx,
        FormatType::Strings,
        FormatType::Json,
        FormatType::Yaml,
        FormatType::Ini,
        FormatType::Properties,
        FormatType::Csv,
        FormatType::Xml,
        FormatType::Unity,
        FormatType::RpgMaker,
        FormatType::Telltale,
        FormatType::Godot,
        FormatType::RenPy,
        FormatType::Locres,
        FormatType::Unknown,
    ];

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Po => "po",
            FormatType::Pot => "pot",
            FormatType::Xliff => "xlf",
            FormatType::Resx => "resx",
            FormatType::Strings => "strings",
            FormatType::Json => "json",
            FormatType::Yaml => "yaml",
            FormatType::Ini => "ini",
            FormatType::Properties => "properties",
            FormatType::Csv => "csv",
            FormatType::Xml => "xml",
            FormatType::Unity => "asset",
            FormatType::RpgMaker => "json",
            FormatType::Telltale => "langdb",
            FormatType::Godot => "tres",
            FormatType::RenPy => "rpy",
            FormatType::Locres => "locres",
            FormatType::Unknown => "",
        }
    }

    /// Whether this format is a heuristic game-engine dialect.
    pub fn is_dialect(&self) -> bool {
        matches!(
            self,
            FormatType::Unity
                | FormatType::RpgMaker
                | FormatType::Telltale
                | FormatType::Godot
                | FormatType::RenPy
                | FormatType::Locres
        )
    }
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use locfmt::formats::FormatType;
/// assert_eq!(FormatType::Po.to_string(), "po");
/// assert_eq!(FormatType::RenPy.to_string(), "renpy");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatType::Po => "po",
            FormatType::Pot => "pot",
            FormatType::Xliff => "xliff",
            FormatType::Resx => "resx",
            FormatType::Strings => "strings",
            FormatType::Json => "json",
            FormatType::Yaml => "yaml",
            FormatType::Ini => "ini",
            FormatType::Properties => "properties",
            FormatType::Csv => "csv",
            FormatType::Xml => "xml",
            FormatType::Unity => "unity",
            FormatType::RpgMaker => "rpgmaker",
            FormatType::Telltale => "telltale",
            FormatType::Godot => "godot",
            FormatType::RenPy => "renpy",
            FormatType::Locres => "locres",
            FormatType::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts display names and a few common aliases, case-insensitively.
/// Returns [`crate::error::Error::UnknownFormat`] for unknown strings.
///
/// # Example
/// ```rust
/// use locfmt::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("XLF").unwrap(), FormatType::Xliff);
/// assert_eq!(FormatType::from_str("gettext").unwrap(), FormatType::Po);
/// assert!(FormatType::from_str("foobar").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match s.as_str() {
            "po" | "gettext" => Ok(FormatType::Po),
            "pot" => Ok(FormatType::Pot),
            "xliff" | "xlf" => Ok(FormatType::Xliff),
            "resx" => Ok(FormatType::Resx),
            "strings" => Ok(FormatType::Strings),
            "json" => Ok(FormatType::Json),
            "yaml" | "yml" => Ok(FormatType::Yaml),
            "ini" => Ok(FormatType::Ini),
            "properties" => Ok(FormatType::Properties),
            "csv" => Ok(FormatType::Csv),
            "xml" => Ok(FormatType::Xml),
            "unity" => Ok(FormatType::Unity),
            "rpgmaker" | "rpg-maker" => Ok(FormatType::RpgMaker),
            "telltale" | "langdb" => Ok(FormatType::Telltale),
            "godot" => Ok(FormatType::Godot),
            "renpy" | "rpy" => Ok(FormatType::RenPy),
            "locres" | "unreal" => Ok(FormatType::Locres),
            "unknown" => Ok(FormatType::Unknown),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}
