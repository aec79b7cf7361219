//! The format registry: an extension → codec lookup table owned by the host.
//!
//! There is no global instance. Build one with [`Registry::with_builtins`] at
//! start-up and pass it by reference to the [`crate::codec`] functions.
//! Registration takes `&mut self`, so the borrow checker serializes writers.

use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    formats::{
        CsvFormat, FormatType, GodotFormat, IniFormat, JsonFormat, LocresFormat, PoFormat,
        PropertiesFormat, RenPyFormat, ResxFormat, RpgMakerFormat, StringsFormat,
        TelltaleFormat, UnityFormat, XliffFormat, YamlFormat,
    },
    traits::FormatCodec,
};

/// Ids with this prefix cannot be removed, only shadowed.
pub const BUILTIN_PREFIX: &str = "builtin-";

/// One registered handler.
#[derive(Clone)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Lower-case, without the leading dot.
    pub extensions: Vec<String>,
    pub codec: Arc<dyn FormatCodec>,
}

impl Plugin {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        extensions: &[&str],
        codec: impl FormatCodec + 'static,
    ) -> Self {
        Plugin {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            extensions: extensions.iter().map(|e| normalize_extension(e)).collect(),
            codec: Arc::new(codec),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_builtin(&self) -> bool {
        self.id.starts_with(BUILTIN_PREFIX)
    }

    pub fn format_type(&self) -> FormatType {
        self.codec.format_type()
    }

    pub fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            extensions: self.extensions.clone(),
            format: self.format_type(),
            builtin: self.is_builtin(),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("extensions", &self.extensions)
            .field("format", &self.format_type())
            .finish()
    }
}

/// The data half of a [`Plugin`], for hosts that persist what is registered.
///
/// A descriptor cannot rebuild a plugin: the codec is code, so only builtins
/// are functional again after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub extensions: Vec<String>,
    pub format: FormatType,
    pub builtin: bool,
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    /// In registration order; a re-registered id keeps its slot.
    plugins: Vec<Plugin>,
    /// Extension → id of the plugin that claimed it last.
    by_extension: HashMap<String, String>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin codec.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for plugin in builtin_plugins() {
            registry.register(plugin);
        }
        registry
    }

    /// Stores `plugin` under its id and points each of its extensions at it.
    ///
    /// Plugins that claimed the same extensions earlier stay registered under
    /// their own ids; they just stop winning [`Registry::lookup`].
    pub fn register(&mut self, plugin: Plugin) {
        tracing::debug!(
            "registering plugin {} for {:?}",
            plugin.id,
            plugin.extensions
        );
        for extension in &plugin.extensions {
            self.by_extension
                .insert(extension.clone(), plugin.id.clone());
        }
        match self.plugins.iter_mut().find(|p| p.id == plugin.id) {
            Some(slot) => *slot = plugin,
            None => self.plugins.push(plugin),
        }
    }

    /// The plugin that claimed `extension` last. Case and a leading dot are
    /// ignored.
    pub fn lookup(&self, extension: &str) -> Option<&Plugin> {
        let id = self.by_extension.get(&normalize_extension(extension))?;
        self.get(id)
    }

    /// The most recently registered plugin whose codec produces `format`.
    pub fn lookup_format(&self, format: FormatType) -> Option<&Plugin> {
        self.plugins
            .iter()
            .rev()
            .find(|p| p.format_type() == format)
    }

    pub fn get(&self, id: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Removes a non-builtin plugin. Returns `false`, changing nothing, for
    /// builtin or unknown ids.
    ///
    /// Each extension the plugin held falls back to the latest remaining
    /// plugin that lists it.
    pub fn remove(&mut self, id: &str) -> bool {
        if id.starts_with(BUILTIN_PREFIX) {
            tracing::debug!("refusing to remove builtin plugin {}", id);
            return false;
        }
        let Some(index) = self.plugins.iter().position(|p| p.id == id) else {
            return false;
        };
        let removed = self.plugins.remove(index);

        for extension in &removed.extensions {
            if self.by_extension.get(extension).map(String::as_str) != Some(id) {
                continue;
            }
            let heir = self
                .plugins
                .iter()
                .rev()
                .find(|p| p.extensions.contains(extension))
                .map(|p| p.id.clone());
            match heir {
                Some(heir) => {
                    self.by_extension.insert(extension.clone(), heir);
                }
                None => {
                    self.by_extension.remove(extension);
                }
            }
        }
        true
    }

    /// Plugins whose codec produces `format`, in registration order.
    pub fn list_by_type(&self, format: FormatType) -> Vec<&Plugin> {
        self.plugins
            .iter()
            .filter(|p| p.format_type() == format)
            .collect()
    }

    /// Every plugin, in registration order.
    pub fn list_all(&self) -> Vec<&Plugin> {
        self.plugins.iter().collect()
    }

    /// Every extension with a handler, sorted.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = self.by_extension.keys().cloned().collect::<Vec<_>>();
        extensions.sort();
        extensions
    }

    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.plugins.iter().map(Plugin::descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn builtin_plugins() -> Vec<Plugin> {
    vec![
        Plugin::new("builtin-po", "GNU gettext catalog", &["po"], PoFormat::po()),
        Plugin::new("builtin-pot", "GNU gettext template", &["pot"], PoFormat::pot()),
        Plugin::new("builtin-xliff", "XLIFF", &["xlf", "xliff"], XliffFormat),
        Plugin::new("builtin-resx", ".NET resources", &["resx"], ResxFormat),
        Plugin::new("builtin-strings", "Apple strings", &["strings"], StringsFormat),
        Plugin::new("builtin-json", "JSON", &["json"], JsonFormat),
        Plugin::new("builtin-yaml", "YAML", &["yaml", "yml"], YamlFormat),
        Plugin::new("builtin-ini", "INI", &["ini"], IniFormat),
        Plugin::new(
            "builtin-properties",
            "Java properties",
            &["properties"],
            PropertiesFormat,
        ),
        Plugin::new("builtin-csv", "CSV", &["csv"], CsvFormat),
        Plugin::new("builtin-unity", "Unity text", &["asset", "prefab"], UnityFormat)
            .with_description("m_Text fields and XUnity.AutoTranslator dumps"),
        Plugin::new("builtin-rpgmaker", "RPG Maker MV/MZ", &[], RpgMakerFormat)
            .with_description("database and map JSON; select with a format hint"),
        Plugin::new(
            "builtin-telltale",
            "Telltale text",
            &["langdb", "landb", "dlog"],
            TelltaleFormat,
        ),
        Plugin::new(
            "builtin-godot",
            "Godot resources",
            &["tres", "tscn", "cfg", "translation"],
            GodotFormat,
        ),
        Plugin::new("builtin-renpy", "Ren'Py scripts", &["rpy"], RenPyFormat),
        Plugin::new("builtin-locres", "Unreal locres", &["locres"], LocresFormat)
            .with_description("binary; parsing is not supported"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_every_codec_format() {
        let registry = Registry::with_builtins();
        for format in FormatType::ALL {
            let expected = !matches!(format, FormatType::Xml | FormatType::Unknown);
            assert_eq!(registry.lookup_format(format).is_some(), expected, "{}", format);
        }
    }

    #[test]
    fn test_lookup_normalizes_extension() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.lookup(".PO").unwrap().id, "builtin-po");
        assert_eq!(registry.lookup("tscn").unwrap().id, "builtin-godot");
        assert!(registry.lookup("docx").is_none());
    }

    #[test]
    fn test_later_registration_wins_lookup() {
        let mut registry = Registry::with_builtins();
        registry.register(Plugin::new("custom-json", "My JSON", &[".JSON"], JsonFormat));
        assert_eq!(registry.lookup(".json").unwrap().id, "custom-json");
        assert!(registry.get("builtin-json").is_some());
    }

    #[test]
    fn test_builtins_cannot_be_removed() {
        let mut registry = Registry::with_builtins();
        assert!(!registry.remove("builtin-json"));
        assert_eq!(registry.lookup("json").unwrap().id, "builtin-json");
    }

    #[test]
    fn test_remove_restores_previous_claimant() {
        let mut registry = Registry::with_builtins();
        registry.register(Plugin::new("custom-json", "My JSON", &["json", "json5"], JsonFormat));
        assert!(registry.remove("custom-json"));
        assert_eq!(registry.lookup("json").unwrap().id, "builtin-json");
        assert!(registry.lookup("json5").is_none());
        assert!(!registry.remove("custom-json"));
    }

    #[test]
    fn test_reregistering_id_replaces_in_place() {
        let mut registry = Registry::new();
        registry.register(Plugin::new("custom", "A", &["a"], IniFormat));
        registry.register(Plugin::new("other", "B", &["b"], IniFormat));
        registry.register(Plugin::new("custom", "A2", &["a"], PropertiesFormat));
        let ids = registry.list_all().iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["custom", "other"]);
        assert_eq!(registry.lookup("a").unwrap().format_type(), FormatType::Properties);
    }

    #[test]
    fn test_list_by_type_and_extensions() {
        let registry = Registry::with_builtins();
        let po = registry.list_by_type(FormatType::Po);
        assert_eq!(po.len(), 1);
        assert_eq!(po[0].id, "builtin-po");

        let extensions = registry.supported_extensions();
        assert!(extensions.contains(&"rpy".to_string()));
        assert!(extensions.contains(&"yml".to_string()));
        assert!(extensions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_descriptors_serialize() {
        let registry = Registry::with_builtins();
        let descriptor = registry.get("builtin-renpy").unwrap().descriptor();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["format"], "renpy");
        assert_eq!(json["builtin"], true);
        assert_eq!(json["extensions"][0], "rpy");
        assert_eq!(registry.descriptors().len(), registry.len());
    }
}
