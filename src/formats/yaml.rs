//! Support for YAML string tables.
//!
//! Nested mappings flatten into dotted keys the same way JSON objects do. A
//! document whose only top-level key is a language tag (Rails-style `en:`) is
//! read as that language's table.

use serde_json::Map;
use serde_yaml::Value;
use unic_langid::LanguageIdentifier;

use crate::{
    error::Error,
    formats::{FormatType, json::insert_nested},
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flatten(value: &Value, prefix: String, entries: &mut EntryList) {
    match value {
        Value::Mapping(map) => {
            for (key, val) in map {
                let Some(key) = scalar_key(key) else {
                    tracing::debug!("skipping non-scalar YAML key under {:?}", prefix);
                    continue;
                };
                let new_prefix = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(val, new_prefix, entries);
            }
        }
        Value::String(s) => entries.push(Entry::new(prefix, s.clone())),
        _ => {}
    }
}

/// A lone top-level key that names a language, such as `en` or `pt-BR`.
fn language_root(value: &Value) -> Option<(String, &Value)> {
    let map = value.as_mapping()?;
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    let key = key.as_str()?;
    let langid = key.parse::<LanguageIdentifier>().ok()?;
    // Three-letter roots like `app:` are far more often groups than languages.
    let language = langid.language.as_str();
    let plausible = language.len() == 2 || (language.len() == 3 && key.len() > 3);
    (plausible && inner.is_mapping()).then(|| (key.to_string(), inner))
}

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::Yaml
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ParseResult, Error> {
        let value: Value = serde_yaml::from_str(content)?;

        let mut metadata = Metadata::default();
        let mut entries = EntryList::new();
        match language_root(&value) {
            Some((language, inner)) => {
                tracing::debug!("YAML table rooted at language {}", language);
                metadata.language = Some(language);
                flatten(inner, String::new(), &mut entries);
            }
            None => flatten(&value, String::new(), &mut entries),
        }

        Ok(
            ParseResult::new(FormatType::Yaml, entries.into_vec(), metadata)
                .with_raw(options.retain_raw.then(|| content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        let mut table = Map::new();
        for entry in &result.entries {
            let parts: Vec<&str> = entry.key.split('.').collect();
            insert_nested(
                &mut table,
                &parts,
                serde_json::Value::from(entry.resolve(translations)),
            )?;
        }

        let language = options
            .language
            .as_deref()
            .or(result.metadata.language.as_deref());
        let document = match language {
            Some(language) => {
                let mut root = Map::new();
                root.insert(language.to_string(), serde_json::Value::Object(table));
                root
            }
            None => table,
        };

        Ok(serde_yaml::to_string(&serde_json::Value::Object(document))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_flatten_nested_mapping() {
        let content = indoc! {"
            menu:
              title: Hello
              size: 3
              items:
                open: Open
            bye: Bye
        "};
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            vec!["menu.title", "menu.items.open", "bye"]
        );
        assert_eq!(result.metadata.language, None);
    }

    #[test]
    fn test_rails_language_root() {
        let content = indoc! {"
            pt-BR:
              greeting: Olá
              menu:
                quit: Sair
        "};
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(result.metadata.language.as_deref(), Some("pt-BR"));
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["greeting", "menu.quit"]);
    }

    #[test]
    fn test_single_non_language_root_is_kept() {
        let content = "dialogs:\n  ok: OK\n";
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["dialogs.ok"]);
        assert_eq!(result.metadata.language, None);

        let app = Format.parse("app:\n  name: Demo\n", &ParseOptions::default()).unwrap();
        assert_eq!(app.keys().collect::<Vec<_>>(), vec!["app.name"]);
    }

    #[test]
    fn test_serialize_renests_under_language() {
        let content = "en:\n  menu:\n    title: Hello\n";
        let result = Format.parse(content, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert("menu.title".to_string(), "Ciao: amici".to_string());
        let options = WriteOptions::default().with_language(Some("it".to_string()));
        let out = Format.serialize(&result, &translations, &options).unwrap();
        let reparsed = Format.parse(&out, &ParseOptions::default()).unwrap();
        assert_eq!(reparsed.metadata.language.as_deref(), Some("it"));
        assert_eq!(reparsed.get("menu.title").unwrap().source, "Ciao: amici");
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(matches!(
            Format.parse("a: [unclosed", &ParseOptions::default()),
            Err(Error::Yaml(_))
        ));
    }
}
