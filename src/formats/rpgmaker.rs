//! Support for RPG Maker MV/MZ data files (`Actors.json`, `Map001.json`,
//! `CommonEvents.json`, ...).
//!
//! These are plain `.json` files, so the codec is only reached through an
//! explicit format hint. Every entry is anchored by a JSON pointer, and its key
//! is the same path written with dots.

use serde_json::{Map, Value};

use crate::{
    error::Error,
    formats::{FormatType, patch},
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

/// Database object fields that hold player-visible text.
const DATABASE_FIELDS: [&str; 9] = [
    "name",
    "nickname",
    "profile",
    "description",
    "note",
    "message1",
    "message2",
    "message3",
    "message4",
];

/// Show Text line and Show Scrolling Text line.
const TEXT_CODES: [u64; 2] = [401, 405];
/// Show Choices.
const CHOICE_CODE: u64 = 102;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Text fields of the objects in a database array.
    DatabaseField,
    /// Message lines inside event command lists.
    EventText,
    /// Choice labels inside event command lists.
    EventChoice,
}

impl Rule {
    pub const ORDER: [Rule; 3] = [Rule::DatabaseField, Rule::EventText, Rule::EventChoice];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::DatabaseField => "database_field",
            Rule::EventText => "event_text",
            Rule::EventChoice => "event_choice",
        }
    }

    fn apply(&self, document: &Value, entries: &mut EntryList) {
        match self {
            Rule::DatabaseField => database_fields(document, entries),
            Rule::EventText | Rule::EventChoice => {
                walk_lists(document, &mut Vec::new(), *self, entries)
            }
        }
    }
}

fn push(entries: &mut EntryList, rule: Rule, path: &[String], text: &str, field: Option<&str>) {
    let key = path.join(".");
    let pointer = path
        .iter()
        .map(|token| format!("/{}", patch::pointer_token(token)))
        .collect::<String>();
    let mut entry = Entry::new(key, text);
    if let Some(field) = field {
        entry = entry.with_meta("field", field);
    }
    entries.push(patch::pointer_anchor(entry, rule.name(), &pointer));
}

fn database_fields(document: &Value, entries: &mut EntryList) {
    let Some(items) = document.as_array() else {
        return;
    };
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            continue;
        };
        for field in DATABASE_FIELDS {
            if let Some(text) = object.get(field).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    let path = [index.to_string(), field.to_string()];
                    push(entries, Rule::DatabaseField, &path, text, Some(field));
                }
            }
        }
    }
}

fn scan_commands(list: &[Value], path: &mut Vec<String>, rule: Rule, entries: &mut EntryList) {
    for (index, command) in list.iter().enumerate() {
        let Some(code) = command.get("code").and_then(Value::as_u64) else {
            continue;
        };
        let Some(parameters) = command.get("parameters").and_then(Value::as_array) else {
            continue;
        };
        path.push(index.to_string());
        match rule {
            Rule::EventText if TEXT_CODES.contains(&code) => {
                if let Some(text) = parameters.first().and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        path.extend(["parameters".to_string(), "0".to_string()]);
                        push(entries, rule, path, text, None);
                        path.truncate(path.len() - 2);
                    }
                }
            }
            Rule::EventChoice if code == CHOICE_CODE => {
                if let Some(choices) = parameters.first().and_then(Value::as_array) {
                    for (choice, label) in choices.iter().enumerate() {
                        let Some(text) = label.as_str().filter(|t| !t.trim().is_empty()) else {
                            continue;
                        };
                        path.extend(["parameters".to_string(), "0".to_string(), choice.to_string()]);
                        push(entries, rule, path, text, None);
                        path.truncate(path.len() - 3);
                    }
                }
            }
            _ => {}
        }
        path.pop();
    }
}

/// Visits every `list` array of event commands anywhere in the document.
fn walk_lists(value: &Value, path: &mut Vec<String>, rule: Rule, entries: &mut EntryList) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                path.push(key.clone());
                match (key.as_str(), child) {
                    ("list", Value::Array(list)) => scan_commands(list, path, rule, entries),
                    _ => walk_lists(child, path, rule, entries),
                }
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                walk_lists(child, path, rule, entries);
                path.pop();
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::RpgMaker
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParseResult, Error> {
        let document: Value = serde_json::from_str(content)?;
        if !document.is_array() && !document.is_object() {
            return Err(Error::InvalidResource(
                "RPG Maker data must be a JSON array or object".to_string(),
            ));
        }
        let mut entries = EntryList::new();
        for rule in Rule::ORDER {
            rule.apply(&document, &mut entries);
        }

        let metadata = Metadata {
            note: Some("heuristic RPG Maker extraction; plugin and script text is not read".to_string()),
            ..Default::default()
        };
        Ok(
            ParseResult::new(FormatType::RpgMaker, entries.into_vec(), metadata)
                .with_raw(Some(content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        _options: &WriteOptions,
    ) -> Result<String, Error> {
        if let Some(raw) = &result.raw {
            return patch::patch_json(raw, &result.entries, translations);
        }

        let mut table = Map::new();
        for entry in &result.entries {
            table.insert(entry.key.clone(), Value::from(entry.resolve(translations)));
        }
        Ok(format!("{}\n", serde_json::to_string_pretty(&Value::Object(table))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::patch::{POINTER, RULE};

    const ACTORS: &str = r#"[null,{"id":1,"name":"Harold","nickname":"","profile":"A brave\nknight.","note":"<tag>"},{"id":2,"name":"Therese","message1":" casts a spell!"}]"#;

    const MAP: &str = r#"{
  "displayName": "Town",
  "events": [
    null,
    {
      "id": 1,
      "name": "EV001",
      "pages": [
        {
          "list": [
            {"code": 101, "indent": 0, "parameters": ["Actor1", 0, 0, 2]},
            {"code": 401, "indent": 0, "parameters": ["Welcome to town!"]},
            {"code": 401, "indent": 0, "parameters": [""]},
            {"code": 102, "indent": 0, "parameters": [["Yes", "No"], 1, 0, 2, 0]},
            {"code": 0, "indent": 0, "parameters": []}
          ]
        }
      ]
    }
  ]
}
"#;

    #[test]
    fn test_rule_order() {
        assert_eq!(
            Rule::ORDER.iter().map(Rule::name).collect::<Vec<_>>(),
            vec!["database_field", "event_text", "event_choice"]
        );
    }

    #[test]
    fn test_database_field_rule() {
        let result = Format.parse(ACTORS, &ParseOptions::default()).unwrap();
        assert_eq!(
            result.keys().collect::<Vec<_>>(),
            vec!["1.name", "1.profile", "1.note", "2.name", "2.message1"]
        );
        let profile = result.get("1.profile").unwrap();
        assert_eq!(profile.source, "A brave\nknight.");
        assert_eq!(profile.meta("field"), Some("profile"));
        assert_eq!(profile.meta(POINTER), Some("/1/profile"));
        assert_eq!(profile.meta(RULE), Some("database_field"));
    }

    #[test]
    fn test_event_text_and_choice_rules() {
        let result = Format.parse(MAP, &ParseOptions::default()).unwrap();
        let text = result
            .entries
            .iter()
            .filter(|e| e.meta(RULE) == Some("event_text"))
            .collect::<Vec<_>>();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].source, "Welcome to town!");
        assert_eq!(text[0].key, "events.1.pages.0.list.1.parameters.0");

        let choices = result
            .entries
            .iter()
            .filter(|e| e.meta(RULE) == Some("event_choice"))
            .map(|e| e.source.as_str())
            .collect::<Vec<_>>();
        assert_eq!(choices, vec!["Yes", "No"]);
        // Map files are objects, so no database fields are read.
        assert!(result.entries.iter().all(|e| e.meta(RULE) != Some("database_field")));
    }

    #[test]
    fn test_write_back_patches_pointers() {
        let result = Format.parse(MAP, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert(
            "events.1.pages.0.list.1.parameters.0".to_string(),
            "Benvenuto in città!".to_string(),
        );
        translations.insert(
            "events.1.pages.0.list.3.parameters.0.1".to_string(),
            "No grazie".to_string(),
        );
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        let list = &value["events"][1]["pages"][0]["list"];
        assert_eq!(list[1]["parameters"][0], "Benvenuto in città!");
        assert_eq!(list[3]["parameters"][0][1], "No grazie");
        assert_eq!(list[3]["parameters"][0][0], "Yes");
        assert_eq!(value["displayName"], "Town");
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_compact_input_stays_compact() {
        let result = Format.parse(ACTORS, &ParseOptions::default()).unwrap();
        let out = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(out, ACTORS);
    }

    #[test]
    fn test_fallback_without_raw() {
        let result = Format
            .parse(ACTORS, &ParseOptions::default())
            .unwrap()
            .with_raw(None);
        let out = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["2.message1"], " casts a spell!");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Format.parse("[{", &ParseOptions::default()).is_err());
        assert!(matches!(
            Format.parse("\"Harold\"", &ParseOptions::default()),
            Err(Error::InvalidResource(_))
        ));
    }
}
