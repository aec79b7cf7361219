//! Support for Ren'Py scripts (`.rpy`).

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    escape::{escape_po, unescape_po},
    formats::{FormatType, patch},
    options::{ParseOptions, WriteOptions},
    traits::FormatCodec,
    types::{Entry, EntryList, Metadata, ParseResult, Translations},
};

lazy_static! {
    static ref DIALOGUE: Regex = Regex::new(
        r#"(?m)^[ \t]*(?:([A-Za-z_][A-Za-z0-9_]*)[ \t]+)?"((?:[^"\\]|\\.)*)"[ \t]*(?:#.*)?\r?$"#
    )
    .unwrap();
    static ref MENU_CHOICE: Regex = Regex::new(
        r#"(?m)^[ \t]*"((?:[^"\\]|\\.)*)"[ \t]*(?:if[ \t]+[^:\n]+)?:[ \t]*(?:#.*)?\r?$"#
    )
    .unwrap();
    static ref CHARACTER: Regex =
        Regex::new(r#"\bCharacter\(\s*(?:_\(\s*)?"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref TRANSLATABLE: Regex = Regex::new(r#"\b_\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#).unwrap();
}

/// Statements that take a string but are not dialogue.
const NON_SPEAKERS: [&str; 12] = [
    "old", "new", "play", "queue", "voice", "image", "show", "scene", "jump", "call", "style",
    "translate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `speaker "line"` and narrator `"line"` statements.
    Dialogue,
    /// `"choice":` menu items, optionally guarded by `if`.
    MenuChoice,
    /// `Character("Name")` definitions, deduplicated.
    Character,
    /// `_("...")` marked strings, deduplicated.
    Translatable,
}

impl Rule {
    pub const ORDER: [Rule; 4] = [
        Rule::Dialogue,
        Rule::MenuChoice,
        Rule::Character,
        Rule::Translatable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Dialogue => "dialogue",
            Rule::MenuChoice => "menu_choice",
            Rule::Character => "character",
            Rule::Translatable => "translatable",
        }
    }

    fn apply(&self, content: &str, entries: &mut EntryList) {
        match self {
            Rule::Dialogue => dialogue(content, entries),
            Rule::MenuChoice => menu_choice(content, entries),
            Rule::Character => definitions(&CHARACTER, *self, content, entries),
            Rule::Translatable => definitions(&TRANSLATABLE, *self, content, entries),
        }
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

fn dialogue(content: &str, entries: &mut EntryList) {
    for caps in DIALOGUE.captures_iter(content) {
        let Some(value) = caps.get(2) else {
            continue;
        };
        let speaker = caps.get(1).map(|m| m.as_str());
        if speaker.is_some_and(|s| NON_SPEAKERS.contains(&s)) {
            continue;
        }
        let text = unescape_po(value.as_str());
        if text.trim().is_empty() {
            continue;
        }
        let key = format!(
            "{}:{}",
            speaker.unwrap_or("narrator"),
            line_of(content, value.start())
        );
        let entry = Entry::new(key, text).with_context(speaker.map(str::to_string));
        entries.push(patch::text_anchor(
            entry,
            Rule::Dialogue.name(),
            content,
            value.start(),
            value.as_str(),
        ));
    }
}

fn menu_choice(content: &str, entries: &mut EntryList) {
    for caps in MENU_CHOICE.captures_iter(content) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let text = unescape_po(value.as_str());
        if text.trim().is_empty() {
            continue;
        }
        let key = format!("choice:{}", line_of(content, value.start()));
        entries.push(patch::text_anchor(
            Entry::new(key, text),
            Rule::MenuChoice.name(),
            content,
            value.start(),
            value.as_str(),
        ));
    }
}

/// Names and `_()` strings are keyed by their text and kept once.
fn definitions(pattern: &Regex, rule: Rule, content: &str, entries: &mut EntryList) {
    for caps in pattern.captures_iter(content) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let text = unescape_po(value.as_str());
        if text.trim().is_empty() {
            continue;
        }
        let entry = patch::text_anchor(
            Entry::new(text.clone(), text),
            rule.name(),
            content,
            value.start(),
            value.as_str(),
        );
        entries.push_unique_source(entry);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format;

impl FormatCodec for Format {
    fn format_type(&self) -> FormatType {
        FormatType::RenPy
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<ParseResult, Error> {
        let mut entries = EntryList::new();
        for rule in Rule::ORDER {
            rule.apply(content, &mut entries);
        }

        let metadata = Metadata {
            note: Some("heuristic Ren'Py extraction; screen language text is not read".to_string()),
            ..Default::default()
        };
        Ok(
            ParseResult::new(FormatType::RenPy, entries.into_vec(), metadata)
                .with_raw(Some(content.to_string())),
        )
    }

    fn serialize(
        &self,
        result: &ParseResult,
        translations: &Translations,
        options: &WriteOptions,
    ) -> Result<String, Error> {
        if let Some(raw) = &result.raw {
            return Ok(patch::splice_literals(
                raw,
                &result.entries,
                translations,
                |_, text| escape_po(text),
            ));
        }

        // Without the script, emit a string translation block.
        let language = options
            .language
            .as_deref()
            .or(result.metadata.output_language())
            .unwrap_or("None");
        let mut out = format!("translate {} strings:\n", language);
        for entry in &result.entries {
            out.push_str(&format!(
                "\n    old \"{}\"\n    new \"{}\"\n",
                escape_po(&entry.source),
                escape_po(entry.resolve(translations))
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::patch::RULE;
    use indoc::indoc;

    const SCRIPT: &str = indoc! {r##"
        define e = Character(_("Eileen"), color="#c8ffc8")
        define e2 = Character("Eileen")

        label start:
            scene bg room
            play music "theme.ogg"
            e "You've created a new \"Ren'Py\" game."
            "It was a quiet morning."
            menu:
                "Go left":
                    jump left
                "Go right" if brave:
                    jump right
            $ renpy.notify(_("Saved"))
            $ renpy.notify(_("Saved"))
    "##};

    fn by_rule<'a>(result: &'a ParseResult, rule: Rule) -> Vec<&'a Entry> {
        result
            .entries
            .iter()
            .filter(|e| e.meta(RULE) == Some(rule.name()))
            .collect()
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            Rule::ORDER.iter().map(Rule::name).collect::<Vec<_>>(),
            vec!["dialogue", "menu_choice", "character", "translatable"]
        );
    }

    #[test]
    fn test_dialogue_rule() {
        let result = Format.parse(SCRIPT, &ParseOptions::default()).unwrap();
        let lines = by_rule(&result, Rule::Dialogue);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].key, "e:7");
        assert_eq!(lines[0].source, "You've created a new \"Ren'Py\" game.");
        assert_eq!(lines[0].context.as_deref(), Some("e"));
        assert_eq!(lines[1].key, "narrator:8");
        assert_eq!(lines[1].context, None);
    }

    #[test]
    fn test_menu_choice_rule() {
        let result = Format.parse(SCRIPT, &ParseOptions::default()).unwrap();
        let choices = by_rule(&result, Rule::MenuChoice);
        let sources = choices.iter().map(|e| e.source.as_str()).collect::<Vec<_>>();
        assert_eq!(sources, vec!["Go left", "Go right"]);
        assert_eq!(choices[1].key, "choice:12");
    }

    #[test]
    fn test_character_rule_deduplicates() {
        let result = Format.parse(SCRIPT, &ParseOptions::default()).unwrap();
        let characters = by_rule(&result, Rule::Character);
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].key, "Eileen");
        assert_eq!(characters[0].line(), Some(1));
    }

    #[test]
    fn test_translatable_rule_deduplicates() {
        let result = Format.parse(SCRIPT, &ParseOptions::default()).unwrap();
        let marked = by_rule(&result, Rule::Translatable);
        // `_("Eileen")` was already taken by the character rule.
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].source, "Saved");
    }

    #[test]
    fn test_write_back_patches_overrides() {
        let result = Format.parse(SCRIPT, &ParseOptions::default()).unwrap();
        let mut translations = Translations::new();
        translations.insert("e:7".to_string(), "Hai creato un nuovo gioco \"Ren'Py\".".to_string());
        translations.insert("choice:12".to_string(), "Vai a destra".to_string());
        let out = Format
            .serialize(&result, &translations, &WriteOptions::default())
            .unwrap();
        assert!(out.contains("    e \"Hai creato un nuovo gioco \\\"Ren'Py\\\".\"\n"));
        assert!(out.contains("        \"Vai a destra\" if brave:\n"));
        assert!(out.contains("\"Go left\":"));

        let untouched = Format
            .serialize(&result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(untouched, SCRIPT);
    }

    #[test]
    fn test_fallback_translate_block() {
        let result = Format
            .parse("e \"Hello\"\n", &ParseOptions::default())
            .unwrap()
            .with_raw(None);
        let mut translations = Translations::new();
        translations.insert("e:1".to_string(), "Ciao".to_string());
        let options = WriteOptions::default().with_language(Some("italian".to_string()));
        let out = Format.serialize(&result, &translations, &options).unwrap();
        assert_eq!(
            out,
            "translate italian strings:\n\n    old \"Hello\"\n    new \"Ciao\"\n"
        );
    }
}
