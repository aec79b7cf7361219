use locfmt::{
    FormatType, ParseOptions, ParseResult, Registry, Translations, WriteOptions, parse_file,
    write_file,
};
use std::path::{Path, PathBuf};

struct ExpectedValue {
    key: &'static str,
    source: &'static str,
    target: Option<&'static str>,
}

struct ParseCase {
    name: &'static str,
    file_name: &'static str,
    format: FormatType,
    expected_values: Vec<ExpectedValue>,
    /// Key overridden in the write-back check.
    override_key: &'static str,
}

fn corpus_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("corpus")
}

fn value(key: &'static str, source: &'static str) -> ExpectedValue {
    ExpectedValue {
        key,
        source,
        target: None,
    }
}

fn translated(key: &'static str, source: &'static str, target: &'static str) -> ExpectedValue {
    ExpectedValue {
        key,
        source,
        target: Some(target),
    }
}

fn parse_cases() -> Vec<ParseCase> {
    vec![
        ParseCase {
            name: "gettext catalog",
            file_name: "messages.po",
            format: FormatType::Po,
            expected_values: vec![
                translated("home|Hello, World!", "Hello, World!", "Bonjour, le monde !"),
                value("Use <tag> & value", "Use <tag> & value"),
                translated("Café crème brûlée", "Café crème brûlée", "Café crème brûlée"),
            ],
            override_key: "Use <tag> & value",
        },
        ParseCase {
            name: "xliff 1.2",
            file_name: "messages.xlf",
            format: FormatType::Xliff,
            expected_values: vec![
                translated("welcome_message", "Hello, World!", "Bonjour, le monde !"),
                value("xml_entities", "Use <tag> & value"),
                value("accent_text", "Café crème brûlée"),
            ],
            override_key: "xml_entities",
        },
        ParseCase {
            name: "resx",
            file_name: "Resources.resx",
            format: FormatType::Resx,
            expected_values: vec![
                value("welcome_message", "Hello, World!"),
                value("xml_entities", "Use <tag> & value"),
            ],
            override_key: "welcome_message",
        },
        ParseCase {
            name: "apple strings",
            file_name: "Localizable.strings",
            format: FormatType::Strings,
            expected_values: vec![
                value("welcome_message", "Hello, World!"),
                value("comma_text", "alpha, beta, gamma"),
                value("accent_text", "Café crème brûlée"),
            ],
            override_key: "comma_text",
        },
        ParseCase {
            name: "json with comments",
            file_name: "en.json",
            format: FormatType::Json,
            expected_values: vec![
                value("home.welcome_message", "Hello, World!"),
                value("xml_entities", "Use <tag> & value"),
            ],
            override_key: "home.welcome_message",
        },
        ParseCase {
            name: "yaml with language root",
            file_name: "en.yml",
            format: FormatType::Yaml,
            expected_values: vec![
                value("home.welcome_message", "Hello, World!"),
                value("accent_text", "Café crème brûlée"),
            ],
            override_key: "accent_text",
        },
        ParseCase {
            name: "ini",
            file_name: "ui.ini",
            format: FormatType::Ini,
            expected_values: vec![
                value("home.welcome_message", "Hello, World!"),
                value("home.comma_text", "alpha, beta, gamma"),
            ],
            override_key: "home.comma_text",
        },
        ParseCase {
            name: "java properties",
            file_name: "app.properties",
            format: FormatType::Properties,
            expected_values: vec![
                value("welcome_message", "Hello, World!"),
                value("accent_text", "Café crème brûlée"),
                value("long_text", "first part second part"),
            ],
            override_key: "long_text",
        },
        ParseCase {
            name: "csv",
            file_name: "strings.csv",
            format: FormatType::Csv,
            expected_values: vec![
                value("welcome_message", "Hello, World!"),
                value("xml_entities", "Use <tag> & value"),
                value("comma_text", "alpha, beta, gamma"),
            ],
            override_key: "comma_text",
        },
        ParseCase {
            name: "ren'py script",
            file_name: "script.rpy",
            format: FormatType::RenPy,
            expected_values: vec![
                value("e:4", "Hello, World!"),
                value("choice:6", "Use <tag> & value"),
                value("Eileen", "Eileen"),
            ],
            override_key: "e:4",
        },
        ParseCase {
            name: "godot scene",
            file_name: "Menu.tscn",
            format: FormatType::Godot,
            expected_values: vec![
                value("text:4", "Hello, World!"),
                value("text:4#2", "Hello, World!"),
            ],
            override_key: "text:4",
        },
        ParseCase {
            name: "unity asset",
            file_name: "ui.asset",
            format: FormatType::Unity,
            expected_values: vec![value("m_Text:4", "Hello, World!")],
            override_key: "m_Text:4",
        },
        ParseCase {
            name: "telltale langdb",
            file_name: "dialogue.langdb",
            format: FormatType::Telltale,
            expected_values: vec![
                value("welcome_message", "Hello, World!"),
                value("accent_text", "Café crème brûlée"),
            ],
            override_key: "welcome_message",
        },
    ]
}

fn read_case(registry: &Registry, case: &ParseCase) -> (String, ParseResult) {
    let path = corpus_root().join(case.file_name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("{}: cannot read {}: {}", case.name, path.display(), e));
    let result = parse_file(registry, &content, Some(case.file_name), &ParseOptions::default())
        .unwrap_or_else(|e| panic!("{}: parse failed: {}", case.name, e));
    (content, result)
}

fn pairs(result: &ParseResult) -> Vec<(String, String)> {
    result
        .entries
        .iter()
        .map(|e| (e.key.clone(), e.source.clone()))
        .collect()
}

#[test]
fn test_corpus_parses_expected_values() {
    let registry = Registry::with_builtins();
    for case in parse_cases() {
        let (_, result) = read_case(&registry, &case);
        assert_eq!(result.format, case.format, "{}", case.name);
        assert_eq!(
            result.len(),
            case.expected_values.len(),
            "{}: {:?}",
            case.name,
            result.keys().collect::<Vec<_>>()
        );
        for expected in &case.expected_values {
            let entry = result
                .get(expected.key)
                .unwrap_or_else(|| panic!("{}: missing key {}", case.name, expected.key));
            assert_eq!(entry.source, expected.source, "{}: {}", case.name, expected.key);
            if let Some(target) = expected.target {
                assert_eq!(entry.target.as_deref(), Some(target), "{}: {}", case.name, expected.key);
            }
        }
    }
}

#[test]
fn test_corpus_round_trips_without_overrides() {
    let registry = Registry::with_builtins();
    for case in parse_cases() {
        let (_, first) = read_case(&registry, &case);
        let written = write_file(&registry, &first, &Translations::new(), &WriteOptions::default())
            .unwrap_or_else(|e| panic!("{}: write failed: {}", case.name, e));
        let second = parse_file(&registry, &written, Some(case.file_name), &ParseOptions::default())
            .unwrap_or_else(|e| panic!("{}: re-parse failed: {}", case.name, e));
        assert_eq!(pairs(&first), pairs(&second), "{}", case.name);
    }
}

#[test]
fn test_corpus_write_back_applies_override() {
    let registry = Registry::with_builtins();
    for case in parse_cases() {
        let (_, first) = read_case(&registry, &case);
        let mut translations = Translations::new();
        translations.insert(case.override_key.to_string(), "Tradotto".to_string());
        let written = write_file(&registry, &first, &translations, &WriteOptions::default())
            .unwrap_or_else(|e| panic!("{}: write failed: {}", case.name, e));
        assert!(written.contains("Tradotto"), "{}:\n{}", case.name, written);
    }
}

#[test]
fn test_dialects_keep_untouched_bytes() {
    let registry = Registry::with_builtins();
    for case in parse_cases().iter().filter(|c| c.format.is_dialect()) {
        let (content, result) = read_case(&registry, case);
        let written = write_file(&registry, &result, &Translations::new(), &WriteOptions::default())
            .unwrap();
        assert_eq!(written, content, "{}", case.name);
    }
}

#[test]
fn test_po_header_becomes_metadata() {
    let registry = Registry::with_builtins();
    let cases = parse_cases();
    let (_, result) = read_case(&registry, &cases[0]);
    assert_eq!(result.metadata.language.as_deref(), Some("fr"));
    assert_eq!(result.metadata.project_name.as_deref(), Some("corpus 1.0"));
    assert!(result.entries.iter().all(|e| !e.source.is_empty()));
}
