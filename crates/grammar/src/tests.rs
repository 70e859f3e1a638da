use std::io::Write;

use pretty_assertions::assert_eq;
use scopeline_primitives::Scope;

use super::*;

const STRINGS_JSON: &str = r##"{
	"scopeName": "source.demo",
	"name": "Demo",
	"fileTypes": ["demo", "dm"],
	"foldingStartMarker": "\\{\\s*$",
	"foldingStopMarker": "^\\s*\\}",
	"patterns": [
		{ "match": "//.*", "name": "comment.line" },
		{ "include": "#strings" }
	],
	"repository": {
		"strings": {
			"begin": "\"",
			"end": "\"",
			"name": "string.quoted",
			"captures": { "0": { "name": "punctuation.definition.string" } },
			"patterns": [ { "match": "\\\\.", "name": "constant.character.escape" } ]
		}
	}
}"##;

#[test]
fn test_json_grammar_model() {
	let grammar = Grammar::from_json(STRINGS_JSON).unwrap();
	assert_eq!(grammar.scope_name, Scope::from("source.demo"));
	assert_eq!(grammar.file_types, ["demo", "dm"]);
	assert!(grammar.folding.is_some());
	assert_eq!(grammar.rule.patterns.len(), 2);
	assert_eq!(grammar.rule.patterns[1], Pattern::Include(GrammarRef::Local("strings".into())));

	let Pattern::BeginEnd(strings) = &grammar.rule.repository["strings"] else {
		panic!("strings should be a begin/end rule");
	};
	assert_eq!(strings.end.as_deref(), Some("\""));
	// `captures` is the fallback for both begin and end captures.
	assert_eq!(strings.begin_captures, strings.end_captures);
	assert_eq!(strings.begin_captures.0[0].0, CaptureKey::Index(0));
	assert_eq!(strings.patterns.len(), 1);
}

#[test]
fn test_yaml_matches_json() {
	let yaml = r#"
scopeName: source.demo
name: Demo
fileTypes: [demo, dm]
foldingStartMarker: '\{\s*$'
foldingStopMarker: '^\s*\}'
patterns:
  - match: //.*
    name: comment.line
  - include: '#strings'
repository:
  strings:
    begin: '"'
    end: '"'
    name: string.quoted
    captures:
      '0': { name: punctuation.definition.string }
    patterns:
      - match: '\\.'
        name: constant.character.escape
"#;
	assert_eq!(Grammar::from_yaml(yaml).unwrap(), Grammar::from_json(STRINGS_JSON).unwrap());
}

#[test]
fn test_unknown_key_fails_load() {
	let err = Grammar::from_json(r#"{ "scopeName": "source.x", "patterns": [ { "mtach": "x" } ] }"#).unwrap_err();
	assert!(matches!(err, GrammarError::Json(_)), "{err:?}");
}

#[test]
fn test_ignored_schema_keys_are_accepted() {
	let grammar = Grammar::from_json(
		r#"{
			"$schema": "https://example.invalid/tmlanguage.json",
			"information_for_contributors": ["generated"],
			"version": "abc",
			"uuid": "1234",
			"scopeName": "source.x",
			"patterns": [ { "match": "x", "comment": "an x" } ]
		}"#,
	)
	.unwrap();
	assert_eq!(grammar.rule.patterns.len(), 1);
}

#[test]
fn test_generated_grammar_header_from_yaml() {
	let yaml = r#"
information_for_contributors:
  - This file has been converted from an upstream grammar.
version: https://example.invalid/commit/0123abcd
name: Demo
scopeName: source.demo
patterns:
  - match: demo
    name: keyword
"#;
	let grammar = Grammar::from_yaml(yaml).unwrap();
	assert_eq!(grammar.scope_name.as_str(), "source.demo");
	assert_eq!(grammar.rule.patterns.len(), 1);
}

#[test]
fn test_missing_scope_name() {
	let err = Grammar::from_json(r#"{ "patterns": [] }"#).unwrap_err();
	assert!(matches!(err, GrammarError::MissingScopeName));
}

#[test]
fn test_begin_while_and_disabled() {
	let grammar = Grammar::from_json(
		r#"{
			"scopeName": "text.quote",
			"patterns": [
				{ "begin": "^>", "while": "^>", "name": "markup.quote", "whileCaptures": { "0": { "name": "punctuation" } } },
				{ "match": "x", "disabled": 1 },
				{ "match": "y", "disabled": false }
			]
		}"#,
	)
	.unwrap();
	let Pattern::BeginWhile(quote) = &grammar.rule.patterns[0] else {
		panic!("expected begin/while");
	};
	assert_eq!(quote.while_, "^>");
	assert!(quote.begin_captures.is_empty());
	assert!(!quote.while_captures.is_empty());
	assert_eq!(grammar.rule.patterns[1], Pattern::List(PatternsList::default()));
	assert!(matches!(grammar.rule.patterns[2], Pattern::Match(_)));
}

#[test]
fn test_rule_repository_wraps_pattern() {
	let grammar = Grammar::from_json(
		r##"{
			"scopeName": "source.x",
			"patterns": [
				{
					"begin": "\\(", "end": "\\)",
					"patterns": [ { "include": "#inner" } ],
					"repository": { "inner": { "match": "\\d+" } }
				}
			]
		}"##,
	)
	.unwrap();
	let Pattern::List(list) = &grammar.rule.patterns[0] else {
		panic!("rule with repository should be wrapped");
	};
	assert!(list.repository.contains_key("inner"));
	assert!(matches!(list.patterns[0], Pattern::BeginEnd(_)));
}

#[test]
fn test_named_and_invalid_capture_keys() {
	let grammar = Grammar::from_json(
		r#"{ "scopeName": "source.x", "patterns": [ { "match": "(?<word>\\w+)", "captures": { "word": { "name": "w" } } } ] }"#,
	)
	.unwrap();
	let Pattern::Match(rule) = &grammar.rule.patterns[0] else {
		panic!("expected match");
	};
	assert_eq!(rule.captures.0[0].0, CaptureKey::Name("word".into()));

	let err = Grammar::from_json(r#"{ "scopeName": "source.x", "patterns": [ { "match": "x", "captures": { "1-2": {} } } ] }"#)
		.unwrap_err();
	assert!(matches!(err, GrammarError::InvalidCaptureKey(_)));
}

#[test]
fn test_invalid_include_fails_load() {
	let err = Grammar::from_json(r#"{ "scopeName": "source.x", "patterns": [ { "include": "" } ] }"#).unwrap_err();
	assert!(matches!(err, GrammarError::InvalidInclude(_)));
}

#[test]
fn test_load_by_extension() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("demo.tmLanguage.json");
	std::fs::File::create(&path).unwrap().write_all(STRINGS_JSON.as_bytes()).unwrap();
	let grammar = Grammar::load(&path).unwrap();
	assert_eq!(grammar.name.as_deref(), Some("Demo"));

	let plist = dir.path().join("demo.tmLanguage");
	std::fs::write(&plist, "<plist/>").unwrap();
	assert!(matches!(Grammar::load(&plist), Err(GrammarError::UnknownFormat(_))));

	let missing = dir.path().join("missing.json");
	assert!(matches!(Grammar::load(&missing), Err(GrammarError::Io { .. })));
}
