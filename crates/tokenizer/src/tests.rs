use std::path::Path;

use pretty_assertions::assert_eq;
use scopeline_grammar::Grammar;
use scopeline_primitives::Scope;

use super::*;

fn grammar(json: &str) -> Grammar {
	Grammar::from_json(json).unwrap()
}

const RUST_LIKE: &str = r#"{
	"scopeName": "source.rustish",
	"fileTypes": ["rs", "rs.in", "Cargofile"],
	"firstLineMatch": "^#!.*\\brustish\\b",
	"foldingStartMarker": "\\{\\s*$",
	"foldingStopMarker": "^\\s*\\}",
	"patterns": [ { "match": "fn", "name": "keyword" } ]
}"#;

#[test]
fn test_duplicate_scope_rejected() {
	let mut registry = LanguageRegistry::default();
	registry.register(grammar(RUST_LIKE)).unwrap();
	let err = registry.register(grammar(RUST_LIKE)).unwrap_err();
	assert!(matches!(err, RegistryError::DuplicateScope(ref s) if s.as_str() == "source.rustish"));
	assert_eq!(registry.len(), 1);
}

#[test]
fn test_lookup_by_scope() {
	let mut registry = LanguageRegistry::default();
	let id = registry.register(grammar(RUST_LIKE)).unwrap();
	assert_eq!(registry.by_scope(&Scope::from("source.rustish")), Some(id));
	assert!(matches!(
		registry.require_scope(&Scope::from("source.none")),
		Err(RegistryError::UnknownScope(_))
	));
	assert_eq!(registry.grammar(id).unwrap().scope().as_str(), "source.rustish");
}

#[test]
fn test_lookup_by_path() {
	let mut registry = LanguageRegistry::default();
	let id = registry.register(grammar(RUST_LIKE)).unwrap();
	assert_eq!(registry.for_path(Path::new("src/main.rs")), Some(id));
	assert_eq!(registry.for_path(Path::new("gen/table.rs.in")), Some(id));
	assert_eq!(registry.for_path(Path::new("Cargofile")), Some(id));
	assert_eq!(registry.for_path(Path::new("notes.md")), None);
}

#[test]
fn test_lookup_by_first_line() {
	let mut registry = LanguageRegistry::default();
	let id = registry.register(grammar(RUST_LIKE)).unwrap();
	assert_eq!(registry.for_first_line("#!/usr/bin/env rustish\nfn main"), Some(id));
	assert_eq!(registry.for_first_line("fn main"), None);
}

#[test]
fn test_fold_regions() {
	let mut registry = LanguageRegistry::default();
	let id = registry.register(grammar(RUST_LIKE)).unwrap();
	let compiled = registry.grammar(id).unwrap();
	assert!(compiled.has_folding());
	assert!(compiled.is_fold_start("fn main() {"));
	assert!(compiled.is_fold_stop("  }"));
	assert_eq!(compiled.fold_regions("a {\n b {\n }\n}\n"), [0..3, 1..2]);
}

#[test]
fn test_compiled_arena_shape() {
	let mut registry = LanguageRegistry::default();
	let id = registry
		.register(grammar(
			r##"{
				"scopeName": "source.x",
				"patterns": [ { "include": "#a" }, { "match": "x", "disabled": true } ],
				"repository": {
					"a": { "begin": "<", "end": ">", "patterns": [ { "include": "#a" } ] }
				}
			}"##,
		))
		.unwrap();
	let compiled = registry.grammar(id).unwrap();

	let Tokenizer::List(root) = compiled.tokenizer(compiled.root()) else {
		panic!("root should be a list");
	};
	assert_eq!(root.len(), 2);
	assert!(matches!(compiled.tokenizer(root[0]), Tokenizer::Include(_)));
	assert!(matches!(compiled.tokenizer(root[1]), Tokenizer::List(children) if children.is_empty()));

	let entry = compiled.repository_entry("a").unwrap();
	assert!(matches!(compiled.tokenizer(entry), Tokenizer::BeginEnd(_)));
	assert!(compiled.diagnostics().is_empty());
}

#[test]
fn test_recursive_repository_tokenizes() {
	let mut registry = LanguageRegistry::default();
	let id = registry
		.register(grammar(
			r##"{
				"scopeName": "source.x",
				"patterns": [ { "include": "#angle" } ],
				"repository": {
					"angle": { "begin": "<", "end": ">", "name": "angle", "patterns": [ { "include": "#angle" } ] }
				}
			}"##,
		))
		.unwrap();
	let result = registry.tokenize(id, "<<>>", 0..4);
	let depths: Vec<_> = result.nodes[0]
		.walk()
		.filter(|(_, n)| n.scope.is_some())
		.map(|(depth, n)| (depth, n.range.clone()))
		.collect();
	assert_eq!(depths, [(0, 0..4), (2, 1..3)]);
}

#[test]
fn test_late_registration_resolves_include() {
	let mut registry = LanguageRegistry::default();
	let outer = registry
		.register(grammar(
			r#"{ "scopeName": "source.outer", "patterns": [ { "include": "source.late" } ] }"#,
		))
		.unwrap();
	assert!(registry.tokenize(outer, "z", 0..1).nodes.is_empty());

	registry
		.register(grammar(
			r#"{ "scopeName": "source.late", "patterns": [ { "match": "z", "name": "late" } ] }"#,
		))
		.unwrap();
	let nodes = registry.tokenize(outer, "z", 0..1).nodes;
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].scope.as_ref().map(Scope::as_str), Some("late"));
}

#[test]
fn test_config_normalized() {
	let registry = LanguageRegistry::new(EngineCfg {
		backtrack_limit: 0,
		max_nesting: 0,
		cancel_check_lines: 0,
	});
	assert_eq!(registry.config().cancel_check_lines, 1);
	assert_eq!(registry.config().max_nesting, 1);
}
