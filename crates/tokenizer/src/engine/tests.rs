use std::cell::Cell;

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scopeline_grammar::Grammar;
use scopeline_primitives::{ByteRangeExt, SyntaxNode, pretty_print_nodes};

use crate::{Cancelled, EngineCfg, GrammarId, LanguageRegistry, TokenizeRequest};

const QUOTE_AND_COMMENT: &str = r#"{
	"scopeName": "source.demo",
	"patterns": [
		{ "match": "//.*", "name": "comment.line" },
		{ "begin": "\"", "end": "\"", "name": "string.quoted" }
	]
}"#;

fn registry_with(cfg: EngineCfg, grammars: &[&str]) -> (LanguageRegistry, Vec<GrammarId>) {
	let mut registry = LanguageRegistry::new(cfg);
	let ids = grammars
		.iter()
		.map(|json| registry.register(Grammar::from_json(json).unwrap()).unwrap())
		.collect();
	(registry, ids)
}

fn tokenize(grammar: &str, text: &str) -> Vec<SyntaxNode> {
	let (registry, ids) = registry_with(EngineCfg::default(), &[grammar]);
	let result = registry.tokenize(ids[0], text, 0..text.len());
	assert_eq!(result.range, 0..text.len());
	result.nodes
}

fn render(grammar: &str, text: &str) -> String {
	pretty_print_nodes(&tokenize(grammar, text), text)
}

fn scopes(nodes: &[SyntaxNode]) -> Vec<(String, std::ops::Range<usize>)> {
	nodes
		.iter()
		.flat_map(SyntaxNode::walk)
		.filter_map(|(_, n)| Some((n.scope.as_ref()?.to_string(), n.range.clone())))
		.collect()
}

fn assert_disjoint(nodes: &[SyntaxNode]) {
	for pair in nodes.windows(2) {
		assert!(pair[0].end() <= pair[1].start(), "{pair:?}");
	}
	assert!(nodes.iter().all(SyntaxNode::is_well_formed));
}

#[test]
fn test_string_and_comment() {
	assert_snapshot!(render(QUOTE_AND_COMMENT, r#"foo "a" // x"#), @r#"
	4..7 string.quoted "\"a\""
	  4..5 · "\""
	  5..6 · "a"
	  6..7 · "\""
	8..12 comment.line "// x"
	"#);
}

#[test]
fn test_leftmost_then_declaration_order() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "b+", "name": "bees" },
		{ "match": "ab", "name": "ab" },
		{ "match": "a", "name": "a" }
	] }"#;
	assert_eq!(scopes(&tokenize(grammar, "abb")), [("ab".into(), 0..2), ("bees".into(), 2..3)]);

	let tie = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "a", "name": "first" },
		{ "match": "ab", "name": "second" }
	] }"#;
	assert_eq!(scopes(&tokenize(tie, "ab")), [("first".into(), 0..1)]);
}

#[test]
fn test_unterminated_region_runs_to_end() {
	let text = "\"abc\ndef";
	let nodes = tokenize(QUOTE_AND_COMMENT, text);
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].range, 0..text.len());
	// begin delimiter and content; no end delimiter
	assert_eq!(nodes[0].children.len(), 2);
	assert_eq!(nodes[0].children[1].range, 1..text.len());
}

#[test]
fn test_multi_line_region() {
	let grammar = r#"{ "scopeName": "source.c", "patterns": [
		{ "begin": "/\\*", "end": "\\*/", "name": "comment.block", "contentName": "comment.body" },
		{ "match": "\\w+", "name": "word" }
	] }"#;
	assert_snapshot!(render(grammar, "a /* b\nc */ d\n"), @r#"
	0..1 word "a"
	2..11 comment.block "/* b\nc */"
	  2..4 · "/*"
	  4..9 comment.body " b\nc "
	  9..11 · "*/"
	12..13 word "d"
	"#);
}

#[test]
fn test_captures_nest_by_containment() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "((a)b)(c)", "name": "abc", "captures": {
			"1": { "name": "outer" },
			"2": { "name": "inner" },
			"3": { "name": "tail" }
		} }
	] }"#;
	assert_snapshot!(render(grammar, "abc"), @r#"
	0..3 abc "abc"
	  0..2 outer "ab"
	    0..1 inner "a"
	  2..3 tail "c"
	"#);
}

#[test]
fn test_named_capture_and_capture_patterns() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "\\[(?<body>[^\\]]*)\\]", "captures": {
			"0": { "name": "meta.brackets" },
			"body": { "patterns": [ { "match": "\\d", "name": "digit" } ] }
		} }
	] }"#;
	assert_snapshot!(render(grammar, "[a1]"), @r#"
	0..4 · "[a1]"
	  0..4 meta.brackets "[a1]"
	    1..3 · "a1"
	      2..3 digit "1"
	"#);
}

#[test]
fn test_back_reference_end() {
	let grammar = r#"{ "scopeName": "source.sh", "patterns": [
		{ "begin": "<<(\\w+)", "end": "^\\1$", "name": "string.heredoc" }
	] }"#;
	let text = "<<EOF\nhi EOF\nEOF\nx";
	let nodes = tokenize(grammar, text);
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].range, 0..16);
	let end = nodes[0].children.last().unwrap();
	assert_eq!(&text[end.range.clone()], "EOF");
}

#[test]
fn test_apply_end_pattern_last() {
	let grammar = |last: u8| {
		format!(
			r#"{{ "scopeName": "source.x", "patterns": [
				{{ "begin": "\\(", "end": "\\)", "name": "paren", "applyEndPatternLast": {last},
				   "patterns": [ {{ "match": "\\)\\)", "name": "double" }} ] }}
			] }}"#
		)
	};
	let text = "(a))";

	let end_first = tokenize(&grammar(0), text);
	assert_eq!(scopes(&end_first), [("paren".into(), 0..3)]);

	let nested_first = tokenize(&grammar(1), text);
	assert_eq!(scopes(&nested_first), [("paren".into(), 0..4), ("double".into(), 2..4)]);
}

#[test]
fn test_begin_while_block() {
	let grammar = r#"{ "scopeName": "text.md", "patterns": [
		{ "begin": "^>", "while": "^>", "name": "markup.quote", "patterns": [ { "match": "x", "name": "x" } ] }
	] }"#;
	assert_snapshot!(render(grammar, "> x\n> x\ny x\n"), @r#"
	0..8 markup.quote "> x\n> x\n"
	  0..1 · ">"
	  1..8 · " x\n> x\n"
	    2..3 x "x"
	    4..5 · ">"
	    6..7 x "x"
	"#);
}

#[test]
fn test_nested_repository_innermost_first() {
	let grammar = r##"{ "scopeName": "source.x",
		"patterns": [
			{ "begin": "\\(", "end": "\\)", "name": "paren",
			  "patterns": [ { "include": "#num" } ],
			  "repository": { "num": { "match": "\\d", "name": "inner.num" } } },
			{ "include": "#num" }
		],
		"repository": { "num": { "match": "\\d", "name": "outer.num" } }
	}"##;
	assert_eq!(
		scopes(&tokenize(grammar, "(1) 2")),
		[("paren".into(), 0..3), ("inner.num".into(), 1..2), ("outer.num".into(), 4..5)]
	);
}

#[test]
fn test_cross_grammar_and_base_includes() {
	let outer = r#"{ "scopeName": "source.outer", "patterns": [
		{ "match": "k", "name": "outer.k" },
		{ "include": "source.inner#num" },
		{ "include": "source.inner" }
	] }"#;
	let inner = r##"{ "scopeName": "source.inner",
		"patterns": [ { "begin": "\\{", "end": "\\}", "name": "block", "patterns": [ { "include": "$base" } ] } ],
		"repository": { "num": { "match": "\\d+", "name": "constant.numeric" } }
	}"##;
	// The outer grammar is registered first; its includes resolve lazily.
	let (registry, ids) = registry_with(EngineCfg::default(), &[outer, inner]);
	let text = "12 {k}";

	let from_outer = registry.tokenize(ids[0], text, 0..text.len()).nodes;
	assert_eq!(
		scopes(&from_outer),
		[("constant.numeric".into(), 0..2), ("block".into(), 3..6), ("outer.k".into(), 4..5)]
	);

	let from_inner = registry.tokenize(ids[1], text, 0..text.len()).nodes;
	assert_eq!(scopes(&from_inner), [("block".into(), 3..6)]);
}

#[test]
fn test_unresolved_include_and_bad_regex_are_no_ops() {
	let grammar = r##"{ "scopeName": "source.x", "patterns": [
		{ "include": "#missing" },
		{ "include": "source.absent" },
		{ "match": "(", "name": "broken" },
		{ "match": "a", "name": "a" }
	] }"##;
	let (registry, ids) = registry_with(EngineCfg::default(), &[grammar]);
	assert_eq!(registry.grammar(ids[0]).unwrap().diagnostics().len(), 1);
	let nodes = registry.tokenize(ids[0], "ba", 0..2).nodes;
	assert_eq!(scopes(&nodes), [("a".into(), 1..2)]);
}

#[test]
fn test_scope_name_substitution() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "(\\w+):", "name": "entity.${1:/downcase}" }
	] }"#;
	assert_eq!(scopes(&tokenize(grammar, "Foo:")), [("entity.foo".into(), 0..4)]);
}

#[test]
fn test_zero_length_matches_terminate() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [ { "match": "^", "name": "bol" } ] }"#;
	assert!(tokenize(grammar, "ab\ncd").is_empty());
}

#[test]
fn test_contiguous_anchor() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "match": "a", "name": "a" },
		{ "match": "\\Gb", "name": "b" }
	] }"#;
	assert_eq!(scopes(&tokenize(grammar, "abxb")), [("a".into(), 0..1), ("b".into(), 1..2)]);

	let start = r#"{ "scopeName": "source.x", "patterns": [ { "match": "\\Ax", "name": "first" } ] }"#;
	assert_eq!(scopes(&tokenize(start, "x\nx")), [("first".into(), 0..1)]);
}

#[test]
fn test_nesting_limit() {
	let grammar = r#"{ "scopeName": "source.x", "patterns": [
		{ "begin": "\\(", "end": "\\)", "name": "p", "patterns": [ { "include": "$self" } ] }
	] }"#;
	let cfg = EngineCfg {
		max_nesting: 2,
		..EngineCfg::default()
	};
	let (registry, ids) = registry_with(cfg, &[grammar]);
	let nodes = registry.tokenize(ids[0], "(((x)))", 0..7).nodes;
	assert_eq!(scopes(&nodes), [("p".into(), 0..6), ("p".into(), 1..5)]);
}

#[test]
fn test_cancellation() {
	let (registry, ids) = registry_with(
		EngineCfg {
			cancel_check_lines: 1,
			..EngineCfg::default()
		},
		&[QUOTE_AND_COMMENT],
	);
	let text = "// a\n".repeat(10);

	let always = registry.tokenize_with(ids[0], TokenizeRequest::full(&text), &|| true);
	assert_eq!(always, Err(Cancelled));

	let polls = Cell::new(0);
	let later = || {
		polls.set(polls.get() + 1);
		polls.get() > 3
	};
	assert_eq!(registry.tokenize_with(ids[0], TokenizeRequest::full(&text), &later), Err(Cancelled));
	assert_eq!(polls.get(), 4);
}

#[test]
fn test_cancel_cadence_override() {
	let (registry, ids) = registry_with(EngineCfg::default(), &[QUOTE_AND_COMMENT]);
	let text = "// a\n".repeat(10);
	let polls = Cell::new(0);
	let never = || {
		polls.set(polls.get() + 1);
		false
	};
	let request = TokenizeRequest::full(&text).with_cancel_check_lines(2);
	let result = registry.tokenize_with(ids[0], request, &never).unwrap();
	assert_eq!(result.nodes.len(), 10);
	// One poll up front, then one every second line.
	assert_eq!(polls.get(), 6);
}

#[test]
fn test_stops_at_resync_point() {
	let (registry, ids) = registry_with(EngineCfg::default(), &[QUOTE_AND_COMMENT]);
	let text = r#"foo "ab" // x"#;

	let resync = [9];
	let request = TokenizeRequest::new(text, 0..8).with_resync(&resync);
	let result = registry.tokenize_with(ids[0], request, &|| false).unwrap();
	assert_eq!(result.range, 0..9);
	assert_eq!(scopes(&result.nodes), [("string.quoted".into(), 4..8)]);

	let full = registry.tokenize(ids[0], text, 0..8);
	assert_eq!(full.range, 0..13);
	assert_eq!(full.nodes.len(), 2);
}

#[test]
fn test_partial_range_stops_at_line_boundary() {
	let (registry, ids) = registry_with(EngineCfg::default(), &[QUOTE_AND_COMMENT]);
	let text = "// a\n// b\n// c\n";
	let result = registry.tokenize(ids[0], text, 5..7);
	assert_eq!(result.range, 5..10);
	assert_eq!(scopes(&result.nodes), [("comment.line".into(), 5..9)]);
}

proptest! {
	#[test]
	fn prop_tokenize_is_deterministic(text in "[a/\" \n*]{0,60}") {
		let (registry, ids) = registry_with(EngineCfg::default(), &[QUOTE_AND_COMMENT]);
		let first = registry.tokenize(ids[0], &text, 0..text.len());
		let second = registry.tokenize(ids[0], &text, 0..text.len());
		assert_disjoint(&first.nodes);
		for node in &first.nodes {
			prop_assert!((0..text.len()).contains_range(&node.range));
		}
		prop_assert_eq!(first, second);
	}

	#[test]
	fn prop_leftmost_match_wins(text in "[abx]{1,30}") {
		let grammar = r#"{ "scopeName": "source.x", "patterns": [
			{ "match": "b", "name": "b" },
			{ "match": "a", "name": "a" }
		] }"#;
		let nodes = tokenize(grammar, &text);
		let first = text.find(['a', 'b']);
		prop_assert_eq!(nodes.first().map(SyntaxNode::start), first);
	}
}
