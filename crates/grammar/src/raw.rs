//! Wire format of `.tmLanguage.json` / `.tmLanguage.yaml` documents.
//!
//! Field names follow the TextMate schema exactly. Keys outside the schema
//! reject the document; keys that are part of the schema but carry no
//! tokenization meaning are accepted and ignored.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::IgnoredAny;

/// Top-level grammar document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawGrammar {
	pub scope_name: Option<String>,
	pub name: Option<String>,
	pub display_name: Option<String>,
	#[serde(default)]
	pub file_types: Vec<String>,
	pub first_line_match: Option<String>,
	pub folding_start_marker: Option<String>,
	pub folding_stop_marker: Option<String>,
	#[serde(default)]
	pub patterns: Vec<RawRule>,
	#[serde(default)]
	pub repository: BTreeMap<String, RawRule>,
	pub comment: Option<String>,

	pub injections: Option<IgnoredAny>,
	pub injection_selector: Option<IgnoredAny>,
	pub uuid: Option<IgnoredAny>,
	pub version: Option<IgnoredAny>,
	pub key_equivalent: Option<IgnoredAny>,
	pub hide_from_user: Option<IgnoredAny>,
	#[serde(rename = "information_for_contributors")]
	pub information_for_contributors: Option<IgnoredAny>,
	#[serde(rename = "$schema")]
	pub schema: Option<IgnoredAny>,
}

/// One rule: include, match, begin/end, begin/while or a bare pattern list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawRule {
	pub include: Option<String>,
	pub name: Option<String>,
	pub content_name: Option<String>,
	#[serde(rename = "match")]
	pub match_: Option<String>,
	pub begin: Option<String>,
	pub end: Option<String>,
	#[serde(rename = "while")]
	pub while_: Option<String>,
	pub captures: Option<RawCaptures>,
	pub begin_captures: Option<RawCaptures>,
	pub end_captures: Option<RawCaptures>,
	pub while_captures: Option<RawCaptures>,
	pub patterns: Option<Vec<RawRule>>,
	pub repository: Option<BTreeMap<String, RawRule>>,
	pub apply_end_pattern_last: Option<Flag>,
	pub disabled: Option<Flag>,
	pub comment: Option<String>,
	pub id: Option<IgnoredAny>,
}

/// Capture index (or group name) to capture rule.
pub type RawCaptures = BTreeMap<String, RawRule>;

/// Boolean flag written either as `true`/`false` or `1`/`0`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
	Bool(bool),
	Int(i64),
}

impl Flag {
	pub fn is_set(self) -> bool {
		match self {
			Flag::Bool(b) => b,
			Flag::Int(i) => i != 0,
		}
	}
}
