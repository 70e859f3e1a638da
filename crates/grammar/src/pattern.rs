//! Immutable grammar model.
//!
//! The wire format is a bag of optional keys; this module turns each rule into
//! exactly one [`Pattern`] variant so that later stages can match on it
//! exhaustively.

use std::collections::BTreeMap;

use scopeline_primitives::Scope;

use crate::error::{GrammarError, Result};
use crate::raw::{RawCaptures, RawGrammar, RawRule};
use crate::reference::GrammarRef;

/// Named, reusable rule fragments referenced by `#key` includes.
pub type Repository = BTreeMap<String, Pattern>;

/// A single grammar rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
	Include(GrammarRef),
	Match(MatchRule),
	BeginEnd(BeginEndRule),
	BeginWhile(BeginWhileRule),
	List(PatternsList),
}

/// `match` rule: one regex, optionally scoped, with capture sub-rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
	pub regex: String,
	pub name: Option<String>,
	pub captures: Captures,
}

/// `begin` / `end` range rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginEndRule {
	pub begin: String,
	/// A missing `end` never matches; the region then runs to end of buffer.
	pub end: Option<String>,
	pub name: Option<String>,
	pub content_name: Option<String>,
	pub begin_captures: Captures,
	pub end_captures: Captures,
	pub patterns: Vec<Pattern>,
	/// Nested patterns win ties against `end` when set.
	pub apply_end_pattern_last: bool,
}

/// `begin` / `while` block rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginWhileRule {
	pub begin: String,
	pub while_: String,
	pub name: Option<String>,
	pub content_name: Option<String>,
	pub begin_captures: Captures,
	pub while_captures: Captures,
	pub patterns: Vec<Pattern>,
}

/// Ordered alternation with an optional local repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternsList {
	pub patterns: Vec<Pattern>,
	pub repository: Repository,
}

/// How a capture refers to its regex group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaptureKey {
	Index(usize),
	Name(String),
}

impl CaptureKey {
	pub fn parse(key: &str) -> Result<Self> {
		if let Ok(idx) = key.parse::<usize>() {
			return Ok(Self::Index(idx));
		}
		let valid = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
			&& key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
		if valid {
			Ok(Self::Name(key.to_string()))
		} else {
			Err(GrammarError::InvalidCaptureKey(key.to_string()))
		}
	}
}

/// Scope and sub-rules applied to one capture group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capture {
	pub name: Option<String>,
	pub patterns: Vec<Pattern>,
}

/// Capture rules ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures(pub Vec<(CaptureKey, Capture)>);

impl Captures {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &(CaptureKey, Capture)> {
		self.0.iter()
	}
}

/// Top-level rule of a grammar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrammarRule {
	pub comment: Option<String>,
	pub patterns: Vec<Pattern>,
	pub repository: Repository,
}

/// Optional folding regexes.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldingMarkers {
	pub start: String,
	pub stop: String,
}

/// A loaded grammar. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
	pub scope_name: Scope,
	pub name: Option<String>,
	pub file_types: Vec<String>,
	pub first_line_match: Option<String>,
	pub folding: Option<FoldingMarkers>,
	pub rule: GrammarRule,
}

impl Grammar {
	/// Converts the wire document into the grammar model.
	pub fn from_raw(raw: RawGrammar) -> Result<Self> {
		let scope_name = raw
			.scope_name
			.filter(|s| !s.is_empty())
			.ok_or(GrammarError::MissingScopeName)?;

		let folding = match (raw.folding_start_marker, raw.folding_stop_marker) {
			(Some(start), Some(stop)) => Some(FoldingMarkers { start, stop }),
			_ => None,
		};

		Ok(Self {
			scope_name: Scope::from(scope_name),
			name: raw.name.or(raw.display_name),
			file_types: raw.file_types,
			first_line_match: raw.first_line_match,
			folding,
			rule: GrammarRule {
				comment: raw.comment,
				patterns: convert_rules(raw.patterns)?,
				repository: convert_repository(raw.repository)?,
			},
		})
	}
}

fn convert_rules(rules: Vec<RawRule>) -> Result<Vec<Pattern>> {
	rules.into_iter().map(Pattern::from_raw).collect()
}

fn convert_repository(repo: BTreeMap<String, RawRule>) -> Result<Repository> {
	repo.into_iter().map(|(key, rule)| Ok((key, Pattern::from_raw(rule)?))).collect()
}

fn convert_captures(captures: Option<RawCaptures>) -> Result<Captures> {
	let Some(captures) = captures else {
		return Ok(Captures::default());
	};
	let mut out = Vec::with_capacity(captures.len());
	for (key, rule) in captures {
		let key = CaptureKey::parse(&key)?;
		let patterns = convert_rules(rule.patterns.unwrap_or_default())?;
		out.push((key, Capture { name: rule.name, patterns }));
	}
	out.sort_by(|a, b| a.0.cmp(&b.0));
	Ok(Captures(out))
}

impl Pattern {
	/// Classifies one wire rule.
	///
	/// Precedence follows the TextMate format: `include`, then `match`, then
	/// `begin` (with `while` selecting block semantics), then a bare list.
	/// A rule carrying its own `repository` is wrapped in a list owning that
	/// repository so nested `#key` lookups see it.
	pub fn from_raw(raw: RawRule) -> Result<Self> {
		if raw.disabled.is_some_and(|f| f.is_set()) {
			return Ok(Pattern::List(PatternsList::default()));
		}

		let repository = raw.repository.map(convert_repository).transpose()?;
		let apply_end_pattern_last = raw.apply_end_pattern_last.is_some_and(|f| f.is_set());

		let pattern = if let Some(include) = raw.include {
			Pattern::Include(GrammarRef::parse(&include)?)
		} else if let Some(regex) = raw.match_ {
			Pattern::Match(MatchRule {
				regex,
				name: raw.name,
				captures: convert_captures(raw.captures)?,
			})
		} else if let Some(begin) = raw.begin {
			let patterns = convert_rules(raw.patterns.unwrap_or_default())?;
			let begin_captures = convert_captures(raw.begin_captures.or_else(|| raw.captures.clone()))?;
			match raw.while_ {
				Some(while_) => Pattern::BeginWhile(BeginWhileRule {
					begin,
					while_,
					name: raw.name,
					content_name: raw.content_name,
					begin_captures,
					while_captures: convert_captures(raw.while_captures.or(raw.captures))?,
					patterns,
				}),
				None => Pattern::BeginEnd(BeginEndRule {
					begin,
					end: raw.end,
					name: raw.name,
					content_name: raw.content_name,
					begin_captures,
					end_captures: convert_captures(raw.end_captures.or(raw.captures))?,
					patterns,
					apply_end_pattern_last,
				}),
			}
		} else {
			Pattern::List(PatternsList {
				patterns: convert_rules(raw.patterns.unwrap_or_default())?,
				repository: Repository::new(),
			})
		};

		Ok(match (repository, pattern) {
			(None, pattern) => pattern,
			(Some(repository), Pattern::List(list)) if list.repository.is_empty() => Pattern::List(PatternsList {
				patterns: list.patterns,
				repository,
			}),
			(Some(repository), pattern) => Pattern::List(PatternsList {
				patterns: vec![pattern],
				repository,
			}),
		})
	}
}
