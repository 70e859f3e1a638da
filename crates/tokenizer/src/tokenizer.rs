//! Compiled tokenizer nodes.
//!
//! A grammar compiles into an arena of [`Tokenizer`]s addressed by
//! [`TokenizerId`]. Rules refer to each other by id, so recursive grammars
//! need no reference counting and the arena is immutable once built.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use scopeline_grammar::{CaptureKey, GrammarRef};

use crate::names::ScopeName;
use crate::regex::AnchoredRegex;

/// Index of a grammar inside a [`crate::LanguageRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(pub(crate) u32);

impl GrammarId {
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Index of a tokenizer inside its grammar's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenizerId(pub(crate) u32);

impl TokenizerId {
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Index of a repository scope inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepoId(pub(crate) u32);

/// One `repository` block; `parent` is the enclosing block.
#[derive(Debug, Default)]
pub struct RepoScope {
	pub parent: Option<RepoId>,
	pub entries: FxHashMap<String, TokenizerId>,
}

/// A resolved include: a tokenizer in some grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
	pub grammar: GrammarId,
	pub tokenizer: TokenizerId,
}

#[derive(Debug)]
pub enum Tokenizer {
	/// Disabled rule, or one whose regex failed to compile.
	Never,
	List(Vec<TokenizerId>),
	Include(IncludeTokenizer),
	Match(MatchTokenizer),
	BeginEnd(BeginEndTokenizer),
	BeginWhile(BeginWhileTokenizer),
}

/// Deferred reference to another tokenizer.
///
/// Resolution happens on first use and is memoized, except for `$base`
/// which depends on the grammar a tokenization run started from.
#[derive(Debug)]
pub struct IncludeTokenizer {
	pub target: GrammarRef,
	/// Innermost repository visible at the include site.
	pub repo: Option<RepoId>,
	pub(crate) resolved: OnceLock<Option<Target>>,
}

impl IncludeTokenizer {
	pub fn new(target: GrammarRef, repo: Option<RepoId>) -> Self {
		Self {
			target,
			repo,
			resolved: OnceLock::new(),
		}
	}
}

#[derive(Debug)]
pub struct MatchTokenizer {
	pub regex: AnchoredRegex,
	pub name: Option<ScopeName>,
	pub captures: CompiledCaptures,
}

/// Terminator of a begin/end rule.
#[derive(Debug)]
pub enum EndRegex {
	Static(AnchoredRegex),
	/// Refers to begin captures; compiled once per begin match.
	BackReference(String),
	/// No `end`: the region runs to the end of the scanned text.
	Never,
}

#[derive(Debug)]
pub struct BeginEndTokenizer {
	pub begin: AnchoredRegex,
	pub end: EndRegex,
	pub name: Option<ScopeName>,
	pub content_name: Option<ScopeName>,
	pub begin_captures: CompiledCaptures,
	pub end_captures: CompiledCaptures,
	/// A [`Tokenizer::List`] of nested patterns.
	pub patterns: TokenizerId,
	pub apply_end_pattern_last: bool,
}

#[derive(Debug)]
pub enum WhileRegex {
	Static(AnchoredRegex),
	BackReference(String),
}

#[derive(Debug)]
pub struct BeginWhileTokenizer {
	pub begin: AnchoredRegex,
	pub while_: WhileRegex,
	pub name: Option<ScopeName>,
	pub content_name: Option<ScopeName>,
	pub begin_captures: CompiledCaptures,
	pub while_captures: CompiledCaptures,
	pub patterns: TokenizerId,
}

#[derive(Debug)]
pub struct CompiledCapture {
	pub name: Option<ScopeName>,
	/// Sub-patterns applied to the captured text.
	pub patterns: Option<TokenizerId>,
}

/// Capture rules in key order.
#[derive(Debug, Default)]
pub struct CompiledCaptures(pub Vec<(CaptureKey, CompiledCapture)>);

impl CompiledCaptures {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
