use fancy_regex::Regex;
use scopeline_primitives::Scope;

use crate::error::RegexError;
use crate::tokenizer::{GrammarId, RepoId, RepoScope, Tokenizer, TokenizerId};

pub(crate) struct FoldingRegexes {
	pub start: Regex,
	pub stop: Regex,
}

/// A grammar compiled into its tokenizer arena.
pub struct CompiledGrammar {
	pub(crate) id: GrammarId,
	pub(crate) scope: Scope,
	pub(crate) name: Option<String>,
	pub(crate) file_types: Vec<String>,
	pub(crate) first_line: Option<Regex>,
	pub(crate) folding: Option<FoldingRegexes>,
	pub(crate) tokenizers: Vec<Tokenizer>,
	pub(crate) repos: Vec<RepoScope>,
	pub(crate) root: TokenizerId,
	pub(crate) top_repo: Option<RepoId>,
	pub(crate) diagnostics: Vec<RegexError>,
}

impl std::fmt::Debug for CompiledGrammar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompiledGrammar")
			.field("id", &self.id)
			.field("scope", &self.scope)
			.field("tokenizers", &self.tokenizers.len())
			.field("diagnostics", &self.diagnostics.len())
			.finish_non_exhaustive()
	}
}

impl CompiledGrammar {
	pub fn id(&self) -> GrammarId {
		self.id
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn file_types(&self) -> &[String] {
		&self.file_types
	}

	/// The tokenizer for the grammar's top-level patterns.
	pub fn root(&self) -> TokenizerId {
		self.root
	}

	pub fn tokenizer(&self, id: TokenizerId) -> &Tokenizer {
		&self.tokenizers[id.index()]
	}

	/// Number of tokenizers in the arena.
	pub fn len(&self) -> usize {
		self.tokenizers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokenizers.is_empty()
	}

	/// Top-level repository entry by key.
	pub fn repository_entry(&self, key: &str) -> Option<TokenizerId> {
		let repo = self.top_repo?;
		self.repos[repo.0 as usize].entries.get(key).copied()
	}

	/// Looks `key` up from `repo` outward through enclosing repositories.
	pub(crate) fn lookup_local(&self, mut repo: Option<RepoId>, key: &str) -> Option<TokenizerId> {
		while let Some(id) = repo {
			let scope = &self.repos[id.0 as usize];
			if let Some(tokenizer) = scope.entries.get(key) {
				return Some(*tokenizer);
			}
			repo = scope.parent;
		}
		None
	}

	/// Patterns that failed to compile and were replaced by no-ops.
	pub fn diagnostics(&self) -> &[RegexError] {
		&self.diagnostics
	}

	/// True if the grammar's `firstLineMatch` accepts `line`.
	pub fn matches_first_line(&self, line: &str) -> bool {
		self.first_line.as_ref().is_some_and(|re| re.is_match(line).unwrap_or(false))
	}

	pub fn has_folding(&self) -> bool {
		self.folding.is_some()
	}

	/// True if `line` opens a fold region.
	pub fn is_fold_start(&self, line: &str) -> bool {
		self.folding.as_ref().is_some_and(|f| f.start.is_match(line).unwrap_or(false))
	}

	/// True if `line` closes a fold region.
	pub fn is_fold_stop(&self, line: &str) -> bool {
		self.folding.as_ref().is_some_and(|f| f.stop.is_match(line).unwrap_or(false))
	}

	/// Pairs fold start and stop lines, returning zero-based line spans.
	///
	/// Unclosed starts are dropped. A line matching both markers closes the
	/// innermost open region.
	pub fn fold_regions(&self, text: &str) -> Vec<std::ops::Range<usize>> {
		if self.folding.is_none() {
			return Vec::new();
		}
		let mut open = Vec::new();
		let mut regions = Vec::new();
		for (idx, line) in text.lines().enumerate() {
			if self.is_fold_stop(line) {
				if let Some(start) = open.pop() {
					regions.push(start..idx);
					continue;
				}
			}
			if self.is_fold_start(line) {
				open.push(idx);
			}
		}
		regions.sort_by_key(|r| r.start);
		regions
	}
}
