//! Compiled grammars and their lookups.

use std::path::Path;

use rustc_hash::FxHashMap;
use scopeline_grammar::{Grammar, GrammarRef};
use scopeline_primitives::Scope;
use tracing::{debug, info};

use crate::builder::compile_grammar;
use crate::compiled::CompiledGrammar;
use crate::config::EngineCfg;
use crate::engine::{Engine, TokenizeRequest, TokenizerResult};
use crate::error::{Cancelled, RegistryError};
use crate::tokenizer::{GrammarId, IncludeTokenizer, Target, Tokenizer};

/// Append-only set of compiled grammars.
///
/// Grammars are registered up front and the registry is then shared
/// read-only (typically behind an `Arc`) by every tokenization run.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
	cfg: EngineCfg,
	grammars: Vec<CompiledGrammar>,
	by_scope: FxHashMap<Scope, GrammarId>,
	by_file_type: FxHashMap<String, GrammarId>,
}

impl LanguageRegistry {
	pub fn new(cfg: EngineCfg) -> Self {
		Self {
			cfg: cfg.normalized(),
			..Self::default()
		}
	}

	pub fn config(&self) -> &EngineCfg {
		&self.cfg
	}

	/// Compiles and registers a grammar.
	///
	/// Includes that previously failed to resolve are retried on next use,
	/// since they may name the grammar added here.
	pub fn register(&mut self, grammar: Grammar) -> Result<GrammarId, RegistryError> {
		if self.by_scope.contains_key(&grammar.scope_name) {
			return Err(RegistryError::DuplicateScope(grammar.scope_name));
		}
		let id = GrammarId(self.grammars.len() as u32);
		let compiled = compile_grammar(id, &grammar, &self.cfg);

		for file_type in &grammar.file_types {
			self.by_file_type.entry(file_type.clone()).or_insert(id);
		}
		self.by_scope.insert(grammar.scope_name.clone(), id);
		self.grammars.push(compiled);
		self.forget_unresolved();

		info!(grammar = %grammar.scope_name, id = id.index(), "registry.registered");
		Ok(id)
	}

	fn forget_unresolved(&mut self) {
		for grammar in &mut self.grammars {
			for tokenizer in &mut grammar.tokenizers {
				if let Tokenizer::Include(include) = tokenizer
					&& include.resolved.get().is_some_and(Option::is_none)
				{
					include.resolved.take();
				}
			}
		}
	}

	pub fn len(&self) -> usize {
		self.grammars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grammars.is_empty()
	}

	pub fn grammar(&self, id: GrammarId) -> Option<&CompiledGrammar> {
		self.grammars.get(id.index())
	}

	pub fn grammars(&self) -> impl Iterator<Item = &CompiledGrammar> {
		self.grammars.iter()
	}

	pub fn by_scope(&self, scope: &Scope) -> Option<GrammarId> {
		self.by_scope.get(scope).copied()
	}

	/// Like [`Self::by_scope`], as a `Result`.
	pub fn require_scope(&self, scope: &Scope) -> Result<GrammarId, RegistryError> {
		self.by_scope(scope).ok_or_else(|| RegistryError::UnknownScope(scope.clone()))
	}

	/// Finds a grammar by file path.
	///
	/// Exact file names (`Makefile`) win over extensions; longer compound
	/// extensions (`tmLanguage.json`) win over shorter ones.
	pub fn for_path(&self, path: &Path) -> Option<GrammarId> {
		let name = path.file_name()?.to_str()?;
		if let Some(id) = self.by_file_type.get(name) {
			return Some(*id);
		}
		name.match_indices('.')
			.filter_map(|(idx, _)| self.by_file_type.get(&name[idx + 1..]))
			.next()
			.copied()
	}

	/// Finds a grammar whose `firstLineMatch` accepts the first line of `text`.
	pub fn for_first_line(&self, text: &str) -> Option<GrammarId> {
		let first = text.lines().next().unwrap_or_default();
		self.grammars.iter().find(|g| g.matches_first_line(first)).map(|g| g.id)
	}

	/// Resolves everything but `$base`.
	pub(crate) fn resolve_include(&self, grammar: &CompiledGrammar, include: &IncludeTokenizer) -> Option<Target> {
		match &include.target {
			GrammarRef::This => Some(Target {
				grammar: grammar.id,
				tokenizer: grammar.root,
			}),
			GrammarRef::Base => None,
			GrammarRef::Local(key) => grammar.lookup_local(include.repo, key).map(|tokenizer| Target {
				grammar: grammar.id,
				tokenizer,
			}),
			GrammarRef::Global { scope, key } => {
				let other = self.grammar(self.by_scope(scope)?)?;
				let tokenizer = match key {
					Some(key) => other.repository_entry(key)?,
					None => other.root,
				};
				Some(Target {
					grammar: other.id,
					tokenizer,
				})
			}
		}
	}

	/// Tokenizes `range` of `text` with grammar `id` to completion.
	pub fn tokenize(&self, id: GrammarId, text: &str, range: std::ops::Range<usize>) -> TokenizerResult {
		let start = range.start;
		self.tokenize_with(id, TokenizeRequest::new(text, range), &|| false)
			.unwrap_or_else(|Cancelled| TokenizerResult::empty(start))
	}

	/// Tokenizes a request, polling `cancel` between lines.
	///
	/// `id` is the entry grammar: `$base` includes resolve to it.
	pub fn tokenize_with(
		&self,
		id: GrammarId,
		request: TokenizeRequest<'_>,
		cancel: &dyn Fn() -> bool,
	) -> Result<TokenizerResult, Cancelled> {
		let Some(grammar) = self.grammar(id) else {
			debug!(id = id.index(), "registry.unknown_grammar");
			return Ok(TokenizerResult::empty(request.range.start));
		};
		Engine::new(self, request.text, id, cancel)
			.check_every(request.cancel_check_lines)
			.run(grammar, request.range, request.resync)
	}
}
