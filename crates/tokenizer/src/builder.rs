//! Grammar to tokenizer compilation.

use fancy_regex::Regex;
use rustc_hash::FxHashMap;
use scopeline_grammar::{
	BeginEndRule, BeginWhileRule, Captures, Grammar, GrammarRef, MatchRule, Pattern, PatternsList, Repository,
};
use scopeline_primitives::Scope;
use tracing::{debug, warn};

use crate::compiled::{CompiledGrammar, FoldingRegexes};
use crate::config::EngineCfg;
use crate::error::RegexError;
use crate::names::ScopeName;
use crate::regex::{AnchoredRegex, has_back_references};
use crate::tokenizer::{
	BeginEndTokenizer, BeginWhileTokenizer, CompiledCapture, CompiledCaptures, EndRegex, GrammarId, IncludeTokenizer,
	MatchTokenizer, RepoId, RepoScope, Tokenizer, TokenizerId, WhileRegex,
};

/// Compiles `grammar` into the arena form used by the engine.
///
/// Never fails: a rule whose regex does not compile becomes a no-op and the
/// error is kept in [`CompiledGrammar::diagnostics`].
pub fn compile_grammar(id: GrammarId, grammar: &Grammar, cfg: &EngineCfg) -> CompiledGrammar {
	let mut builder = Builder {
		cfg,
		scope: &grammar.scope_name,
		tokenizers: Vec::new(),
		repos: Vec::new(),
		diagnostics: Vec::new(),
	};

	let top_repo = builder.repository(&grammar.rule.repository, None);
	let root = builder.list(&grammar.rule.patterns, top_repo);

	let first_line = grammar.first_line_match.as_deref().and_then(|p| builder.plain(p));
	let folding = grammar.folding.as_ref().and_then(|markers| {
		let start = builder.plain(&markers.start)?;
		let stop = builder.plain(&markers.stop)?;
		Some(FoldingRegexes { start, stop })
	});

	debug!(
		grammar = %grammar.scope_name,
		tokenizers = builder.tokenizers.len(),
		invalid = builder.diagnostics.len(),
		"tokenizer.compiled"
	);

	CompiledGrammar {
		id,
		scope: grammar.scope_name.clone(),
		name: grammar.name.clone(),
		file_types: grammar.file_types.clone(),
		first_line,
		folding,
		tokenizers: builder.tokenizers,
		repos: builder.repos,
		root,
		top_repo,
		diagnostics: builder.diagnostics,
	}
}

struct Builder<'a> {
	cfg: &'a EngineCfg,
	scope: &'a Scope,
	tokenizers: Vec<Tokenizer>,
	repos: Vec<RepoScope>,
	diagnostics: Vec<RegexError>,
}

impl Builder<'_> {
	fn push(&mut self, tokenizer: Tokenizer) -> TokenizerId {
		let id = TokenizerId(self.tokenizers.len() as u32);
		self.tokenizers.push(tokenizer);
		id
	}

	fn invalid(&mut self, error: RegexError) {
		warn!(grammar = %self.scope, pattern = %error.pattern, message = %error.message, "tokenizer.regex_invalid");
		self.diagnostics.push(error);
	}

	fn regex(&mut self, source: &str) -> Option<AnchoredRegex> {
		match AnchoredRegex::new(source, self.cfg.backtrack_limit) {
			Ok(regex) => Some(regex),
			Err(error) => {
				self.invalid(error);
				None
			}
		}
	}

	/// Compiles a whole-line regex (folding markers, first line match).
	fn plain(&mut self, source: &str) -> Option<Regex> {
		match Regex::new(source) {
			Ok(regex) => Some(regex),
			Err(e) => {
				self.invalid(RegexError {
					pattern: source.to_string(),
					message: e.to_string(),
				});
				None
			}
		}
	}

	/// Registers a repository block; an empty block adds no scope.
	fn repository(&mut self, repository: &Repository, parent: Option<RepoId>) -> Option<RepoId> {
		if repository.is_empty() {
			return parent;
		}
		let id = RepoId(self.repos.len() as u32);
		self.repos.push(RepoScope {
			parent,
			entries: FxHashMap::default(),
		});

		let mut entries = FxHashMap::default();
		for (key, pattern) in repository {
			let tokenizer = self.pattern(pattern, Some(id));
			entries.insert(key.clone(), tokenizer);
		}
		self.repos[id.0 as usize].entries = entries;
		Some(id)
	}

	fn list(&mut self, patterns: &[Pattern], repo: Option<RepoId>) -> TokenizerId {
		let children = patterns.iter().map(|p| self.pattern(p, repo)).collect();
		self.push(Tokenizer::List(children))
	}

	fn pattern(&mut self, pattern: &Pattern, repo: Option<RepoId>) -> TokenizerId {
		match pattern {
			Pattern::Include(target) => self.include(target, repo),
			Pattern::Match(rule) => self.match_rule(rule, repo),
			Pattern::BeginEnd(rule) => self.begin_end(rule, repo),
			Pattern::BeginWhile(rule) => self.begin_while(rule, repo),
			Pattern::List(PatternsList { patterns, repository }) => {
				let repo = self.repository(repository, repo);
				self.list(patterns, repo)
			}
		}
	}

	fn include(&mut self, target: &GrammarRef, repo: Option<RepoId>) -> TokenizerId {
		self.push(Tokenizer::Include(IncludeTokenizer::new(target.clone(), repo)))
	}

	fn match_rule(&mut self, rule: &MatchRule, repo: Option<RepoId>) -> TokenizerId {
		let Some(regex) = self.regex(&rule.regex) else {
			return self.push(Tokenizer::Never);
		};
		let captures = self.captures(&rule.captures, repo);
		self.push(Tokenizer::Match(MatchTokenizer {
			regex,
			name: ScopeName::parse_opt(rule.name.as_deref()),
			captures,
		}))
	}

	fn begin_end(&mut self, rule: &BeginEndRule, repo: Option<RepoId>) -> TokenizerId {
		let Some(begin) = self.regex(&rule.begin) else {
			return self.push(Tokenizer::Never);
		};
		let end = match rule.end.as_deref() {
			None => EndRegex::Never,
			Some(end) if has_back_references(end) => EndRegex::BackReference(end.to_string()),
			Some(end) => match self.regex(end) {
				Some(regex) => EndRegex::Static(regex),
				None => return self.push(Tokenizer::Never),
			},
		};

		let begin_captures = self.captures(&rule.begin_captures, repo);
		let end_captures = self.captures(&rule.end_captures, repo);
		let patterns = self.list(&rule.patterns, repo);
		self.push(Tokenizer::BeginEnd(BeginEndTokenizer {
			begin,
			end,
			name: ScopeName::parse_opt(rule.name.as_deref()),
			content_name: ScopeName::parse_opt(rule.content_name.as_deref()),
			begin_captures,
			end_captures,
			patterns,
			apply_end_pattern_last: rule.apply_end_pattern_last,
		}))
	}

	fn begin_while(&mut self, rule: &BeginWhileRule, repo: Option<RepoId>) -> TokenizerId {
		let Some(begin) = self.regex(&rule.begin) else {
			return self.push(Tokenizer::Never);
		};
		let while_ = if has_back_references(&rule.while_) {
			WhileRegex::BackReference(rule.while_.clone())
		} else {
			match self.regex(&rule.while_) {
				Some(regex) => WhileRegex::Static(regex),
				None => return self.push(Tokenizer::Never),
			}
		};

		let begin_captures = self.captures(&rule.begin_captures, repo);
		let while_captures = self.captures(&rule.while_captures, repo);
		let patterns = self.list(&rule.patterns, repo);
		self.push(Tokenizer::BeginWhile(BeginWhileTokenizer {
			begin,
			while_,
			name: ScopeName::parse_opt(rule.name.as_deref()),
			content_name: ScopeName::parse_opt(rule.content_name.as_deref()),
			begin_captures,
			while_captures,
			patterns,
		}))
	}

	fn captures(&mut self, captures: &Captures, repo: Option<RepoId>) -> CompiledCaptures {
		let compiled = captures
			.iter()
			.map(|(key, capture)| {
				let patterns = (!capture.patterns.is_empty()).then(|| self.list(&capture.patterns, repo));
				let compiled = CompiledCapture {
					name: ScopeName::parse_opt(capture.name.as_deref()),
					patterns,
				};
				(key.clone(), compiled)
			})
			.collect();
		CompiledCaptures(compiled)
	}
}
