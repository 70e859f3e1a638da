//! Tokenizer execution.
//!
//! Matching is two-phase. [`Engine::find`] runs only the cheap single-line
//! regexes (`match`, `begin`) of an alternation and picks the winner:
//! leftmost start, then declaration order. [`Engine::apply`] then expands the
//! winner into a node, which for range rules means scanning their content,
//! possibly across many lines.
//!
//! All regex searches are line-local (see [`crate::regex`]); the engine walks
//! lines and keeps positions absolute.

mod captures;
mod cache;
mod rules;

use rustc_hash::FxHashSet;
use scopeline_grammar::GrammarRef;
use scopeline_primitives::rope::{is_line_start, line_bounds};
use scopeline_primitives::{ByteIdx, ByteRange, SyntaxNode};
use tracing::{trace, warn};

use self::cache::MatchCache;
use crate::compiled::CompiledGrammar;
use crate::config::EngineCfg;
use crate::error::Cancelled;
use crate::registry::LanguageRegistry;
use crate::regex::{AnchoredRegex, Anchors, Line, RegexMatch};
use crate::tokenizer::{GrammarId, IncludeTokenizer, Target, Tokenizer, TokenizerId};

/// Nodes produced for one tokenization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerResult {
	/// Text actually covered; may extend past the requested range.
	pub range: ByteRange,
	/// Top-level nodes, sorted and disjoint.
	pub nodes: Vec<SyntaxNode>,
}

impl TokenizerResult {
	pub fn empty(at: ByteIdx) -> Self {
		Self {
			range: at..at,
			nodes: Vec::new(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.range.is_empty()
	}
}

/// Input of a tokenization run.
#[derive(Debug, Clone)]
pub struct TokenizeRequest<'a> {
	pub text: &'a str,
	/// Requested range; its start must be a line start.
	pub range: ByteRange,
	/// Sorted offsets where surviving nodes begin. Past `range.end` the run
	/// stops at the first of these it reaches at top level.
	pub resync: &'a [ByteIdx],
	/// Overrides [`EngineCfg::cancel_check_lines`] for this run.
	pub cancel_check_lines: Option<usize>,
}

impl<'a> TokenizeRequest<'a> {
	pub fn new(text: &'a str, range: ByteRange) -> Self {
		Self {
			text,
			range,
			resync: &[],
			cancel_check_lines: None,
		}
	}

	/// The whole text.
	pub fn full(text: &'a str) -> Self {
		Self::new(text, 0..text.len())
	}

	pub fn with_resync(mut self, resync: &'a [ByteIdx]) -> Self {
		self.resync = resync;
		self
	}

	pub fn with_cancel_check_lines(mut self, lines: usize) -> Self {
		self.cancel_check_lines = Some(lines.max(1));
		self
	}
}

/// A winning `match` / `begin` search, not yet expanded into nodes.
struct Candidate<'a> {
	grammar: &'a CompiledGrammar,
	id: TokenizerId,
	m: RegexMatch,
}

impl Candidate<'_> {
	fn start(&self) -> usize {
		self.m.start()
	}
}

/// Outcome of expanding a candidate.
struct Applied {
	node: Option<SyntaxNode>,
	end: usize,
}

/// How scanning one line ended.
enum LineOutcome {
	Continue { pos: usize, anchor: Option<usize> },
	Ended(RegexMatch),
}

/// An `end` regex competing with nested patterns.
struct Terminator<'r> {
	regex: &'r AnchoredRegex,
	apply_last: bool,
}

impl Terminator<'_> {
	/// Exclusive bound on where a nested match may start to beat `end`.
	fn bound(&self, end: &RegexMatch) -> usize {
		if self.apply_last { end.start() + 1 } else { end.start() }
	}
}

/// Resynchronization points past the requested end.
#[derive(Clone, Copy)]
struct StopPoints<'r> {
	after: usize,
	points: &'r [usize],
}

impl StopPoints<'_> {
	/// First point in `[max(from, after), to]`.
	fn first_in(&self, from: usize, to: usize) -> Option<usize> {
		let from = from.max(self.after);
		let idx = self.points.partition_point(|&p| p < from);
		self.points.get(idx).copied().filter(|&p| p <= to)
	}
}

pub(crate) struct Engine<'a> {
	registry: &'a LanguageRegistry,
	text: &'a str,
	base: GrammarId,
	cfg: &'a EngineCfg,
	cancel: &'a dyn Fn() -> bool,
	check_every: usize,
	lines: usize,
	cache: MatchCache,
	warned: FxHashSet<(GrammarId, TokenizerId)>,
}

impl<'a> Engine<'a> {
	pub(crate) fn new(registry: &'a LanguageRegistry, text: &'a str, base: GrammarId, cancel: &'a dyn Fn() -> bool) -> Self {
		Self {
			registry,
			text,
			base,
			cfg: registry.config(),
			cancel,
			check_every: registry.config().cancel_check_lines,
			lines: 0,
			cache: MatchCache::default(),
			warned: FxHashSet::default(),
		}
	}

	/// Tokenizes line by line from `range.start`.
	pub(crate) fn run(
		mut self,
		grammar: &'a CompiledGrammar,
		range: ByteRange,
		resync: &'a [usize],
	) -> Result<TokenizerResult, Cancelled> {
		if (self.cancel)() {
			return Err(Cancelled);
		}
		let len = self.text.len();
		let start = range.start.min(len);
		let end = range.end.clamp(start, len);
		let stops = StopPoints { after: end, points: resync };

		let mut nodes = Vec::new();
		let mut pos = start;
		let mut anchor = None;
		while pos < len {
			if pos >= end && (is_line_start(self.text, pos) || stops.first_in(pos, pos).is_some()) {
				break;
			}
			let line = self.line_at(pos, len);
			if pos == line.start {
				anchor = None;
				self.tick()?;
			}
			match self.scan_line(grammar, grammar.root, None, Some(stops), line, pos, anchor, len, 0, &mut nodes)? {
				LineOutcome::Continue { pos: next, anchor: next_anchor } => {
					pos = next;
					anchor = next_anchor;
				}
				LineOutcome::Ended(_) => break,
			}
		}

		trace!(grammar = %grammar.scope, range = ?(start..pos.max(end)), nodes = nodes.len(), "tokenizer.run");
		Ok(TokenizerResult {
			range: start..pos.max(end),
			nodes,
		})
	}

	pub(crate) fn check_every(mut self, lines: Option<usize>) -> Self {
		if let Some(lines) = lines {
			self.check_every = lines.max(1);
		}
		self
	}

	/// Counts one line and polls cancellation every `check_every` lines.
	fn tick(&mut self) -> Result<(), Cancelled> {
		self.lines += 1;
		if self.lines % self.check_every == 0 && (self.cancel)() {
			return Err(Cancelled);
		}
		Ok(())
	}

	fn line_at(&self, pos: usize, limit: usize) -> Line<'a> {
		let bounds = line_bounds(self.text, pos);
		Line::new(self.text, bounds.start..bounds.end.min(limit).max(bounds.start))
	}

	fn next_char(&self, pos: usize) -> usize {
		self.text[pos..].chars().next().map_or(pos + 1, |c| pos + c.len_utf8())
	}

	/// Scans `patterns` from `pos` to the end of `line`.
	///
	/// With a terminator, returns as soon as `end` wins against the nested
	/// patterns. A nested node may run past the line; the returned position
	/// then lies on a later line.
	#[allow(clippy::too_many_arguments)]
	fn scan_line(
		&mut self,
		grammar: &'a CompiledGrammar,
		patterns: TokenizerId,
		end: Option<&Terminator<'_>>,
		stops: Option<StopPoints<'a>>,
		line: Line<'a>,
		mut pos: usize,
		mut anchor: Option<usize>,
		limit: usize,
		depth: usize,
		out: &mut Vec<SyntaxNode>,
	) -> Result<LineOutcome, Cancelled> {
		while pos < line.end() {
			let anchors = Anchors::at(pos, anchor);
			let end_match = end.and_then(|t| t.regex.search(line, pos, anchors));
			let bound = end.zip(end_match.as_ref()).map(|(t, m)| t.bound(m));
			let found = self.find(grammar, patterns, line, pos, anchor, bound, depth, &mut Vec::new());

			if let Some(stops) = stops {
				let reach = found.as_ref().map_or(line.end(), Candidate::start);
				if let Some(stop) = stops.first_in(pos, reach) {
					return Ok(LineOutcome::Continue {
						pos: stop,
						anchor: None,
					});
				}
			}

			let Some(candidate) = found else {
				return Ok(match end_match {
					Some(m) => LineOutcome::Ended(m),
					None => LineOutcome::Continue {
						pos: line.end(),
						anchor: None,
					},
				});
			};

			let applied = self.apply(candidate, line, limit, depth)?;
			if applied.end <= pos {
				if let Some(m) = end_match.filter(|m| m.start() == pos) {
					return Ok(LineOutcome::Ended(m));
				}
				pos = self.next_char(pos);
				anchor = None;
				continue;
			}
			out.extend(applied.node);
			pos = applied.end;
			anchor = Some(pos);
		}

		// `end` may still match the empty string at the very end of the text.
		if let Some(t) = end
			&& pos == line.end()
			&& pos >= limit
			&& let Some(m) = t.regex.search(line, pos, Anchors::at(pos, anchor)).filter(|m| m.start() == pos)
		{
			return Ok(LineOutcome::Ended(m));
		}
		Ok(LineOutcome::Continue { pos, anchor })
	}

	/// Runs the alternation rooted at `id` and returns the winning candidate.
	///
	/// `bound` is an exclusive upper limit on the start of an acceptable
	/// match. `visiting` holds the includes being expanded, to stop cycles.
	#[allow(clippy::too_many_arguments)]
	fn find(
		&mut self,
		grammar: &'a CompiledGrammar,
		id: TokenizerId,
		line: Line<'a>,
		pos: usize,
		anchor: Option<usize>,
		bound: Option<usize>,
		depth: usize,
		visiting: &mut Vec<Target>,
	) -> Option<Candidate<'a>> {
		let anchors = Anchors::at(pos, anchor);
		let regex = match grammar.tokenizer(id) {
			Tokenizer::Never => return None,
			Tokenizer::Match(rule) => &rule.regex,
			Tokenizer::BeginEnd(rule) if depth < self.cfg.max_nesting => &rule.begin,
			Tokenizer::BeginWhile(rule) if depth < self.cfg.max_nesting => &rule.begin,
			Tokenizer::BeginEnd(_) | Tokenizer::BeginWhile(_) => {
				if self.warned.insert((grammar.id, id)) {
					warn!(grammar = %grammar.scope, depth, "tokenizer.nesting_limit");
				}
				return None;
			}
			Tokenizer::List(children) => {
				let mut best: Option<Candidate<'a>> = None;
				for &child in children {
					let limit = best.as_ref().map_or(bound, |c| Some(c.start()));
					if let Some(found) = self.find(grammar, child, line, pos, anchor, limit, depth, visiting) {
						let at_pos = found.start() == pos;
						best = Some(found);
						// No later child can start before `pos`.
						if at_pos {
							break;
						}
					}
				}
				return best;
			}
			Tokenizer::Include(include) => {
				let target = self.resolve(grammar, include)?;
				if visiting.contains(&target) {
					return None;
				}
				let target_grammar = self.registry.grammar(target.grammar)?;
				visiting.push(target);
				let found = self.find(target_grammar, target.tokenizer, line, pos, anchor, bound, depth, visiting);
				visiting.pop();
				return found;
			}
		};

		let m = self.cache.search(grammar.id, id, regex, line, pos, anchors)?;
		if bound.is_some_and(|b| m.start() >= b) {
			return None;
		}
		Some(Candidate { grammar, id, m })
	}

	/// Resolves an include, memoizing everything except `$base`.
	fn resolve(&mut self, grammar: &'a CompiledGrammar, include: &IncludeTokenizer) -> Option<Target> {
		if include.target == GrammarRef::Base {
			let base = self.registry.grammar(self.base)?;
			return Some(Target {
				grammar: base.id,
				tokenizer: base.root,
			});
		}
		*include.resolved.get_or_init(|| {
			let target = self.registry.resolve_include(grammar, include);
			if target.is_none() {
				warn!(grammar = %grammar.scope, include = %include.target, "tokenizer.include_unresolved");
			}
			target
		})
	}

	/// Expands a candidate into its node.
	fn apply(&mut self, candidate: Candidate<'a>, line: Line<'a>, limit: usize, depth: usize) -> Result<Applied, Cancelled> {
		let Candidate { grammar, id, m } = candidate;
		match grammar.tokenizer(id) {
			Tokenizer::Match(rule) => {
				let children = self.captures(grammar, &rule.captures, &m, line, depth)?;
				let end = m.end();
				let node = (!m.range.is_empty()).then(|| {
					let scope = rule.name.as_ref().and_then(|n| n.resolve(self.text, &m));
					SyntaxNode::with_children(scope, m.range.clone(), children)
				});
				Ok(Applied { node, end })
			}
			Tokenizer::BeginEnd(rule) => self.begin_end(grammar, rule, m, line, limit, depth),
			Tokenizer::BeginWhile(rule) => self.begin_while(grammar, rule, m, line, limit, depth),
			Tokenizer::Never | Tokenizer::List(_) | Tokenizer::Include(_) => Ok(Applied { node: None, end: m.start() }),
		}
	}
}

#[cfg(test)]
mod tests;
