//! Range rules: `begin`/`end` regions and `begin`/`while` blocks.

use std::borrow::Cow;

use scopeline_primitives::SyntaxNode;

use super::{Applied, Engine, LineOutcome, Terminator};
use crate::compiled::CompiledGrammar;
use crate::error::Cancelled;
use crate::regex::{AnchoredRegex, Anchors, Line, RegexMatch, compile_logged, resolve_back_references};
use crate::tokenizer::{BeginEndTokenizer, BeginWhileTokenizer, CompiledCaptures, EndRegex, WhileRegex};

impl<'a> Engine<'a> {
	/// Compiles an `end` / `while` pattern that refers to begin captures.
	fn instantiate(&self, source: &str, begin: &RegexMatch) -> Option<AnchoredRegex> {
		compile_logged(&resolve_back_references(source, self.text, begin), self.cfg.backtrack_limit)
	}

	/// Node for a delimiter match, or `None` when it is empty.
	fn delimiter(
		&mut self,
		grammar: &'a CompiledGrammar,
		captures: &'a CompiledCaptures,
		m: &RegexMatch,
		line: Line<'a>,
		depth: usize,
	) -> Result<Option<SyntaxNode>, Cancelled> {
		if m.range.is_empty() {
			return Ok(None);
		}
		let children = self.captures(grammar, captures, m, line, depth)?;
		Ok(Some(SyntaxNode::with_children(None, m.range.clone(), children)))
	}

	/// Expands a `begin`/`end` region.
	///
	/// Yields a wrapper scoped `name` over `begin.start..end.end` holding the
	/// begin delimiter, the content (scoped `contentName`) and the end
	/// delimiter. Without an `end` match the region runs to `limit`.
	pub(super) fn begin_end(
		&mut self,
		grammar: &'a CompiledGrammar,
		rule: &'a BeginEndTokenizer,
		begin: RegexMatch,
		line: Line<'a>,
		limit: usize,
		depth: usize,
	) -> Result<Applied, Cancelled> {
		let text = self.text;
		let name = rule.name.as_ref().and_then(|n| n.resolve(text, &begin));
		let content_name = rule.content_name.as_ref().and_then(|n| n.resolve(text, &begin));

		let begin_node = self.delimiter(grammar, &rule.begin_captures, &begin, line, depth)?;

		let end_regex: Option<Cow<'_, AnchoredRegex>> = match &rule.end {
			EndRegex::Static(regex) => Some(Cow::Borrowed(regex)),
			EndRegex::BackReference(source) => self.instantiate(source, &begin).map(Cow::Owned),
			EndRegex::Never => None,
		};
		let terminator = end_regex.as_deref().map(|regex| Terminator {
			regex,
			apply_last: rule.apply_end_pattern_last,
		});

		let mut content = Vec::new();
		let mut line = line;
		let mut pos = begin.end();
		let mut anchor = Some(pos);
		let end_match = loop {
			if pos >= line.end() && pos < limit {
				line = self.line_at(pos, limit);
				self.tick()?;
			}
			let outcome = self.scan_line(
				grammar,
				rule.patterns,
				terminator.as_ref(),
				None,
				line,
				pos,
				anchor,
				limit,
				depth + 1,
				&mut content,
			)?;
			match outcome {
				LineOutcome::Ended(m) => break Some(m),
				LineOutcome::Continue { pos: next, anchor: next_anchor } => {
					pos = next;
					anchor = next_anchor;
					if pos >= limit {
						break None;
					}
				}
			}
		};

		let (content_end, end, end_node) = match end_match {
			Some(m) => {
				let node = self.delimiter(grammar, &rule.end_captures, &m, line, depth)?;
				(m.start(), m.end(), node)
			}
			None => (limit, limit, None),
		};

		let mut children = Vec::with_capacity(3);
		children.extend(begin_node);
		children.push(SyntaxNode::with_children(content_name, begin.end()..content_end, content));
		children.extend(end_node);
		Ok(Applied {
			node: Some(SyntaxNode::with_children(name, begin.start()..end, children)),
			end,
		})
	}

	/// Expands a `begin`/`while` block.
	///
	/// The block continues on every following line whose start matches
	/// `while`; nested patterns never cross a line end.
	pub(super) fn begin_while(
		&mut self,
		grammar: &'a CompiledGrammar,
		rule: &'a BeginWhileTokenizer,
		begin: RegexMatch,
		line: Line<'a>,
		limit: usize,
		depth: usize,
	) -> Result<Applied, Cancelled> {
		let text = self.text;
		let name = rule.name.as_ref().and_then(|n| n.resolve(text, &begin));
		let content_name = rule.content_name.as_ref().and_then(|n| n.resolve(text, &begin));

		let mut children = Vec::with_capacity(2);
		children.extend(self.delimiter(grammar, &rule.begin_captures, &begin, line, depth)?);

		let while_regex: Option<Cow<'_, AnchoredRegex>> = match &rule.while_ {
			WhileRegex::Static(regex) => Some(Cow::Borrowed(regex)),
			WhileRegex::BackReference(source) => self.instantiate(source, &begin).map(Cow::Owned),
		};

		let mut content = Vec::new();
		let first = begin.end();
		self.scan_line(grammar, rule.patterns, None, None, line, first, Some(first), line.end(), depth + 1, &mut content)?;

		let mut pos = line.end().max(first);
		while pos < limit {
			let Some(regex) = while_regex.as_deref() else {
				break;
			};
			let next = self.line_at(pos, limit);
			self.tick()?;
			let Some(w) = regex.search(next, pos, Anchors::at(pos, Some(pos))).filter(|w| w.start() == pos) else {
				break;
			};
			content.extend(self.delimiter(grammar, &rule.while_captures, &w, next, depth)?);
			let rest = w.end();
			self.scan_line(grammar, rule.patterns, None, None, next, rest, Some(rest), next.end(), depth + 1, &mut content)?;
			pos = next.end();
		}

		let end = pos.min(limit).max(first);
		children.push(SyntaxNode::with_children(content_name, first..end, content));
		Ok(Applied {
			node: Some(SyntaxNode::with_children(name, begin.start()..end, children)),
			end,
		})
	}
}
