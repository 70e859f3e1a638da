use scopeline_grammar::CaptureKey;
use scopeline_primitives::{ByteRange, ByteRangeExt, SyntaxNode};
use smallvec::SmallVec;

use super::Engine;
use crate::compiled::CompiledGrammar;
use crate::error::Cancelled;
use crate::regex::{Line, RegexMatch};
use crate::tokenizer::{CompiledCapture, CompiledCaptures, TokenizerId};

/// An open capture node and whether it accepts nested captures.
struct Frame {
	node: SyntaxNode,
	sealed: bool,
}

impl<'a> Engine<'a> {
	/// Builds the capture nodes of `m`, nested by containment.
	///
	/// Captures that did not participate, are empty or leave the match are
	/// skipped, as are captures that partially overlap an earlier sibling.
	/// A capture with `patterns` gets its children from them and hides any
	/// captures nested inside it.
	pub(super) fn captures(
		&mut self,
		grammar: &'a CompiledGrammar,
		captures: &'a CompiledCaptures,
		m: &RegexMatch,
		line: Line<'a>,
		depth: usize,
	) -> Result<Vec<SyntaxNode>, Cancelled> {
		if captures.is_empty() {
			return Ok(Vec::new());
		}

		let mut spans: SmallVec<[(ByteRange, &'a CompiledCapture); 8]> = captures
			.0
			.iter()
			.filter(|(_, capture)| capture.name.is_some() || capture.patterns.is_some())
			.filter_map(|(key, capture)| {
				let range = match key {
					CaptureKey::Index(idx) => m.group(*idx),
					CaptureKey::Name(name) => m.named(name),
				}?;
				(!range.is_empty() && m.range.contains_range(&range)).then_some((range, capture))
			})
			.collect();
		// Outer captures first; the sort is stable so equal spans keep key order.
		spans.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));

		let mut roots = Vec::new();
		let mut stack: Vec<Frame> = Vec::new();
		for (range, capture) in spans {
			while stack.last().is_some_and(|f| !f.node.range.contains_range(&range)) {
				close(&mut stack, &mut roots);
			}
			if stack.last().is_some_and(|f| f.sealed) {
				continue;
			}
			let previous_end = match stack.last() {
				Some(frame) => frame.node.children.last().map(|c| c.end()),
				None => roots.last().map(SyntaxNode::end),
			};
			if previous_end.is_some_and(|end| end > range.start) {
				continue;
			}

			let scope = capture.name.as_ref().and_then(|n| n.resolve(self.text, m));
			let children = match capture.patterns {
				Some(patterns) => self.scan_capture(grammar, patterns, line, range.clone(), depth)?,
				None => Vec::new(),
			};
			stack.push(Frame {
				node: SyntaxNode::with_children(scope, range, children),
				sealed: capture.patterns.is_some(),
			});
		}
		while !stack.is_empty() {
			close(&mut stack, &mut roots);
		}
		Ok(roots)
	}

	/// Tokenizes a capture's text with its own patterns.
	///
	/// The haystack is the line cut off at the capture end, so nothing nested
	/// can leave the capture.
	fn scan_capture(
		&mut self,
		grammar: &'a CompiledGrammar,
		patterns: TokenizerId,
		line: Line<'a>,
		range: ByteRange,
		depth: usize,
	) -> Result<Vec<SyntaxNode>, Cancelled> {
		let haystack = Line::new(self.text, line.start..range.end);
		let mut out = Vec::new();
		self.scan_line(grammar, patterns, None, None, haystack, range.start, None, range.end, depth + 1, &mut out)?;
		Ok(out)
	}
}

fn close(stack: &mut Vec<Frame>, roots: &mut Vec<SyntaxNode>) {
	let Some(frame) = stack.pop() else {
		return;
	};
	match stack.last_mut() {
		Some(parent) => parent.node.children.push(frame.node),
		None => roots.push(frame.node),
	}
}
