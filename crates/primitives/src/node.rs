use std::fmt::Write as _;

use smallvec::SmallVec;

use crate::range::{ByteIdx, ByteRange, ByteRangeExt};
use crate::scope::Scope;

/// One scoped span of text and its nested spans.
///
/// Children lie within the parent range, in order, without overlapping. A node
/// without a scope is a structural wrapper (begin/end delimiters, content
/// groups) and is still emitted so attributes can be applied to its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxNode {
	pub scope: Option<Scope>,
	pub range: ByteRange,
	pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
	pub fn new(scope: Option<Scope>, range: ByteRange) -> Self {
		Self {
			scope,
			range,
			children: Vec::new(),
		}
	}

	pub fn with_children(scope: Option<Scope>, range: ByteRange, children: Vec<SyntaxNode>) -> Self {
		Self { scope, range, children }
	}

	#[inline]
	pub fn start(&self) -> ByteIdx {
		self.range.start
	}

	#[inline]
	pub fn end(&self) -> ByteIdx {
		self.range.end
	}

	/// Moves this node and all descendants by `delta` bytes.
	pub fn shift(&mut self, delta: isize) {
		if delta == 0 {
			return;
		}
		self.range = self.range.shifted(delta);
		for child in &mut self.children {
			child.shift(delta);
		}
	}

	/// Consuming variant of [`Self::shift`].
	pub fn shifted(mut self, delta: isize) -> Self {
		self.shift(delta);
		self
	}

	/// Checks the containment and sibling-order invariants recursively.
	pub fn is_well_formed(&self) -> bool {
		let mut cursor = self.range.start;
		for child in &self.children {
			if child.range.start < cursor || !self.range.contains_range(&child.range) || !child.is_well_formed() {
				return false;
			}
			cursor = child.range.end;
		}
		true
	}

	/// Scopes covering `offset`, outermost first.
	pub fn scopes_at(&self, offset: ByteIdx) -> SmallVec<[&Scope; 8]> {
		let mut stack = SmallVec::new();
		self.collect_scopes_at(offset, &mut stack);
		stack
	}

	fn collect_scopes_at<'a>(&'a self, offset: ByteIdx, stack: &mut SmallVec<[&'a Scope; 8]>) {
		if offset < self.range.start || offset >= self.range.end {
			return;
		}
		if let Some(scope) = &self.scope {
			stack.push(scope);
		}
		if let Some(child) = self.children.iter().find(|c| c.range.start <= offset && offset < c.range.end) {
			child.collect_scopes_at(offset, stack);
		}
	}

	/// Depth-first pre-order walk yielding `(depth, node)`.
	pub fn walk(&self) -> impl Iterator<Item = (usize, &SyntaxNode)> {
		let mut pending = vec![(0usize, self)];
		std::iter::from_fn(move || {
			let (depth, node) = pending.pop()?;
			pending.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
			Some((depth, node))
		})
	}
}

/// Renders nodes as an indented listing with text excerpts.
///
/// Used by the command line front-end and by snapshot tests.
pub fn pretty_print_nodes(nodes: &[SyntaxNode], text: &str) -> String {
	let mut out = String::new();
	for node in nodes {
		for (depth, n) in node.walk() {
			let scope = n.scope.as_ref().map_or("·", Scope::as_str);
			let excerpt = text.get(n.range.clone()).unwrap_or("");
			let _ = writeln!(
				out,
				"{:indent$}{}..{} {} {:?}",
				"",
				n.range.start,
				n.range.end,
				scope,
				excerpt,
				indent = depth * 2
			);
		}
	}
	out
}
