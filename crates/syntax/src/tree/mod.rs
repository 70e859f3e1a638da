//! Top-level syntax nodes of one layer.

use std::ops::Range;

use scopeline_primitives::{ByteIdx, ByteRange, SyntaxNode};

/// Ordered, range-disjoint collection of top-level [`SyntaxNode`]s.
///
/// Nodes are sorted by start offset. Since they never overlap, their end
/// offsets are sorted too, and every range query is two binary searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
	nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn nodes(&self) -> &[SyntaxNode] {
		&self.nodes
	}

	pub fn into_nodes(self) -> Vec<SyntaxNode> {
		self.nodes
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
	}

	/// Index window of nodes sharing at least one byte with `range`.
	///
	/// An empty `range` selects the node strictly containing its position.
	fn overlapping(&self, range: &ByteRange) -> Range<usize> {
		let lo = self.nodes.partition_point(|n| n.end() <= range.start);
		let hi = self.nodes.partition_point(|n| n.start() < range.end);
		lo..hi.max(lo)
	}

	/// Index window of nodes overlapping `range` or ending exactly at its start.
	fn touching_window(&self, range: &ByteRange) -> Range<usize> {
		let lo = self.nodes.partition_point(|n| n.end() < range.start);
		let hi = self.nodes.partition_point(|n| n.start() < range.end);
		lo..hi.max(lo)
	}

	/// Nodes intersecting `range`.
	pub fn query(&self, range: &ByteRange) -> &[SyntaxNode] {
		&self.nodes[self.overlapping(range)]
	}

	/// Nodes intersecting `range`, plus a node ending exactly at its start.
	pub fn touching(&self, range: &ByteRange) -> &[SyntaxNode] {
		&self.nodes[self.touching_window(range)]
	}

	/// Removes and returns every node intersecting `range`.
	pub fn delete(&mut self, range: &ByteRange) -> Vec<SyntaxNode> {
		let window = self.overlapping(range);
		self.nodes.drain(window).collect()
	}

	/// Like [`Self::delete`], also taking a node that ends exactly at
	/// `range.start`.
	pub fn delete_touching(&mut self, range: &ByteRange) -> Vec<SyntaxNode> {
		let window = self.touching_window(range);
		self.nodes.drain(window).collect()
	}

	/// Inserts freshly tokenized `nodes` covering `range`.
	///
	/// The caller must have cleared `range` first; overlapping an existing
	/// node is a scheduler bug.
	pub fn insert(&mut self, range: ByteRange, nodes: Vec<SyntaxNode>) {
		debug_assert!(
			self.query(&range).is_empty(),
			"insert over {range:?} overlaps existing nodes {:?}",
			self.query(&range).iter().map(|n| n.range.clone()).collect::<Vec<_>>()
		);
		debug_assert!(
			nodes.windows(2).all(|w| w[0].end() <= w[1].start()),
			"inserted nodes must be sorted and disjoint"
		);
		debug_assert!(nodes.iter().all(|n| range.start <= n.start() && n.end() <= range.end));

		let at = self.nodes.partition_point(|n| n.start() < range.start);
		self.nodes.splice(at..at, nodes);
	}

	/// Moves every node starting at or after `pos` by `delta` bytes.
	pub fn shift_after(&mut self, pos: ByteIdx, delta: isize) {
		if delta == 0 {
			return;
		}
		let at = self.nodes.partition_point(|n| n.start() < pos);
		for node in &mut self.nodes[at..] {
			node.shift(delta);
		}
	}

	/// Start offsets of the nodes starting at or after `pos`.
	pub fn starts_from(&self, pos: ByteIdx) -> Vec<ByteIdx> {
		let at = self.nodes.partition_point(|n| n.start() < pos);
		self.nodes[at..].iter().map(SyntaxNode::start).collect()
	}
}

#[cfg(test)]
mod tests;
