use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scopeline_primitives::{ByteRange, ByteRangeExt, Scope, SyntaxNode};

use super::*;

fn node(scope: &str, range: ByteRange) -> SyntaxNode {
	SyntaxNode::new(Some(Scope::from(scope)), range)
}

fn ranges(nodes: &[SyntaxNode]) -> Vec<ByteRange> {
	nodes.iter().map(|n| n.range.clone()).collect()
}

fn sample() -> SyntaxTree {
	let mut tree = SyntaxTree::new();
	tree.insert(0..20, vec![node("a", 2..5), node("b", 8..12), node("c", 15..20)]);
	tree
}

#[test]
fn test_query_half_open() {
	let tree = sample();
	assert_eq!(ranges(tree.query(&(5..8))), Vec::<ByteRange>::new());
	assert_eq!(ranges(tree.query(&(4..9))), [2..5, 8..12]);
	assert_eq!(ranges(tree.query(&(0..100))), [2..5, 8..12, 15..20]);
	assert_eq!(ranges(tree.query(&(10..10))), [8..12]);
	assert_eq!(ranges(tree.query(&(8..8))), Vec::<ByteRange>::new());
}

#[test]
fn test_touching_includes_node_ending_at_start() {
	let tree = sample();
	assert_eq!(ranges(tree.touching(&(5..6))), [2..5]);
	assert_eq!(ranges(tree.touching(&(12..12))), [8..12]);
	assert_eq!(ranges(tree.touching(&(6..8))), Vec::<ByteRange>::new());
}

#[test]
fn test_delete_returns_removed() {
	let mut tree = sample();
	let removed = tree.delete(&(3..9));
	assert_eq!(ranges(&removed), [2..5, 8..12]);
	assert_eq!(ranges(tree.nodes()), [15..20]);
}

#[test]
fn test_insert_between() {
	let mut tree = sample();
	tree.delete(&(8..12));
	tree.insert(6..14, vec![node("x", 6..7), node("y", 9..14)]);
	assert_eq!(ranges(tree.nodes()), [2..5, 6..7, 9..14, 15..20]);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "overlaps existing nodes")]
fn test_overlapping_insert_panics() {
	let mut tree = sample();
	tree.insert(4..6, vec![node("x", 4..6)]);
}

#[test]
fn test_shift_after_and_starts() {
	let mut tree = sample();
	tree.shift_after(8, 3);
	assert_eq!(ranges(tree.nodes()), [2..5, 11..15, 18..23]);
	assert_eq!(tree.starts_from(11), [11, 18]);
	tree.shift_after(11, -3);
	assert_eq!(tree, sample());
}

proptest! {
	#[test]
	fn prop_shift_after_conserves_outside_nodes(
		lens in prop::collection::vec((1usize..6, 0usize..4), 1..12),
		pos in 0usize..60,
		delta in 0isize..20,
	) {
		let mut nodes = Vec::new();
		let mut at = 0;
		for (gap, len) in lens {
			at += gap;
			nodes.push(node("n", at..at + len + 1));
			at += len + 1;
		}
		let mut tree = SyntaxTree::new();
		tree.insert(0..at, nodes.clone());
		tree.shift_after(pos, delta);

		prop_assert_eq!(tree.len(), nodes.len());
		for (before, after) in nodes.iter().zip(tree.nodes()) {
			prop_assert_eq!(&before.scope, &after.scope);
			if before.start() < pos {
				prop_assert_eq!(&before.range, &after.range);
			} else {
				prop_assert_eq!(before.range.shifted(delta), after.range.clone());
			}
		}
		prop_assert!(tree.nodes().windows(2).all(|w| w[0].end() <= w[1].start()));
	}
}
