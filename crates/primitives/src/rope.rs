//! Line arithmetic shared by the tokenizer and the scheduler.
//!
//! Only `\n` terminates a line; a line range includes its terminator.

use std::sync::Arc;

use ropey::RopeSlice;

use crate::range::{ByteIdx, ByteRange};

/// Copies a rope into a contiguous shared string for tokenization.
pub fn shared_text(text: RopeSlice) -> Arc<str> {
	let mut out = String::with_capacity(text.len_bytes());
	for chunk in text.chunks() {
		out.push_str(chunk);
	}
	Arc::from(out)
}

/// Returns the line containing `pos`, including its trailing `\n`.
///
/// `pos` is clamped to the text length.
pub fn line_bounds(text: &str, pos: ByteIdx) -> ByteRange {
	let pos = pos.min(text.len());
	let bytes = text.as_bytes();
	let start = bytes[..pos].iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
	let end = bytes[pos..].iter().position(|&b| b == b'\n').map_or(text.len(), |i| pos + i + 1);
	start..end
}

/// Grows `range` outward to whole lines.
///
/// An empty range expands to the line containing it; a non-empty range ending
/// exactly at a line start does not pull in that line.
pub fn expand_to_lines(text: &str, range: &ByteRange) -> ByteRange {
	let start = line_bounds(text, range.start).start;
	let end = if range.is_empty() {
		line_bounds(text, range.start).end
	} else {
		line_bounds(text, range.end - 1).end
	};
	start..end.max(start)
}

/// Returns true if `pos` is the first byte of a line (or the end of text).
#[inline]
pub fn is_line_start(text: &str, pos: ByteIdx) -> bool {
	pos == 0 || pos >= text.len() || text.as_bytes()[pos - 1] == b'\n'
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn test_line_bounds() {
		let text = "ab\ncd\n\nef";
		assert_eq!(line_bounds(text, 0), 0..3);
		assert_eq!(line_bounds(text, 2), 0..3);
		assert_eq!(line_bounds(text, 3), 3..6);
		assert_eq!(line_bounds(text, 6), 6..7);
		assert_eq!(line_bounds(text, 8), 7..9);
		assert_eq!(line_bounds(text, 99), 7..9);
	}

	#[test]
	fn test_line_bounds_trailing_newline() {
		let text = "ab\n";
		assert_eq!(line_bounds(text, 3), 3..3);
	}

	#[test]
	fn test_expand_to_lines() {
		let text = "ab\ncd\nef";
		assert_eq!(expand_to_lines(text, &(4..4)), 3..6);
		assert_eq!(expand_to_lines(text, &(1..4)), 0..6);
		assert_eq!(expand_to_lines(text, &(1..3)), 0..3);
		assert_eq!(expand_to_lines(text, &(0..text.len())), 0..8);
	}

	#[test]
	fn test_is_line_start() {
		let text = "ab\ncd";
		assert!(is_line_start(text, 0));
		assert!(!is_line_start(text, 1));
		assert!(is_line_start(text, 3));
		assert!(is_line_start(text, 5));
	}

	#[test]
	fn test_shared_text() {
		let rope = Rope::from("hello\nworld");
		assert_eq!(&*shared_text(rope.slice(..)), "hello\nworld");
	}
}
