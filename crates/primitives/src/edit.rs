use crate::range::{ByteIdx, ByteRange, shift_offset};

/// A single text change as seen by the syntax scheduler.
///
/// `range` is the replaced span in pre-edit coordinates; `length_delta` is
/// the change in document length (`inserted - removed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
	pub range: ByteRange,
	pub length_delta: isize,
}

impl TextEdit {
	pub fn new(range: ByteRange, length_delta: isize) -> Self {
		Self { range, length_delta }
	}

	/// Insertion of `len` bytes at `at`.
	pub fn insert(at: ByteIdx, len: usize) -> Self {
		Self::new(at..at, len as isize)
	}

	/// Removal of `range`.
	pub fn delete(range: ByteRange) -> Self {
		let removed = range.len() as isize;
		Self::new(range, -removed)
	}

	/// Replacement of `range` by `inserted` bytes.
	pub fn replace(range: ByteRange, inserted: usize) -> Self {
		let removed = range.len() as isize;
		Self::new(range, inserted as isize - removed)
	}

	/// Number of bytes inserted by this edit.
	pub fn inserted_len(&self) -> usize {
		shift_offset(self.range.len(), self.length_delta)
	}

	/// The replaced span in post-edit coordinates.
	pub fn post_edit_range(&self) -> ByteRange {
		self.range.start..self.range.start + self.inserted_len()
	}

	/// Maps a pre-edit position to post-edit coordinates.
	///
	/// Positions inside the replaced span collapse to its start.
	pub fn map_pos(&self, pos: ByteIdx) -> ByteIdx {
		if pos < self.range.start {
			pos
		} else if pos >= self.range.end {
			shift_offset(pos, self.length_delta)
		} else {
			self.range.start
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_insert() {
		let edit = TextEdit::insert(6, 1);
		assert_eq!(edit.range, 6..6);
		assert_eq!(edit.length_delta, 1);
		assert_eq!(edit.post_edit_range(), 6..7);
		assert_eq!(edit.map_pos(6), 7);
		assert_eq!(edit.map_pos(5), 5);
	}

	#[test]
	fn test_replace_and_delete() {
		let edit = TextEdit::replace(2..5, 1);
		assert_eq!(edit.length_delta, -2);
		assert_eq!(edit.inserted_len(), 1);
		assert_eq!(edit.map_pos(3), 2);
		assert_eq!(edit.map_pos(10), 8);

		let del = TextEdit::delete(0..4);
		assert_eq!(del.post_edit_range(), 0..0);
	}
}
