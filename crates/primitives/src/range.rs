use std::ops::Range;

/// A position in the text, measured in bytes.
///
/// Tokenization and the syntax tree both work in this coordinate space.
pub type ByteIdx = usize;

/// A half-open byte range `[start, end)`.
pub type ByteRange = Range<ByteIdx>;

/// Moves `pos` by `delta`, saturating at zero.
#[inline]
pub fn shift_offset(pos: ByteIdx, delta: isize) -> ByteIdx {
	pos.saturating_add_signed(delta)
}

/// Interval helpers for [`ByteRange`].
pub trait ByteRangeExt {
	/// Returns true if the two ranges share at least one byte.
	///
	/// An empty range overlaps a range that strictly contains its position,
	/// and another empty range at the same position.
	fn overlaps(&self, other: &ByteRange) -> bool;

	/// Returns true if `other` lies entirely within this range.
	fn contains_range(&self, other: &ByteRange) -> bool;

	/// Smallest range covering both.
	fn union(&self, other: &ByteRange) -> ByteRange;

	/// Returns the range moved by `delta` bytes.
	fn shifted(&self, delta: isize) -> ByteRange;

	/// Clamps both ends to `[0, max]`.
	fn clamped(&self, max: ByteIdx) -> ByteRange;
}

impl ByteRangeExt for ByteRange {
	#[inline]
	fn overlaps(&self, other: &ByteRange) -> bool {
		if self.start < other.end && other.start < self.end {
			return true;
		}

		self.is_empty() && other.is_empty() && self.start == other.start
	}

	#[inline]
	fn contains_range(&self, other: &ByteRange) -> bool {
		self.start <= other.start && other.end <= self.end
	}

	#[inline]
	fn union(&self, other: &ByteRange) -> ByteRange {
		self.start.min(other.start)..self.end.max(other.end)
	}

	#[inline]
	fn shifted(&self, delta: isize) -> ByteRange {
		shift_offset(self.start, delta)..shift_offset(self.end, delta)
	}

	#[inline]
	fn clamped(&self, max: ByteIdx) -> ByteRange {
		self.start.min(max)..self.end.min(max)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn test_overlaps_half_open() {
		assert!((0..5).overlaps(&(4..8)));
		assert!(!(0..5).overlaps(&(5..8)));
		assert!(!(5..8).overlaps(&(0..5)));
	}

	#[test]
	fn test_overlaps_empty() {
		assert!((3..3).overlaps(&(0..5)));
		assert!(!(0..0).overlaps(&(0..5)));
		assert!((2..2).overlaps(&(2..2)));
		assert!(!(2..2).overlaps(&(3..3)));
	}

	#[test]
	fn test_union_and_contains() {
		let u = (2..4).union(&(8..10));
		assert_eq!(u, 2..10);
		assert!(u.contains_range(&(3..9)));
		assert!(!u.contains_range(&(1..3)));
	}

	#[test]
	fn test_shifted_saturates() {
		assert_eq!((5..9).shifted(3), 8..12);
		assert_eq!((5..9).shifted(-7), 0..2);
	}

	proptest! {
		#[test]
		fn prop_shift_round_trip(start in 0usize..1000, len in 0usize..100, delta in 0isize..500) {
			let r = start..start + len;
			prop_assert_eq!(r.shifted(delta).shifted(-delta), r);
		}

		#[test]
		fn prop_overlap_symmetric(a in 0usize..50, al in 0usize..10, b in 0usize..50, bl in 0usize..10) {
			let x = a..a + al;
			let y = b..b + bl;
			prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
		}
	}
}
