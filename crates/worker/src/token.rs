use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Cancellation token tagged with the generation of the work it guards.
///
/// Blocking work polls [`Self::is_cancelled`]; async owners await
/// [`Self::cancelled`].
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	pub fn new(generation: u64, cancel: CancellationToken) -> Self {
		Self { generation, cancel }
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a token for a new generation that is also cancelled with this
	/// one.
	pub fn child(&self, generation: u64) -> Self {
		Self {
			generation,
			cancel: self.cancel.child_token(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clock_is_monotonic() {
		let clock = GenerationClock::new();
		let shared = clock.clone();
		assert_eq!(clock.next(), 1);
		assert_eq!(shared.next(), 2);
		assert_eq!(clock.next(), 3);
	}

	#[test]
	fn parent_cancels_children() {
		let root = GenerationToken::new(0, CancellationToken::new());
		let a = root.child(1);
		let b = root.child(2);
		a.cancel();
		assert!(a.is_cancelled());
		assert!(!b.is_cancelled());
		assert!(!root.is_cancelled());

		root.cancel();
		assert!(b.is_cancelled());
		assert_eq!(b.generation(), 2);
	}
}
