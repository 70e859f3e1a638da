use serde::Deserialize;

/// Engine limits applied to every grammar in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineCfg {
	/// Backtracking steps allowed per regex search before it counts as no match.
	pub backtrack_limit: usize,
	/// Deepest begin/end nesting honored; deeper begins are refused.
	pub max_nesting: usize,
	/// Lines tokenized between cancellation checks.
	pub cancel_check_lines: usize,
}

impl Default for EngineCfg {
	fn default() -> Self {
		Self {
			backtrack_limit: 1_000_000,
			max_nesting: 64,
			cancel_check_lines: 64,
		}
	}
}

impl EngineCfg {
	/// Returns a copy with every limit raised to at least one.
	pub fn normalized(mut self) -> Self {
		self.backtrack_limit = self.backtrack_limit.max(1);
		self.max_nesting = self.max_nesting.max(1);
		self.cancel_check_lines = self.cancel_check_lines.max(1);
		self
	}
}
