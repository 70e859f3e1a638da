use rustc_hash::FxHashMap;

use crate::regex::{AnchoredRegex, Anchors, Line, RegexMatch};
use crate::tokenizer::{GrammarId, TokenizerId};

struct Entry {
	from: usize,
	result: Option<RegexMatch>,
}

/// Per-haystack memo of leftmost matches.
///
/// A search from `from` that found its leftmost match at `s` (or nothing)
/// answers every later search from `pos` in `from..=s` on the same haystack.
/// Positional patterns (`\A`, `\G`) bypass the memo.
#[derive(Default)]
pub(super) struct MatchCache {
	haystack: (usize, usize),
	entries: FxHashMap<(GrammarId, TokenizerId), Entry>,
}

impl MatchCache {
	pub(super) fn search(
		&mut self,
		grammar: GrammarId,
		id: TokenizerId,
		regex: &AnchoredRegex,
		line: Line<'_>,
		pos: usize,
		anchors: Anchors,
	) -> Option<RegexMatch> {
		if regex.is_positional() {
			return regex.search(line, pos, anchors);
		}

		let haystack = (line.start, line.end());
		if self.haystack != haystack {
			self.entries.clear();
			self.haystack = haystack;
		}

		if let Some(entry) = self.entries.get(&(grammar, id))
			&& entry.from <= pos
		{
			match &entry.result {
				None => return None,
				Some(m) if m.start() >= pos => return Some(m.clone()),
				Some(_) => {}
			}
		}

		let result = regex.search(line, pos, anchors);
		self.entries.insert(
			(grammar, id),
			Entry {
				from: pos,
				result: result.clone(),
			},
		);
		result
	}
}
