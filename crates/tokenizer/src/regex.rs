//! Regex adapter with TextMate anchor semantics.
//!
//! Every search sees a single line (including its `\n`) as the haystack so
//! that `^`, `$` and lookaround behave line-locally; offsets are translated
//! back to absolute buffer positions here.
//!
//! `\A` and `\G` are positional: whether they may match depends on where the
//! search starts. Patterns that mention them are compiled up to four times,
//! with each inactive anchor rewritten into a character that cannot occur in
//! valid text (`\x{FFFF}`), and the search picks the variant matching the
//! current state.

use std::sync::Arc;

use fancy_regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use scopeline_primitives::ByteRange;
use tracing::warn;

use crate::error::RegexError;

/// Replaces an inactive anchor; U+FFFF is a noncharacter and never matches.
const NEVER: &str = "\\x{FFFF}";

/// Which positional anchors may match for one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchors {
	/// Search starts at offset 0 of the buffer.
	pub buffer_start: bool,
	/// Search starts where the previous match in the same scope ended.
	pub previous_end: bool,
}

impl Anchors {
	/// Computes anchor state for a search at absolute `pos`.
	pub fn at(pos: usize, anchor: Option<usize>) -> Self {
		Self {
			buffer_start: pos == 0,
			previous_end: anchor == Some(pos),
		}
	}
}

/// A single line (or truncated line) used as a search haystack.
#[derive(Debug, Clone, Copy)]
pub struct Line<'t> {
	pub text: &'t str,
	/// Absolute offset of `text[0]`.
	pub start: usize,
}

impl<'t> Line<'t> {
	pub fn new(buffer: &'t str, range: ByteRange) -> Self {
		Self {
			text: &buffer[range.clone()],
			start: range.start,
		}
	}

	pub fn end(&self) -> usize {
		self.start + self.text.len()
	}
}

/// One successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexMatch {
	/// Absolute range of the whole match.
	pub range: ByteRange,
	/// Absolute range of every group; group 0 is the whole match.
	pub by_index: Vec<Option<ByteRange>>,
	/// Absolute range of every participating named group.
	pub by_name: FxHashMap<Arc<str>, ByteRange>,
}

impl RegexMatch {
	pub fn start(&self) -> usize {
		self.range.start
	}

	pub fn end(&self) -> usize {
		self.range.end
	}

	pub fn group(&self, idx: usize) -> Option<ByteRange> {
		self.by_index.get(idx).cloned().flatten()
	}

	pub fn named(&self, name: &str) -> Option<ByteRange> {
		self.by_name.get(name).cloned()
	}
}

/// A compiled pattern with per-anchor-state variants.
#[derive(Debug, Clone)]
pub struct AnchoredRegex {
	source: Arc<str>,
	/// Indexed by `buffer_start as usize * 2 + previous_end as usize`.
	variants: [Arc<Regex>; 4],
	has_buffer_anchor: bool,
	has_previous_anchor: bool,
	names: Arc<[(Arc<str>, usize)]>,
}

impl AnchoredRegex {
	/// Compiles `source` and any anchor variants it needs.
	pub fn new(source: &str, backtrack_limit: usize) -> Result<Self, RegexError> {
		let (has_a, has_g) = scan_anchors(source);
		let compile = |a: bool, g: bool| -> Result<Arc<Regex>, RegexError> {
			let pattern = format!("(?m){}", rewrite_anchors(source, a, g));
			RegexBuilder::new(&pattern)
				.backtrack_limit(backtrack_limit)
				.build()
				.map(Arc::new)
				.map_err(|e| RegexError {
					pattern: source.to_string(),
					message: e.to_string(),
				})
		};

		let base = compile(false, false)?;
		let with_a = if has_a { compile(true, false)? } else { base.clone() };
		let with_g = if has_g { compile(false, true)? } else { base.clone() };
		let with_both = match (has_a, has_g) {
			(true, true) => compile(true, true)?,
			(true, false) => with_a.clone(),
			(false, true) => with_g.clone(),
			(false, false) => base.clone(),
		};

		let names = base
			.capture_names()
			.enumerate()
			.filter_map(|(idx, name)| name.map(|n| (Arc::<str>::from(n), idx)))
			.collect();

		Ok(Self {
			source: Arc::from(source),
			variants: [base, with_g, with_a, with_both],
			has_buffer_anchor: has_a,
			has_previous_anchor: has_g,
			names,
		})
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	/// True if the result of a search depends on where it starts.
	pub fn is_positional(&self) -> bool {
		self.has_buffer_anchor || self.has_previous_anchor
	}

	/// Finds the leftmost match at or after absolute `pos` within `line`.
	///
	/// A search that exhausts the backtracking budget counts as no match.
	pub fn search(&self, line: Line<'_>, pos: usize, anchors: Anchors) -> Option<RegexMatch> {
		if pos < line.start || pos > line.end() {
			return None;
		}
		let idx = usize::from(anchors.buffer_start) * 2 + usize::from(anchors.previous_end);
		let regex = &self.variants[idx];

		let caps = match regex.captures_from_pos(line.text, pos - line.start) {
			Ok(Some(caps)) => caps,
			Ok(None) => return None,
			Err(error) => {
				warn!(pattern = %self.source, %error, "regex.search_failed");
				return None;
			}
		};

		let offset = line.start;
		let by_index: Vec<Option<ByteRange>> = (0..caps.len())
			.map(|i| caps.get(i).map(|m| offset + m.start()..offset + m.end()))
			.collect();
		let range = by_index.first().cloned().flatten()?;
		let by_name = self
			.names
			.iter()
			.filter_map(|(name, idx)| Some((name.clone(), by_index.get(*idx).cloned().flatten()?)))
			.collect();

		Some(RegexMatch { range, by_index, by_name })
	}
}

/// Reports whether `source` contains `\A` and `\G` outside of escapes.
fn scan_anchors(source: &str) -> (bool, bool) {
	let mut has_a = false;
	let mut has_g = false;
	let mut chars = source.chars();
	while let Some(c) = chars.next() {
		if c == '\\' {
			match chars.next() {
				Some('A') => has_a = true,
				Some('G') => has_g = true,
				_ => {}
			}
		}
	}
	(has_a, has_g)
}

/// Rewrites inactive anchors into [`NEVER`]; active ones stay literal.
fn rewrite_anchors(source: &str, allow_a: bool, allow_g: bool) -> String {
	let mut out = String::with_capacity(source.len() + 8);
	let mut chars = source.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('A') if !allow_a => out.push_str(NEVER),
			Some('G') if !allow_g => out.push_str(NEVER),
			Some(next) => {
				out.push('\\');
				out.push(next);
			}
			None => out.push('\\'),
		}
	}
	out
}

/// Returns true if `source` refers to begin captures via `\1`..`\9`.
pub fn has_back_references(source: &str) -> bool {
	let mut chars = source.chars();
	while let Some(c) = chars.next() {
		if c == '\\' && chars.next().is_some_and(|n| n.is_ascii_digit() && n != '0') {
			return true;
		}
	}
	false
}

/// Substitutes `\1`..`\9` with the escaped text of the begin match groups.
///
/// Groups that did not participate become empty.
pub fn resolve_back_references(source: &str, text: &str, begin: &RegexMatch) -> String {
	let mut out = String::with_capacity(source.len());
	let mut chars = source.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some(n) if n.is_ascii_digit() && n != '0' => {
				let idx = usize::from(n as u8 - b'0');
				if let Some(range) = begin.group(idx) {
					out.push_str(&::regex::escape(&text[range]));
				}
			}
			Some(n) => {
				out.push('\\');
				out.push(n);
			}
			None => out.push('\\'),
		}
	}
	out
}

/// Compiles a pattern, logging and discarding failures.
pub(crate) fn compile_logged(source: &str, backtrack_limit: usize) -> Option<AnchoredRegex> {
	match AnchoredRegex::new(source, backtrack_limit) {
		Ok(regex) => Some(regex),
		Err(error) => {
			warn!(pattern = %error.pattern, message = %error.message, "regex.compile_failed");
			None
		}
	}
}
