// Grammar loading runs inside hosts that own the terminal; log through tracing.
#![deny(clippy::print_stderr)]

//! TextMate grammar model.
//!
//! * [`raw`]: serde mirror of the `.tmLanguage` wire format
//! * [`pattern`]: the immutable [`Grammar`] / [`Pattern`] model built from it
//! * [`reference`]: `include` targets ([`GrammarRef`])
//! * [`load`]: JSON / YAML document loading
//!
//! A grammar that fails to load is rejected as a whole; nothing here compiles
//! regexes, so a bad regex is not a load error (see `scopeline-tokenizer`).

pub mod error;
pub mod load;
pub mod pattern;
pub mod raw;
pub mod reference;

pub use error::{GrammarError, Result};
pub use load::GrammarFormat;
pub use pattern::{
	BeginEndRule, BeginWhileRule, Capture, CaptureKey, Captures, FoldingMarkers, Grammar, GrammarRule, MatchRule, Pattern, PatternsList,
	Repository,
};
pub use reference::GrammarRef;

#[cfg(test)]
mod tests;
