// Tokenization runs on worker threads of a host that owns the terminal.
#![deny(clippy::print_stderr)]

//! TextMate-style tokenizer.
//!
//! A [`LanguageRegistry`] compiles each registered grammar into an arena of
//! [`Tokenizer`]s and runs them over text, producing trees of
//! [`scopeline_primitives::SyntaxNode`]s.
//!
//! Disambiguation follows TextMate: in an alternation the match with the
//! smallest start wins and ties go to the earlier pattern. A pattern whose
//! regex fails to compile never matches; it does not take its grammar down.

pub mod builder;
pub mod compiled;
pub mod config;
pub mod engine;
pub mod error;
pub mod names;
pub mod regex;
pub mod registry;
pub mod tokenizer;

pub use compiled::CompiledGrammar;
pub use config::EngineCfg;
pub use engine::{TokenizeRequest, TokenizerResult};
pub use error::{Cancelled, RegexError, RegistryError};
pub use names::ScopeName;
pub use crate::regex::{AnchoredRegex, Anchors, Line, RegexMatch};
pub use registry::LanguageRegistry;
pub use tokenizer::{GrammarId, Tokenizer, TokenizerId};

#[cfg(test)]
mod tests;
