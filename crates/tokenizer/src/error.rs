//! Error types for tokenizer construction and lookup.

use scopeline_primitives::Scope;
use thiserror::Error;

/// A single pattern's regex failed to compile.
///
/// The builder never propagates this; the pattern becomes a no-op and the
/// error is kept in [`crate::CompiledGrammar::diagnostics`].
#[derive(Error, Debug, Clone)]
#[error("invalid regex {pattern:?}: {message}")]
pub struct RegexError {
	pub pattern: String,
	pub message: String,
}

/// Errors from the language registry.
#[derive(Error, Debug)]
pub enum RegistryError {
	#[error("a grammar for scope {0} is already registered")]
	DuplicateScope(Scope),

	#[error("no grammar registered for scope {0}")]
	UnknownScope(Scope),
}

/// Marker returned when a tokenization run observed its cancellation flag.
///
/// Cancellation is an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;
