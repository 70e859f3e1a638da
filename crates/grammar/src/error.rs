//! Error types for grammar loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that fail a whole grammar load.
///
/// A grammar that cannot be loaded leaves its language without highlighting;
/// the host keeps running.
#[derive(Error, Debug)]
pub enum GrammarError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("JSON grammar error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("YAML grammar error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	#[error("unrecognized grammar format: {0}")]
	UnknownFormat(PathBuf),

	#[error("grammar has no scopeName")]
	MissingScopeName,

	#[error("invalid include reference: {0:?}")]
	InvalidInclude(String),

	#[error("invalid capture key: {0:?}")]
	InvalidCaptureKey(String),
}

/// Result type for grammar operations.
pub type Result<T> = std::result::Result<T, GrammarError>;
