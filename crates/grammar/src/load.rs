//! Grammar document loading.

use std::path::Path;

use tracing::debug;

use crate::error::{GrammarError, Result};
use crate::pattern::Grammar;
use crate::raw::RawGrammar;

/// Serialization format of a grammar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFormat {
	Json,
	Yaml,
}

impl GrammarFormat {
	/// Guesses the format from a file name.
	///
	/// Accepts `x.json`, `x.tmLanguage.json`, `x.yaml`, `x.yml` and
	/// `x.tmLanguage.yaml`.
	pub fn from_path(path: &Path) -> Option<Self> {
		match path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}
}

impl Grammar {
	pub fn from_json(source: &str) -> Result<Self> {
		let raw: RawGrammar = serde_json::from_str(source)?;
		Self::from_raw(raw)
	}

	pub fn from_yaml(source: &str) -> Result<Self> {
		let raw: RawGrammar = serde_yaml::from_str(source)?;
		Self::from_raw(raw)
	}

	pub fn parse(source: &str, format: GrammarFormat) -> Result<Self> {
		match format {
			GrammarFormat::Json => Self::from_json(source),
			GrammarFormat::Yaml => Self::from_yaml(source),
		}
	}

	/// Reads and parses a grammar file, choosing the format by extension.
	pub fn load(path: &Path) -> Result<Self> {
		let format = GrammarFormat::from_path(path).ok_or_else(|| GrammarError::UnknownFormat(path.to_path_buf()))?;
		let source = std::fs::read_to_string(path).map_err(|error| GrammarError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let grammar = Self::parse(&source, format)?;
		debug!(path = %path.display(), scope = %grammar.scope_name, "grammar.loaded");
		Ok(grammar)
	}
}
