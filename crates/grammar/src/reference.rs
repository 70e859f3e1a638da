use std::fmt;

use scopeline_primitives::Scope;

use crate::error::{GrammarError, Result};

/// Target of an `include` rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarRef {
	/// `$self`: the grammar that owns the include.
	This,
	/// `$base`: the grammar tokenization started from.
	Base,
	/// `#key`: an entry of an enclosing repository.
	Local(String),
	/// `scope.name` or `scope.name#key`: another grammar, or one of its
	/// repository entries.
	Global { scope: Scope, key: Option<String> },
}

impl GrammarRef {
	pub fn parse(include: &str) -> Result<Self> {
		match include {
			"" => Err(GrammarError::InvalidInclude(include.to_string())),
			"$self" => Ok(Self::This),
			"$base" => Ok(Self::Base),
			_ => {
				if let Some(key) = include.strip_prefix('#') {
					if key.is_empty() {
						return Err(GrammarError::InvalidInclude(include.to_string()));
					}
					return Ok(Self::Local(key.to_string()));
				}
				let (scope, key) = match include.split_once('#') {
					Some((scope, key)) => (scope, Some(key)),
					None => (include, None),
				};
				if scope.is_empty() || key.is_some_and(str::is_empty) {
					return Err(GrammarError::InvalidInclude(include.to_string()));
				}
				Ok(Self::Global {
					scope: Scope::from(scope),
					key: key.map(str::to_string),
				})
			}
		}
	}
}

impl fmt::Display for GrammarRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::This => f.write_str("$self"),
			Self::Base => f.write_str("$base"),
			Self::Local(key) => write!(f, "#{key}"),
			Self::Global { scope, key: None } => write!(f, "{scope}"),
			Self::Global { scope, key: Some(key) } => write!(f, "{scope}#{key}"),
		}
	}
}
