//! Scope names that refer to capture groups.
//!
//! `name`, `contentName` and capture names may contain `$n`, `${n}`,
//! `${n:/downcase}` or `${n:/upcase}`; these are substituted with the text of
//! the corresponding group of the match that produced the node.

use scopeline_primitives::Scope;

use crate::regex::RegexMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeName {
	Static(Scope),
	Template(String),
}

enum Case {
	Keep,
	Lower,
	Upper,
}

impl ScopeName {
	/// Returns `None` for an empty name.
	pub fn parse(name: &str) -> Option<Self> {
		if name.is_empty() {
			return None;
		}
		let bytes = name.as_bytes();
		let templated = bytes
			.windows(2)
			.any(|w| w[0] == b'$' && (w[1].is_ascii_digit() || w[1] == b'{'));
		Some(if templated {
			Self::Template(name.to_string())
		} else {
			Self::Static(Scope::from(name))
		})
	}

	pub fn parse_opt(name: Option<&str>) -> Option<Self> {
		name.and_then(Self::parse)
	}

	/// Produces the concrete scope for one match.
	///
	/// Returns `None` if substitution leaves nothing.
	pub fn resolve(&self, text: &str, m: &RegexMatch) -> Option<Scope> {
		let template = match self {
			Self::Static(scope) => return Some(scope.clone()),
			Self::Template(template) => template,
		};

		let mut out = String::with_capacity(template.len());
		let mut rest = template.as_str();
		while let Some(dollar) = rest.find('$') {
			out.push_str(&rest[..dollar]);
			let after = &rest[dollar + 1..];
			match parse_reference(after) {
				Some((group, case, consumed)) => {
					if let Some(range) = m.group(group) {
						let captured = text[range].trim_start_matches('.');
						match case {
							Case::Keep => out.push_str(captured),
							Case::Lower => out.push_str(&captured.to_lowercase()),
							Case::Upper => out.push_str(&captured.to_uppercase()),
						}
					}
					rest = &after[consumed..];
				}
				None => {
					out.push('$');
					rest = after;
				}
			}
		}
		out.push_str(rest);

		let out = out.trim();
		(!out.is_empty()).then(|| Scope::from(out))
	}
}

/// Parses the part after `$`; returns the group, case and bytes consumed.
fn parse_reference(after: &str) -> Option<(usize, Case, usize)> {
	let digits = after.bytes().take_while(u8::is_ascii_digit).count();
	if digits > 0 {
		return Some((after[..digits].parse().ok()?, Case::Keep, digits));
	}

	let inner = after.strip_prefix('{')?;
	let close = inner.find('}')?;
	let body = &inner[..close];
	let (group, case) = match body.split_once(":/") {
		Some((group, "downcase")) => (group, Case::Lower),
		Some((group, "upcase")) => (group, Case::Upper),
		Some(_) => return None,
		None => (body, Case::Keep),
	};
	Some((group.parse().ok()?, case, close + 2))
}
