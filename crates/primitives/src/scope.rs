use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// A dotted scope name such as `string.quoted.double`.
///
/// Cloning is a reference-count bump, so nodes can carry scopes freely.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(Arc<str>);

impl Scope {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true if `other` is this scope or one of its refinements.
	///
	/// The test is a plain prefix match: `string` contains `string.quoted`.
	#[inline]
	pub fn contains(&self, other: &Scope) -> bool {
		other.0.starts_with(&*self.0)
	}

	/// Iterates the dot-separated segments of the name.
	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.0.split('.')
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Scope({:?})", &*self.0)
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Scope {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for Scope {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

impl Borrow<str> for Scope {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
