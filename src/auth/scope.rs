//! Scope canonicalization used for access-token cache-key equality.

// std
use std::collections::BTreeSet;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Canonicalized set of OAuth scopes.
///
/// Entries are lower-cased, deduplicated, and sorted so equality, ordering, and hashing
/// are insensitive to the order, case, and multiplicity of the caller's input. The
/// [`normalized`](Self::normalized) rendering (space-delimited) is the form embedded in
/// access-token cache keys, so equivalent scope sets collide to the same key. Serde uses
/// that same rendering, matching how credential entities carry their target.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
}
impl ScopeSet {
	/// Creates a canonicalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let canonical = scopes
			.into_iter()
			.map(|scope| {
				let owned: String = scope.into();

				if owned.is_empty() {
					Err(ScopeValidationError::Empty)
				} else if owned.chars().any(char::is_whitespace) {
					Err(ScopeValidationError::ContainsWhitespace { scope: owned })
				} else {
					Ok(owned.to_lowercase())
				}
			})
			.collect::<Result<BTreeSet<_>, _>>()?;

		Ok(Self { scopes: Arc::from(canonical.into_iter().collect::<Vec<_>>()) })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the canonicalized set contains the provided scope.
	///
	/// The probe is lower-cased before the lookup so containment follows the same
	/// case-insensitive equality as the set itself.
	pub fn contains(&self, scope: &str) -> bool {
		let probe = scope.to_lowercase();

		self.scopes.binary_search_by(|candidate| candidate.as_str().cmp(probe.as_str())).is_ok()
	}

	/// Iterator over canonicalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Returns the canonical string representation (space-delimited, stable order).
	pub fn normalized(&self) -> String {
		self.scopes.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(DeError::custom)
	}
}
