//! Deterministic cache-key derivation for credential entities.
//!
//! Keys are pure functions over fully-populated key structs: every field is resolved
//! (and optionality eliminated) before a key struct is built, so derivation itself
//! never branches. Fields are lower-cased and joined with [`KEY_DELIMITER`], which
//! makes key equality insensitive to input casing.

// self
use crate::_prelude::*;

/// Delimiter between key segments.
pub const KEY_DELIMITER: char = '-';

/// Credential entity discriminator embedded in credential keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// ID token credential.
	IdToken,
	/// Access token credential.
	AccessToken,
	/// Refresh token credential.
	RefreshToken,
}
impl CredentialKind {
	/// Returns the stable key-segment label for this kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::IdToken => "idtoken",
			CredentialKind::AccessToken => "accesstoken",
			CredentialKind::RefreshToken => "refreshtoken",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully-populated key fields for an account entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountKey {
	/// Home account identifier (`uid.utid` or subject-derived).
	pub home_account_id: String,
	/// Issuing environment (host, with port when present).
	pub environment: String,
	/// Realm (tenant) the account belongs to.
	pub realm: String,
}
impl AccountKey {
	/// Renders the deterministic account cache key.
	pub fn render(&self) -> String {
		join([self.home_account_id.as_str(), self.environment.as_str(), self.realm.as_str()])
	}
}

/// Fully-populated key fields for a credential entity.
///
/// `realm` and `target` are empty strings for credential kinds that carry neither
/// (refresh tokens); the segment count stays fixed so keys remain collision-resistant
/// across kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CredentialKey {
	/// Home account identifier shared with the owning account.
	pub home_account_id: String,
	/// Issuing environment shared with the owning account.
	pub environment: String,
	/// Credential discriminator.
	pub kind: CredentialKind,
	/// Client that the credential was issued to.
	pub client_id: String,
	/// Realm the credential applies to; empty for refresh tokens.
	pub realm: String,
	/// Normalized scope string; empty for anything but access tokens.
	pub target: String,
}
impl CredentialKey {
	/// Renders the deterministic credential cache key.
	pub fn render(&self) -> String {
		join([
			self.home_account_id.as_str(),
			self.environment.as_str(),
			self.kind.as_str(),
			self.client_id.as_str(),
			self.realm.as_str(),
			self.target.as_str(),
		])
	}
}

fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
	let lowered = parts.into_iter().map(str::to_lowercase).collect::<Vec<_>>();

	lowered.join(&KEY_DELIMITER.to_string())
}
