//! Canonical credential entities persisted by the cache.

// self
use crate::{
	_prelude::*,
	auth::{IdTokenClaims, TokenSecret},
	cache::key::{AccountKey, CredentialKey, CredentialKind},
};

/// Caller-facing account reference used on requests and the active-account marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	/// Stable home account identifier.
	pub home_account_id: String,
	/// Issuing environment (host, with port when present).
	pub environment: String,
	/// Tenant (realm) the account belongs to.
	pub tenant_id: String,
	/// Display username, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
}
impl AccountInfo {
	/// Identity equality over the key fields, case-insensitive to match the
	/// lower-cased cache-key space.
	pub fn same_identity(&self, other: &Self) -> bool {
		self.home_account_id.eq_ignore_ascii_case(&other.home_account_id)
			&& self.environment.eq_ignore_ascii_case(&other.environment)
			&& self.tenant_id.eq_ignore_ascii_case(&other.tenant_id)
	}

	/// Renders the account cache key this reference points at.
	pub fn cache_key(&self) -> String {
		AccountKey {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			realm: self.tenant_id.clone(),
		}
		.render()
	}
}

/// Persisted account entity: identity claims snapshot plus environment/realm anchors.
///
/// A "full" account carries the provider's client-info blob and the fields derived
/// from it; a "generic" account is built from claims alone when no client info is
/// available. The home account identifier is immutable once set for a cache record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntity {
	/// Stable home account identifier.
	pub home_account_id: String,
	/// Issuing environment.
	pub environment: String,
	/// Realm (tenant).
	pub realm: String,
	/// Local (within-directory) account identifier, from `oid`/`sub`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub local_account_id: Option<String>,
	/// Display username, from `preferred_username`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Raw client-info blob; present only on full accounts.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_info: Option<String>,
	/// Identity claims snapshot taken at ingestion time.
	pub id_token_claims: IdTokenClaims,
}
impl AccountEntity {
	/// Builds a full account from claims plus the provider's client-info blob.
	pub fn full(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		realm: impl Into<String>,
		claims: IdTokenClaims,
		client_info: impl Into<String>,
	) -> Self {
		let mut entity = Self::generic(home_account_id, environment, realm, claims);

		entity.client_info = Some(client_info.into());

		entity
	}

	/// Builds a generic account from claims alone (no client-info-derived fields).
	pub fn generic(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		realm: impl Into<String>,
		claims: IdTokenClaims,
	) -> Self {
		Self {
			home_account_id: home_account_id.into(),
			environment: environment.into(),
			realm: realm.into(),
			local_account_id: claims.local_account_id().map(str::to_owned),
			username: claims.preferred_username.clone(),
			name: claims.name.clone(),
			client_info: None,
			id_token_claims: claims,
		}
	}

	/// Fully-populated key fields for this entity.
	pub fn key(&self) -> AccountKey {
		AccountKey {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			realm: self.realm.clone(),
		}
	}

	/// Renders the deterministic cache key.
	pub fn cache_key(&self) -> String {
		self.key().render()
	}

	/// Projects the caller-facing account reference.
	pub fn account_info(&self) -> AccountInfo {
		AccountInfo {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			tenant_id: self.realm.clone(),
			username: self.username.clone(),
		}
	}
}

/// Persisted ID token credential; exactly one per (account, client, realm) tuple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenEntity {
	/// Home account identifier shared with the owning account.
	pub home_account_id: String,
	/// Issuing environment shared with the owning account.
	pub environment: String,
	/// Client the token was issued to.
	pub client_id: String,
	/// Realm the token applies to.
	pub realm: String,
	/// Raw ID token string.
	pub secret: TokenSecret,
}
impl IdTokenEntity {
	/// Builds an ID token entity from resolved identity fields and the raw token.
	pub fn new(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		client_id: impl Into<String>,
		realm: impl Into<String>,
		raw: impl Into<String>,
	) -> Self {
		Self {
			home_account_id: home_account_id.into(),
			environment: environment.into(),
			client_id: client_id.into(),
			realm: realm.into(),
			secret: TokenSecret::new(raw),
		}
	}

	/// Fully-populated key fields for this entity.
	pub fn key(&self) -> CredentialKey {
		CredentialKey {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			kind: CredentialKind::IdToken,
			client_id: self.client_id.clone(),
			realm: self.realm.clone(),
			target: String::new(),
		}
	}

	/// Renders the deterministic cache key.
	pub fn cache_key(&self) -> String {
		self.key().render()
	}
}

/// Persisted access token credential.
///
/// Both expiry instants are mandatory by construction: the ingestion engine resolves
/// them before this struct exists, so an access token can never be persisted without
/// its expiry pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenEntity {
	/// Home account identifier shared with the owning account.
	pub home_account_id: String,
	/// Issuing environment shared with the owning account.
	pub environment: String,
	/// Client the token was issued to.
	pub client_id: String,
	/// Realm the token applies to.
	pub realm: String,
	/// Normalized scope string (deduplicated, lower-cased, stably ordered).
	pub target: String,
	/// Raw access token string.
	pub secret: TokenSecret,
	/// Instant the token was cached.
	pub cached_at: OffsetDateTime,
	/// Absolute expiry instant.
	pub expires_on: OffsetDateTime,
	/// Extended expiry instant used for outage resiliency.
	pub extended_expires_on: OffsetDateTime,
}
impl AccessTokenEntity {
	/// Fully-populated key fields for this entity.
	pub fn key(&self) -> CredentialKey {
		CredentialKey {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			kind: CredentialKind::AccessToken,
			client_id: self.client_id.clone(),
			realm: self.realm.clone(),
			target: self.target.clone(),
		}
	}

	/// Renders the deterministic cache key.
	pub fn cache_key(&self) -> String {
		self.key().render()
	}

	/// Returns `true` once the absolute expiry instant has passed.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_on
	}

	/// Returns `true` once even the extended expiry window has closed.
	pub fn is_beyond_extended_expiry_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.extended_expires_on
	}
}

/// Persisted refresh token credential; realm-agnostic by design.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenEntity {
	/// Home account identifier shared with the owning account.
	pub home_account_id: String,
	/// Issuing environment shared with the owning account.
	pub environment: String,
	/// Client the token was issued to.
	pub client_id: String,
	/// Raw refresh token string.
	pub secret: TokenSecret,
}
impl RefreshTokenEntity {
	/// Builds a refresh token entity from resolved identity fields and the raw token.
	pub fn new(
		home_account_id: impl Into<String>,
		environment: impl Into<String>,
		client_id: impl Into<String>,
		raw: impl Into<String>,
	) -> Self {
		Self {
			home_account_id: home_account_id.into(),
			environment: environment.into(),
			client_id: client_id.into(),
			secret: TokenSecret::new(raw),
		}
	}

	/// Fully-populated key fields for this entity.
	pub fn key(&self) -> CredentialKey {
		CredentialKey {
			home_account_id: self.home_account_id.clone(),
			environment: self.environment.clone(),
			kind: CredentialKind::RefreshToken,
			client_id: self.client_id.clone(),
			realm: String::new(),
			target: String::new(),
		}
	}

	/// Renders the deterministic cache key.
	pub fn cache_key(&self) -> String {
		self.key().render()
	}
}
