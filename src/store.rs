//! Storage contracts and the built-in in-memory backend for credential entities.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	cache::{AccessTokenEntity, AccountEntity, AccountInfo, IdTokenEntity, RefreshTokenEntity},
};

/// Boxed future returned by storage-adapter operations.
///
/// Backends may be synchronous in practice (in-memory) or genuinely asynchronous
/// (persistent stores with async transactions); callers treat every call as a
/// potential suspension point either way.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Pluggable persistence contract for credential entities.
///
/// Every write is keyed by the deterministic scheme in [`crate::cache::key`]; writes to
/// an existing key overwrite, which is what gives re-ingestion its natural refresh
/// semantics. Operations are assumed idempotent on retry.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces an account entity under its derived key.
	fn set_account(&self, entity: AccountEntity) -> StoreFuture<'_, ()>;

	/// Fetches an account entity by its cache key.
	fn get_account<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<AccountEntity>>;

	/// Persists or replaces an ID token credential under its derived key.
	fn set_id_token(&self, entity: IdTokenEntity) -> StoreFuture<'_, ()>;

	/// Fetches an ID token credential by its cache key.
	fn get_id_token<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<IdTokenEntity>>;

	/// Persists or replaces an access token credential under its derived key.
	fn set_access_token(&self, entity: AccessTokenEntity) -> StoreFuture<'_, ()>;

	/// Fetches an access token credential by its cache key.
	fn get_access_token<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<AccessTokenEntity>>;

	/// Persists or replaces a refresh token credential under its derived key.
	fn set_refresh_token(&self, entity: RefreshTokenEntity) -> StoreFuture<'_, ()>;

	/// Fetches a refresh token credential by its cache key.
	fn get_refresh_token<'a>(
		&'a self,
		key: &'a str,
	) -> StoreFuture<'a, Option<RefreshTokenEntity>>;

	/// Removes the account stored under `key` along with every credential that shares
	/// its home-account-id + environment pair.
	fn remove_account<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Clears every entity in the store.
	fn clear(&self) -> StoreFuture<'_, ()>;

	/// Returns the active-account marker, if one is set.
	fn get_active_account(&self) -> StoreFuture<'_, Option<AccountInfo>>;

	/// Sets or clears the active-account marker.
	fn set_active_account(&self, account: Option<AccountInfo>) -> StoreFuture<'_, ()>;

	/// Returns host-wrapper metadata recorded alongside the cache.
	fn wrapper_metadata(&self) -> StoreFuture<'_, WrapperMetadata>;

	/// Lists the cache keys currently held per credential type.
	fn token_keys(&self) -> StoreFuture<'_, TokenKeys>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Host-wrapper SKU/version pair recorded by the embedding library, when any.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperMetadata {
	/// Wrapper SKU identifier.
	pub sku: Option<String>,
	/// Wrapper version string.
	pub version: Option<String>,
}

/// Cache keys currently present, partitioned by credential type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenKeys {
	/// ID token credential keys.
	pub id_tokens: Vec<String>,
	/// Access token credential keys.
	pub access_tokens: Vec<String>,
	/// Refresh token credential keys.
	pub refresh_tokens: Vec<String>,
}
