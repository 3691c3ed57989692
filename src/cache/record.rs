//! Cache records composed by a single ingestion call.

// self
use crate::{
	_prelude::*,
	cache::entity::{AccessTokenEntity, AccountEntity, IdTokenEntity, RefreshTokenEntity},
};

/// Entities produced (and persisted) by one ingestion call.
///
/// The record mirrors exactly what was written through the storage adapter; it is not
/// re-read from storage. Access and refresh tokens are `None` when the provider issued
/// none, which is not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
	/// Account entity anchoring the record.
	pub account: AccountEntity,
	/// ID token credential.
	pub id_token: IdTokenEntity,
	/// Access token credential, when the response carried one.
	pub access_token: Option<AccessTokenEntity>,
	/// Refresh token credential, when the provider issued one.
	pub refresh_token: Option<RefreshTokenEntity>,
}
