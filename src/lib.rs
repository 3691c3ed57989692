//! Client-side OAuth 2.0/OIDC credential cache: deterministic cache keys, external-token
//! ingestion, and a shared interaction-flow protocol in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod cache;
pub mod crypto;
pub mod error;
pub mod ingest;
pub mod obs;
pub mod protocol;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixture builders for integration tests; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		authority::{AuthorityOptions, UrlAuthorityResolver},
		ingest::{ExecutionContext, TokenCacheIngestor},
		store::{CredentialStore, MemoryStore},
	};

	/// Client identifier shared by test fixtures.
	pub const TEST_CLIENT_ID: &str = "client-1234";

	/// Encodes a JSON value as an unsigned compact JWT suitable for claim decoding.
	pub fn encode_test_jwt(payload: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());

		format!("{header}.{body}.")
	}

	/// Encodes a `uid`/`utid` pair as a base64 client-info blob.
	pub fn encode_test_client_info(uid: &str, utid: &str) -> String {
		URL_SAFE_NO_PAD.encode(format!(r#"{{"uid":"{uid}","utid":"{utid}"}}"#).as_bytes())
	}

	/// Constructs an ingestor backed by an in-memory store and URL-based authority
	/// resolution, returning the store handle for direct inspection.
	pub fn build_test_ingestor() -> (TokenCacheIngestor, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let resolver = Arc::new(UrlAuthorityResolver);
		let ingestor = TokenCacheIngestor::new(
			store,
			resolver,
			AuthorityOptions::default(),
			TEST_CLIENT_ID,
			ExecutionContext { supports_persistence: true },
		);

		(ingestor, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use tokio as _;
