//! Cryptographic provider boundary: GUIDs, string hashing, key-material teardown.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Boxed future returned by cryptographic-provider operations.
///
/// Platform providers (e.g. browser SubtleCrypto) may be genuinely asynchronous, so
/// every operation is a potential suspension point.
pub type CryptoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CryptoError>> + 'a + Send>>;

/// Error type produced by [`CryptoProvider`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CryptoError {
	/// Provider-level failure.
	#[error("Cryptographic provider failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Cryptographic collaborator contract consumed by the protocol layer.
pub trait CryptoProvider
where
	Self: Send + Sync,
{
	/// Generates a fresh GUID for request correlation.
	fn new_guid(&self) -> CryptoFuture<'_, String>;

	/// Computes a stable hash of the provided string (used as a cache-differentiation
	/// signal for requested claims).
	fn hash_string<'a>(&'a self, value: &'a str) -> CryptoFuture<'a, String>;

	/// Clears any key material the provider maintains (token-binding keys etc.).
	fn clear_keystore(&self) -> CryptoFuture<'_, ()>;
}

/// Pure-software provider backed by the process RNG and SHA-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareCrypto;
impl SoftwareCrypto {
	fn guid_now() -> String {
		let mut bytes: [u8; 16] = rand::rng().random();

		// RFC 4122 version 4, variant 10x.
		bytes[6] = (bytes[6] & 0x0F) | 0x40;
		bytes[8] = (bytes[8] & 0x3F) | 0x80;

		let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();

		format!("{}-{}-{}-{}-{}", &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..])
	}

	fn hash_now(value: &str) -> String {
		let mut hasher = Sha256::new();

		hasher.update(value.as_bytes());

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl CryptoProvider for SoftwareCrypto {
	fn new_guid(&self) -> CryptoFuture<'_, String> {
		Box::pin(async { Ok(Self::guid_now()) })
	}

	fn hash_string<'a>(&'a self, value: &'a str) -> CryptoFuture<'a, String> {
		Box::pin(async move { Ok(Self::hash_now(value)) })
	}

	fn clear_keystore(&self) -> CryptoFuture<'_, ()> {
		// Software provider keeps no key material.
		Box::pin(async { Ok(()) })
	}
}
