//! ID-token claim snapshots decoded from compact JWTs.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors emitted while decoding a compact JWT payload.
#[derive(Debug, ThisError)]
pub enum TokenDecodeError {
	/// The token is not a three-segment compact JWT.
	#[error("Token is not in compact JWT form (header.payload.signature).")]
	MalformedCompactJwt,
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload JSON could not be deserialized.
	#[error("Token payload contains malformed JSON.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Claims snapshot extracted from an ID token's payload segment.
///
/// Only the payload is decoded; signature verification belongs to the protocol
/// collaborator and never happens here. Claims the cache does not model are retained
/// verbatim in [`extra`](Self::extra) so the account snapshot stays lossless.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
	/// Subject claim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Object/directory identifier claim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub oid: Option<String>,
	/// Tenant identifier claim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tid: Option<String>,
	/// Preferred username claim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preferred_username: Option<String>,
	/// Display name claim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Remaining claims, preserved for the account snapshot.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl IdTokenClaims {
	/// Decodes the payload segment of a compact JWT without verifying its signature.
	pub fn decode(compact: &str) -> Result<Self, TokenDecodeError> {
		let payload =
			compact.split('.').nth(1).ok_or(TokenDecodeError::MalformedCompactJwt)?;

		if payload.is_empty() {
			return Err(TokenDecodeError::MalformedCompactJwt);
		}

		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		Ok(serde_path_to_error::deserialize(&mut deserializer)?)
	}

	/// Returns the local account identifier (`oid`, falling back to `sub`).
	pub fn local_account_id(&self) -> Option<&str> {
		self.oid.as_deref().or(self.sub.as_deref())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::_preludet::encode_test_jwt;

	#[test]
	fn decode_extracts_modeled_and_extra_claims() {
		let jwt = encode_test_jwt(&json!({
			"sub": "sub-1",
			"oid": "oid-1",
			"tid": "tenant-1",
			"preferred_username": "user@example.com",
			"aud": "client-1234",
		}));
		let claims = IdTokenClaims::decode(&jwt).expect("Test JWT payload should decode.");

		assert_eq!(claims.sub.as_deref(), Some("sub-1"));
		assert_eq!(claims.local_account_id(), Some("oid-1"));
		assert_eq!(claims.extra.get("aud"), Some(&json!("client-1234")));
	}

	#[test]
	fn local_account_id_falls_back_to_sub() {
		let jwt = encode_test_jwt(&json!({ "sub": "sub-only" }));
		let claims = IdTokenClaims::decode(&jwt).expect("Test JWT payload should decode.");

		assert_eq!(claims.local_account_id(), Some("sub-only"));
	}

	#[test]
	fn malformed_tokens_error() {
		assert!(matches!(
			IdTokenClaims::decode("not-a-jwt"),
			Err(TokenDecodeError::MalformedCompactJwt)
		));
		assert!(matches!(
			IdTokenClaims::decode("a..c"),
			Err(TokenDecodeError::MalformedCompactJwt)
		));
		assert!(matches!(IdTokenClaims::decode("a.!!!.c"), Err(TokenDecodeError::Base64(_))));
	}
}
