//! Provider client-info blobs and the home-account join derived from them.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
// self
use crate::_prelude::*;

/// Separator between the `uid` and `utid` halves of a home account identifier.
pub const HOME_ACCOUNT_ID_SEPARATOR: char = '.';

/// Errors emitted while decoding a client-info blob.
#[derive(Debug, ThisError)]
pub enum ClientInfoDecodeError {
	/// Blob is not valid base64.
	#[error("Client info is not valid base64.")]
	Base64(#[from] base64::DecodeError),
	/// Blob JSON could not be deserialized.
	#[error("Client info contains malformed JSON.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Decoded client-info blob identifying an end-user + directory pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
	/// Unique user identifier within the directory.
	pub uid: String,
	/// Unique directory (tenant) identifier.
	pub utid: String,
}
impl ClientInfo {
	/// Decodes a base64 client-info blob (url-safe or standard alphabet, padded or not).
	pub fn decode(raw: &str) -> Result<Self, ClientInfoDecodeError> {
		let trimmed = raw.trim_end_matches('=');
		let bytes = URL_SAFE_NO_PAD.decode(trimmed).or_else(|_| STANDARD_NO_PAD.decode(trimmed))?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		Ok(serde_path_to_error::deserialize(&mut deserializer)?)
	}

	/// Renders the canonical `uid.utid` home account identifier.
	pub fn home_account_id(&self) -> String {
		format!("{}{HOME_ACCOUNT_ID_SEPARATOR}{}", self.uid, self.utid)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::encode_test_client_info;

	#[test]
	fn decode_and_join_home_account_id() {
		let blob = encode_test_client_info("uid-1", "utid-1");
		let info = ClientInfo::decode(&blob).expect("Client-info fixture should decode.");

		assert_eq!(info.uid, "uid-1");
		assert_eq!(info.home_account_id(), "uid-1.utid-1");
	}

	#[test]
	fn decode_tolerates_padding() {
		let padded = format!("{}==", encode_test_client_info("u", "t"));
		let info = ClientInfo::decode(&padded).expect("Padded client info should decode.");

		assert_eq!(info.home_account_id(), "u.t");
	}

	#[test]
	fn malformed_blobs_error() {
		assert!(matches!(ClientInfo::decode("!!!"), Err(ClientInfoDecodeError::Base64(_))));

		let not_json = URL_SAFE_NO_PAD.encode(b"not json");

		assert!(matches!(ClientInfo::decode(&not_json), Err(ClientInfoDecodeError::Json(_))));
	}
}
