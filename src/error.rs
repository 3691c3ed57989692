//! Cache-level error types shared across ingestion, the interaction protocol, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Cryptographic provider failure.
	#[error("{0}")]
	Crypto(
		#[from]
		#[source]
		crate::crypto::CryptoError,
	),
	/// Authority resolution or discovery failure.
	#[error(transparent)]
	Authority(#[from] crate::authority::AuthorityError),
	/// Token ingestion rejected the caller's input.
	#[error(transparent)]
	Ingestion(#[from] IngestionError),
	/// Request normalization rejected the caller's input.
	#[error(transparent)]
	Request(#[from] RequestError),
}

/// Validation failures raised while ingesting external token material.
///
/// Every variant is a caller-input-class failure: non-retriable, surfaced synchronously,
/// and phrased as a remediation hint naming the field to supply.
#[derive(Debug, ThisError)]
pub enum IngestionError {
	/// Token response carried no ID token.
	#[error("Token response is missing an ID token; supply id_token on the response.")]
	MissingIdToken,
	/// Neither an account nor an authority accompanied the request.
	#[error("Request must carry either an account reference or an authority string.")]
	MissingAccountOrAuthority,
	/// No client-info blob was available to derive an identity from.
	#[error(
		"Client info is required to resolve identity from an authority; supply it via the \
		 ingestion options or the response's client_info field."
	)]
	MissingClientInfo,
	/// An access token was supplied without its full expiry pair.
	#[error(
		"Access tokens require both response.expires_in and options.extended_expires_on; supply \
		 both or omit the access token."
	)]
	MissingExpiry,
	/// No carried identity and no inputs to compute one.
	#[error(
		"Home account identity could not be resolved; supply a home account id on the request or \
		 the claims/client-info needed to derive one."
	)]
	UnresolvedIdentity,
	/// The execution context does not support persistence.
	#[error(
		"Token ingestion requires a persistence-capable execution context; construct the engine \
		 inside a browser-hosted environment."
	)]
	UnsupportedEnvironment,
	/// ID token payload could not be decoded.
	#[error("ID token payload could not be decoded.")]
	MalformedIdToken(#[from] crate::auth::TokenDecodeError),
	/// Client-info blob could not be decoded.
	#[error("Client-info blob could not be decoded.")]
	MalformedClientInfo(#[from] crate::auth::ClientInfoDecodeError),
}

/// Request-normalization failures raised by the base interaction protocol.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// SSH scheme requested without its JSON web key.
	#[error("The SSH authentication scheme requires an SSH JWK on the request; supply ssh_jwk.")]
	MissingSshJwk,
	/// SSH scheme requested without its key identifier.
	#[error(
		"The SSH authentication scheme requires an SSH key id on the request; supply ssh_kid."
	)]
	MissingSshKid,
	/// Redirect URI could not be resolved to an absolute form.
	#[error("Redirect URI is invalid.")]
	InvalidRedirectUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
