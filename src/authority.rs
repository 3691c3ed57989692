//! Authority descriptors and the resolution/discovery collaborator boundary.

// self
use crate::_prelude::*;

/// Boxed future returned by authority-resolver operations.
pub type AuthorityFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, AuthorityError>> + 'a + Send>>;

/// Errors emitted while resolving or discovering an authority.
#[derive(Debug, ThisError)]
pub enum AuthorityError {
	/// Authority string is not a parseable URL.
	#[error("Authority is not a valid URL.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Authority URL has no host to derive an environment from.
	#[error("Authority `{authority}` has no host component.")]
	MissingHost {
		/// The offending authority string.
		authority: String,
	},
	/// Discovery round trip failed upstream.
	#[error("Authority discovery failed: {message}.")]
	Discovery {
		/// Collaborator-supplied failure summary.
		message: String,
	},
}

/// Protocol mode the host application configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
	/// Directory-aware mode; identities derive from client info.
	#[default]
	Directory,
	/// Plain OIDC mode; identities derive from token claims.
	Oidc,
}

/// Authority type classification driving identity derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityKind {
	/// Directory-backed authority; home identity comes from client info.
	Default,
	/// Federation-service authority (`/adfs`); home identity comes from claims.
	Adfs,
	/// Generic OIDC authority; home identity comes from claims.
	Generic,
}

/// Resolved, validated authority descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
	/// Canonical authority URL.
	pub url: Url,
	/// Environment the authority lives in (host, with port when present).
	pub environment: String,
	/// Realm (tenant) segment of the authority.
	pub realm: String,
	/// Type classification.
	pub kind: AuthorityKind,
}

/// Host-configured authority resolution options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityOptions {
	/// Protocol mode for classification and identity derivation.
	pub protocol_mode: ProtocolMode,
	/// Authorities the host trusts without discovery.
	pub known_authorities: Vec<String>,
	/// Pre-fetched cloud-discovery metadata blob, when the host supplies one.
	pub cloud_discovery_metadata: Option<String>,
	/// Pre-fetched authority metadata blob, when the host supplies one.
	pub authority_metadata: Option<String>,
}

/// Per-request cloud overrides (sovereign-cloud instance / tenant rewrites).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudOptions {
	/// Replacement cloud instance host, when set.
	pub instance: Option<String>,
	/// Replacement tenant, when set.
	pub tenant: Option<String>,
}

/// Authority resolution collaborator contract.
///
/// `resolve` is a local parse/classify step; `discover` is owned by the network-backed
/// collaborator and suspends for its round trip. Timeouts belong to the collaborator,
/// not to this crate.
pub trait AuthorityResolver
where
	Self: Send + Sync,
{
	/// Resolves an authority string (plus any cloud overrides) into a descriptor.
	fn resolve<'a>(
		&'a self,
		authority: &'a str,
		cloud: Option<&'a CloudOptions>,
		options: &'a AuthorityOptions,
	) -> AuthorityFuture<'a, Authority>;

	/// Performs full endpoint discovery for the authority.
	fn discover<'a>(
		&'a self,
		authority: &'a str,
		options: &'a AuthorityOptions,
	) -> AuthorityFuture<'a, Authority>;
}

/// Offline resolver that derives descriptors purely from the authority URL and any
/// host-supplied metadata blobs. Network-backed discovery is the host's concern; this
/// resolver answers `discover` from the URL alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct UrlAuthorityResolver;
impl UrlAuthorityResolver {
	fn resolve_now(
		authority: &str,
		cloud: Option<&CloudOptions>,
		options: &AuthorityOptions,
	) -> Result<Authority, AuthorityError> {
		let mut url =
			Url::parse(authority).map_err(|source| AuthorityError::InvalidUrl { source })?;

		if let Some(instance) = cloud.and_then(|c| c.instance.as_deref()) {
			url.set_host(Some(instance))
				.map_err(|source| AuthorityError::InvalidUrl { source })?;
		}

		let host = url
			.host_str()
			.ok_or_else(|| AuthorityError::MissingHost { authority: authority.to_owned() })?;
		let environment = match url.port() {
			Some(port) => format!("{host}:{port}"),
			None => host.to_owned(),
		};
		let first_segment = url
			.path_segments()
			.and_then(|mut segments| segments.find(|s| !s.is_empty()).map(str::to_owned))
			.unwrap_or_default();
		let realm = cloud
			.and_then(|c| c.tenant.clone())
			.unwrap_or_else(|| first_segment.clone())
			.to_lowercase();
		let kind = if first_segment.eq_ignore_ascii_case("adfs") {
			AuthorityKind::Adfs
		} else if options.protocol_mode == ProtocolMode::Oidc {
			AuthorityKind::Generic
		} else {
			AuthorityKind::Default
		};

		Ok(Authority { url, environment, realm, kind })
	}
}
impl AuthorityResolver for UrlAuthorityResolver {
	fn resolve<'a>(
		&'a self,
		authority: &'a str,
		cloud: Option<&'a CloudOptions>,
		options: &'a AuthorityOptions,
	) -> AuthorityFuture<'a, Authority> {
		Box::pin(async move { Self::resolve_now(authority, cloud, options) })
	}

	fn discover<'a>(
		&'a self,
		authority: &'a str,
		options: &'a AuthorityOptions,
	) -> AuthorityFuture<'a, Authority> {
		Box::pin(async move { Self::resolve_now(authority, None, options) })
	}
}
