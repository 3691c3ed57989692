//! Base interaction protocol shared by every concrete interaction flow.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	authority::{Authority, AuthorityOptions, AuthorityResolver},
	cache::AccountInfo,
	crypto::CryptoProvider,
	error::RequestError,
	obs::{self, InteractionKind, StageOutcome},
	store::{CredentialStore, WrapperMetadata},
};

/// Boxed future returned by interaction-flow operations.
pub type FlowFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Authentication scheme requested for the resulting tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationScheme {
	/// Plain bearer tokens.
	#[default]
	Bearer,
	/// SSH certificate scheme; requires an SSH JWK and key id on the request.
	Ssh,
}

/// Caller-supplied request before normalization.
#[derive(Clone, Debug, Default)]
pub struct PartialRequest {
	/// Authority to acquire against; falls back to the configured default.
	pub authority: Option<String>,
	/// Requested scopes; defaults to the empty ordered set.
	pub scopes: Option<ScopeSet>,
	/// Correlation id; a fresh GUID is assigned when unset.
	pub correlation_id: Option<String>,
	/// Authentication scheme; defaults to Bearer.
	pub authentication_scheme: Option<AuthenticationScheme>,
	/// Additional claims challenge string, when the caller carries one.
	pub claims: Option<String>,
	/// SSH public key (JWK) for the SSH scheme.
	pub ssh_jwk: Option<String>,
	/// SSH key identifier for the SSH scheme.
	pub ssh_kid: Option<String>,
	/// Account hint carried into the flow.
	pub account: Option<AccountInfo>,
}

/// Fully normalized request handed to concrete flows.
#[derive(Clone, Debug)]
pub struct NormalizedRequest {
	/// Resolved authority string.
	pub authority: String,
	/// Ordered, canonicalized scope set (possibly empty).
	pub scopes: ScopeSet,
	/// Correlation id tagging every downstream event of this flow.
	pub correlation_id: String,
	/// Validated authentication scheme.
	pub authentication_scheme: AuthenticationScheme,
	/// Claims challenge string, when non-empty.
	pub claims: Option<String>,
	/// Stable hash of the claims string, used as a cache-differentiation signal.
	pub requested_claims_hash: Option<String>,
	/// SSH public key (JWK), present iff the scheme is SSH.
	pub ssh_jwk: Option<String>,
	/// SSH key identifier, present iff the scheme is SSH.
	pub ssh_kid: Option<String>,
	/// Account hint carried through normalization.
	pub account: Option<AccountInfo>,
}

/// Host configuration consumed by the base protocol.
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
	/// Client identifier of the hosting application.
	pub client_id: String,
	/// Default authority used when requests carry none.
	pub default_authority: String,
	/// Default redirect URI used when requests carry none.
	pub default_redirect_uri: Option<String>,
	/// Authority resolution options (protocol mode, known authorities, metadata).
	pub authority_options: AuthorityOptions,
}

/// Result handed back by a concrete flow's token acquisition.
#[derive(Clone, Debug)]
pub struct AuthenticationResult {
	/// Account the tokens belong to.
	pub account: AccountInfo,
	/// Raw ID token.
	pub id_token: TokenSecret,
	/// Raw access token.
	pub access_token: TokenSecret,
	/// Scopes granted to the access token.
	pub scopes: ScopeSet,
	/// Absolute access-token expiry.
	pub expires_on: OffsetDateTime,
	/// Correlation id of the flow that produced this result.
	pub correlation_id: String,
	/// Scheme the tokens were issued under.
	pub authentication_scheme: AuthenticationScheme,
}

/// Contract every concrete interaction flow supplies.
///
/// Flows hold a [`BaseInteractionProtocol`] handle for the shared behavior
/// (normalization, discovery, telemetry, logout clearing) and implement only the two
/// flow-specific operations.
pub trait InteractionFlow
where
	Self: Send + Sync,
{
	/// Shared protocol instance backing this flow.
	fn protocol(&self) -> &BaseInteractionProtocol;

	/// Acquires tokens for the provided request.
	fn acquire_token<'a>(
		&'a self,
		request: &'a PartialRequest,
	) -> FlowFuture<'a, AuthenticationResult>;

	/// Ends the session for the provided account (or all accounts when `None`).
	fn logout<'a>(&'a self, account: Option<&'a AccountInfo>) -> FlowFuture<'a, ()>;
}

/// Shared, non-overridable protocol operations consumed by every interaction flow.
pub struct BaseInteractionProtocol {
	config: ProtocolConfig,
	store: Arc<dyn CredentialStore>,
	crypto: Arc<dyn CryptoProvider>,
	resolver: Arc<dyn AuthorityResolver>,
	kind: InteractionKind,
}
impl BaseInteractionProtocol {
	/// Creates a protocol instance for one flow kind.
	pub fn new(
		config: ProtocolConfig,
		store: Arc<dyn CredentialStore>,
		crypto: Arc<dyn CryptoProvider>,
		resolver: Arc<dyn AuthorityResolver>,
		kind: InteractionKind,
	) -> Self {
		Self { config, store, crypto, resolver, kind }
	}

	/// Flow kind this instance is bound to.
	pub fn kind(&self) -> InteractionKind {
		self.kind
	}

	/// Host configuration backing this instance.
	pub fn config(&self) -> &ProtocolConfig {
		&self.config
	}

	/// Normalizes a partial request: authority and scope defaulting, correlation-id
	/// assignment, scheme validation, and claims-hash attachment.
	///
	/// Emits a performance-measurement event tagged with the request's correlation id.
	pub async fn initialize_base_request(
		&self,
		partial: &PartialRequest,
	) -> Result<NormalizedRequest> {
		let started = std::time::Instant::now();

		obs::record_stage_outcome(self.kind, StageOutcome::Attempt);

		let result = self.initialize_inner(partial).await;

		match &result {
			Ok(normalized) => {
				obs::record_request_init(self.kind, &normalized.correlation_id, started.elapsed());
				obs::record_stage_outcome(self.kind, StageOutcome::Success);
			},
			Err(_) => obs::record_stage_outcome(self.kind, StageOutcome::Failure),
		}

		result
	}

	async fn initialize_inner(&self, partial: &PartialRequest) -> Result<NormalizedRequest> {
		let authority = partial
			.authority
			.clone()
			.unwrap_or_else(|| self.config.default_authority.clone());
		let scopes = partial.scopes.clone().unwrap_or_default();
		let correlation_id = match &partial.correlation_id {
			Some(id) => id.clone(),
			None => self.crypto.new_guid().await?,
		};
		let authentication_scheme = partial.authentication_scheme.unwrap_or_default();
		let (ssh_jwk, ssh_kid) = match authentication_scheme {
			AuthenticationScheme::Ssh => {
				let jwk = partial.ssh_jwk.clone().ok_or(RequestError::MissingSshJwk)?;
				let kid = partial.ssh_kid.clone().ok_or(RequestError::MissingSshKid)?;

				(Some(jwk), Some(kid))
			},
			AuthenticationScheme::Bearer => (None, None),
		};
		let claims = partial.claims.clone().filter(|c| !c.is_empty());
		let requested_claims_hash = match claims.as_deref() {
			Some(value) => Some(self.crypto.hash_string(value).await?),
			None => None,
		};

		Ok(NormalizedRequest {
			authority,
			scopes,
			correlation_id,
			authentication_scheme,
			claims,
			requested_claims_hash,
			ssh_jwk,
			ssh_kid,
			account: partial.account.clone(),
		})
	}

	/// Resolves the redirect URI for this flow: explicit over configured default over
	/// the current execution location, absolutized against that location.
	pub fn redirect_uri(
		&self,
		explicit: Option<&str>,
		current_location: &Url,
	) -> Result<String> {
		let preferred =
			explicit.map(str::to_owned).or_else(|| self.config.default_redirect_uri.clone());

		match preferred {
			Some(raw) => current_location
				.join(&raw)
				.map(|url| url.to_string())
				.map_err(|source| RequestError::InvalidRedirectUri { source }.into()),
			None => Ok(current_location.to_string()),
		}
	}

	/// Builds the per-call server telemetry manager for one protocol API invocation.
	pub async fn server_telemetry(
		&self,
		api_id: u32,
		force_refresh: bool,
		correlation_id: &str,
	) -> Result<ServerTelemetryManager> {
		let wrapper = self.store.wrapper_metadata().await?;

		Ok(ServerTelemetryManager {
			client_id: self.config.client_id.clone(),
			correlation_id: correlation_id.to_owned(),
			api_id,
			force_refresh,
			wrapper,
			store: self.store.clone(),
		})
	}

	/// Returns a fully discovered authority for the explicitly requested string or the
	/// configured default. Suspends for the resolver's discovery round trip.
	pub async fn discovered_authority(
		&self,
		request_authority: Option<&str>,
	) -> Result<Authority> {
		let authority = request_authority.unwrap_or(&self.config.default_authority);

		Ok(self.resolver.discover(authority, &self.config.authority_options).await?)
	}

	/// Tears down cache state on logout.
	///
	/// With an account: clears the active-account marker only when it identity-matches
	/// the given account, then removes that account's entities by derived key. Without
	/// an account: clears the entire cache and the crypto provider's key material.
	/// Clearing is best-effort; failures are logged and swallowed, never surfaced.
	pub async fn clear_cache_on_logout(&self, account: Option<&AccountInfo>) {
		match account {
			Some(account) => {
				match self.store.get_active_account().await {
					Ok(Some(active)) if active.same_identity(account) =>
						if let Err(error) = self.store.set_active_account(None).await {
							tracing::warn!(
								%error,
								"Failed to clear the active-account marker during logout.",
							);
						},
					Ok(_) => {},
					Err(error) => {
						tracing::warn!(
							%error,
							"Failed to read the active-account marker during logout.",
						);
					},
				}

				if let Err(error) = self.store.remove_account(&account.cache_key()).await {
					tracing::warn!(
						%error,
						"Failed to remove account entities during logout; cache left unchanged.",
					);
				}
			},
			None => {
				if let Err(error) = self.store.clear().await {
					tracing::warn!(%error, "Failed to clear the cache during logout.");
				}
				if let Err(error) = self.crypto.clear_keystore().await {
					tracing::warn!(%error, "Failed to clear crypto key material during logout.");
				}
			},
		}
	}
}
impl Debug for BaseInteractionProtocol {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BaseInteractionProtocol")
			.field("client_id", &self.config.client_id)
			.field("kind", &self.kind)
			.finish()
	}
}

/// Per-call telemetry payload bound to the storage backend.
#[derive(Clone)]
pub struct ServerTelemetryManager {
	/// Client identifier of the hosting application.
	pub client_id: String,
	/// Correlation id of the call being instrumented.
	pub correlation_id: String,
	/// Protocol API identifier.
	pub api_id: u32,
	/// Whether the caller forced a cache bypass.
	pub force_refresh: bool,
	/// Wrapper metadata pulled from storage at construction.
	pub wrapper: WrapperMetadata,
	store: Arc<dyn CredentialStore>,
}
impl ServerTelemetryManager {
	/// Telemetry schema version embedded in request headers.
	pub const SCHEMA_VERSION: u8 = 5;

	/// Renders the current-request telemetry header value.
	pub fn request_header(&self) -> String {
		format!(
			"{}|{},{}|{},{}",
			Self::SCHEMA_VERSION,
			self.api_id,
			u8::from(self.force_refresh),
			self.wrapper.sku.as_deref().unwrap_or_default(),
			self.wrapper.version.as_deref().unwrap_or_default(),
		)
	}

	/// Re-reads wrapper metadata from the bound storage backend.
	pub async fn refresh_wrapper_metadata(&mut self) -> Result<()> {
		self.wrapper = self.store.wrapper_metadata().await?;

		Ok(())
	}
}
impl Debug for ServerTelemetryManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServerTelemetryManager")
			.field("client_id", &self.client_id)
			.field("correlation_id", &self.correlation_id)
			.field("api_id", &self.api_id)
			.field("force_refresh", &self.force_refresh)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		authority::UrlAuthorityResolver,
		crypto::SoftwareCrypto,
		error::Error,
		store::MemoryStore,
	};

	fn protocol_with_store(store: Arc<dyn CredentialStore>) -> BaseInteractionProtocol {
		BaseInteractionProtocol::new(
			ProtocolConfig {
				client_id: "client-1234".into(),
				default_authority: "https://login.example.com/common".into(),
				default_redirect_uri: None,
				authority_options: AuthorityOptions::default(),
			},
			store,
			Arc::new(SoftwareCrypto),
			Arc::new(UrlAuthorityResolver),
			InteractionKind::Silent,
		)
	}

	fn protocol() -> BaseInteractionProtocol {
		protocol_with_store(Arc::new(MemoryStore::default()))
	}

	#[tokio::test]
	async fn initialize_defaults_authority_scopes_scheme_and_correlation() {
		let normalized = protocol()
			.initialize_base_request(&PartialRequest::default())
			.await
			.expect("Empty partial request should normalize.");

		assert_eq!(normalized.authority, "https://login.example.com/common");
		assert!(normalized.scopes.is_empty());
		assert_eq!(normalized.authentication_scheme, AuthenticationScheme::Bearer);
		assert_eq!(normalized.correlation_id.len(), 36, "A fresh GUID should be assigned.");
		assert_eq!(normalized.requested_claims_hash, None);
	}

	#[tokio::test]
	async fn initialize_keeps_caller_correlation_id() {
		let partial = PartialRequest {
			correlation_id: Some("caller-supplied".into()),
			..Default::default()
		};
		let normalized = protocol()
			.initialize_base_request(&partial)
			.await
			.expect("Partial request with a correlation id should normalize.");

		assert_eq!(normalized.correlation_id, "caller-supplied");
	}

	#[tokio::test]
	async fn ssh_scheme_requires_jwk_and_kid() {
		let base = protocol();
		let missing_jwk = PartialRequest {
			authentication_scheme: Some(AuthenticationScheme::Ssh),
			..Default::default()
		};
		let err = base
			.initialize_base_request(&missing_jwk)
			.await
			.expect_err("SSH scheme without a JWK must be rejected.");

		assert!(matches!(err, Error::Request(RequestError::MissingSshJwk)));

		let missing_kid = PartialRequest {
			authentication_scheme: Some(AuthenticationScheme::Ssh),
			ssh_jwk: Some("{\"kty\":\"RSA\"}".into()),
			..Default::default()
		};
		let err = base
			.initialize_base_request(&missing_kid)
			.await
			.expect_err("SSH scheme without a key id must be rejected.");

		assert!(matches!(err, Error::Request(RequestError::MissingSshKid)));
	}

	#[tokio::test]
	async fn non_empty_claims_get_hashed() {
		let partial = PartialRequest {
			claims: Some("{\"access_token\":{\"xms_cc\":{\"values\":[\"CP1\"]}}}".into()),
			..Default::default()
		};
		let normalized = protocol()
			.initialize_base_request(&partial)
			.await
			.expect("Partial request with claims should normalize.");

		assert!(normalized.requested_claims_hash.is_some());

		let empty = PartialRequest { claims: Some(String::new()), ..Default::default() };
		let normalized = protocol()
			.initialize_base_request(&empty)
			.await
			.expect("Empty claims should normalize without a hash.");

		assert_eq!(normalized.requested_claims_hash, None);
		assert_eq!(normalized.claims, None);
	}

	#[tokio::test]
	async fn redirect_uri_prefers_explicit_then_config_then_location() {
		let location =
			Url::parse("https://app.example.com/home/index").expect("Location should parse.");
		let base = protocol();

		assert_eq!(
			base.redirect_uri(Some("/signin"), &location)
				.expect("Explicit redirect should resolve."),
			"https://app.example.com/signin"
		);
		assert_eq!(
			base.redirect_uri(None, &location).expect("Fallback redirect should resolve."),
			"https://app.example.com/home/index"
		);

		let with_default = BaseInteractionProtocol::new(
			ProtocolConfig {
				client_id: "client-1234".into(),
				default_authority: "https://login.example.com/common".into(),
				default_redirect_uri: Some("auth/callback".into()),
				authority_options: AuthorityOptions::default(),
			},
			Arc::new(MemoryStore::default()),
			Arc::new(SoftwareCrypto),
			Arc::new(UrlAuthorityResolver),
			InteractionKind::Popup,
		);

		assert_eq!(
			with_default
				.redirect_uri(None, &location)
				.expect("Configured redirect should resolve."),
			"https://app.example.com/home/auth/callback"
		);
	}

	#[tokio::test]
	async fn telemetry_manager_carries_wrapper_metadata() {
		let store = Arc::new(MemoryStore::default().with_wrapper_metadata("sdk.rs", "1.2.3"));
		let base = protocol_with_store(store);
		let manager = base
			.server_telemetry(861, true, "corr-1")
			.await
			.expect("Telemetry manager should build.");

		assert_eq!(manager.request_header(), "5|861,1|sdk.rs,1.2.3");
		assert_eq!(manager.correlation_id, "corr-1");
	}

	struct StubFlow {
		base: BaseInteractionProtocol,
	}
	impl InteractionFlow for StubFlow {
		fn protocol(&self) -> &BaseInteractionProtocol {
			&self.base
		}

		fn acquire_token<'a>(
			&'a self,
			request: &'a PartialRequest,
		) -> FlowFuture<'a, AuthenticationResult> {
			Box::pin(async move {
				let normalized = self.base.initialize_base_request(request).await?;

				Ok(AuthenticationResult {
					account: AccountInfo {
						home_account_id: "uid-1.utid-1".into(),
						environment: "login.example.com".into(),
						tenant_id: "common".into(),
						username: None,
					},
					id_token: "stub-id-token".into(),
					access_token: "stub-access-token".into(),
					scopes: normalized.scopes,
					expires_on: OffsetDateTime::now_utc(),
					correlation_id: normalized.correlation_id,
					authentication_scheme: normalized.authentication_scheme,
				})
			})
		}

		fn logout<'a>(&'a self, account: Option<&'a AccountInfo>) -> FlowFuture<'a, ()> {
			Box::pin(async move {
				self.base.clear_cache_on_logout(account).await;

				Ok(())
			})
		}
	}

	#[tokio::test]
	async fn flows_compose_over_the_shared_protocol() {
		let flow: Box<dyn InteractionFlow> = Box::new(StubFlow { base: protocol() });
		let result = flow
			.acquire_token(&PartialRequest::default())
			.await
			.expect("Stub acquisition should succeed.");

		assert_eq!(flow.protocol().kind(), InteractionKind::Silent);
		assert_eq!(result.authentication_scheme, AuthenticationScheme::Bearer);
		assert_eq!(result.correlation_id.len(), 36);

		flow.logout(None).await.expect("Stub logout should succeed.");
	}

	#[tokio::test]
	async fn discovered_authority_falls_back_to_configured_default() {
		let base = protocol();
		let default = base
			.discovered_authority(None)
			.await
			.expect("Default authority should discover.");

		assert_eq!(default.environment, "login.example.com");
		assert_eq!(default.realm, "common");

		let explicit = base
			.discovered_authority(Some("https://login.example.org/tenant-9"))
			.await
			.expect("Explicit authority should discover.");

		assert_eq!(explicit.environment, "login.example.org");
		assert_eq!(explicit.realm, "tenant-9");
	}
}
