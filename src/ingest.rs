//! Token cache ingestion engine: validation, identity derivation, entity construction.

// self
use crate::{
	_prelude::*,
	auth::{ClientInfo, IdTokenClaims, ScopeSet, TokenSecret},
	authority::{AuthorityKind, AuthorityOptions, AuthorityResolver, CloudOptions},
	cache::{
		AccessTokenEntity, AccountEntity, AccountInfo, CacheRecord, IdTokenEntity,
		RefreshTokenEntity,
	},
	error::IngestionError,
	store::CredentialStore,
};

/// Host-decided execution capabilities, injected once at engine construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
	/// Whether the hosting environment supports credential persistence (browser-hosted
	/// contexts do; non-interactive ones do not).
	pub supports_persistence: bool,
}

/// Raw token material supplied by the identity provider or the host application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTokenResponse {
	/// Raw ID token string; mandatory for ingestion.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Base64 client-info blob, when the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_info: Option<String>,
	/// Raw access token string, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	/// Relative expiry in seconds; mandatory whenever `access_token` is present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Raw refresh token string, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}

/// Request context accompanying an ingestion call.
#[derive(Clone, Debug, Default)]
pub struct IngestRequest {
	/// Existing account reference; when set, authority resolution is skipped.
	pub account: Option<AccountInfo>,
	/// Authority string to resolve identity from when no account is given.
	pub authority: Option<String>,
	/// Carried home account identifier; reused verbatim when present (identity is
	/// sticky once established).
	pub home_account_id: Option<String>,
	/// Requested scopes; canonicalized form becomes the access-token key target.
	pub scopes: ScopeSet,
	/// Per-request cloud overrides applied during authority resolution.
	pub cloud_options: Option<CloudOptions>,
}
impl IngestRequest {
	/// Creates an empty request.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches an existing account reference.
	pub fn with_account(mut self, account: AccountInfo) -> Self {
		self.account = Some(account);

		self
	}

	/// Attaches an authority string.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authority = Some(authority.into());

		self
	}

	/// Carries a previously established home account identifier.
	pub fn with_home_account_id(mut self, home_account_id: impl Into<String>) -> Self {
		self.home_account_id = Some(home_account_id.into());

		self
	}

	/// Sets the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Applies per-request cloud overrides.
	pub fn with_cloud_options(mut self, cloud: CloudOptions) -> Self {
		self.cloud_options = Some(cloud);

		self
	}
}

/// Caller-supplied overrides for an ingestion call.
#[derive(Clone, Debug, Default)]
pub struct IngestOptions {
	/// Client-info blob taking precedence over the response's `client_info`.
	pub client_info: Option<String>,
	/// Absolute expiry override; wins over `now + expires_in` when set.
	pub expires_on: Option<OffsetDateTime>,
	/// Extended expiry instant; mandatory whenever the response carries an access token.
	pub extended_expires_on: Option<OffsetDateTime>,
}
impl IngestOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Supplies a client-info blob that wins over the response's.
	pub fn with_client_info(mut self, client_info: impl Into<String>) -> Self {
		self.client_info = Some(client_info.into());

		self
	}

	/// Overrides the absolute expiry instant.
	pub fn with_expires_on(mut self, instant: OffsetDateTime) -> Self {
		self.expires_on = Some(instant);

		self
	}

	/// Supplies the extended expiry instant.
	pub fn with_extended_expires_on(mut self, instant: OffsetDateTime) -> Self {
		self.extended_expires_on = Some(instant);

		self
	}
}

/// Constructs and persists cache records from externally supplied token material.
pub struct TokenCacheIngestor {
	store: Arc<dyn CredentialStore>,
	resolver: Arc<dyn AuthorityResolver>,
	authority_options: AuthorityOptions,
	client_id: String,
	context: ExecutionContext,
}
impl TokenCacheIngestor {
	/// Creates an ingestor bound to the provided collaborators.
	///
	/// The execution context is decided once by the host and held for the engine's
	/// lifetime; a context without persistence support fails every ingestion call.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		resolver: Arc<dyn AuthorityResolver>,
		authority_options: AuthorityOptions,
		client_id: impl Into<String>,
		context: ExecutionContext,
	) -> Self {
		Self { store, resolver, authority_options, client_id: client_id.into(), context }
	}

	/// Validates the supplied token material, derives the account identity, and
	/// persists the resulting entities, returning exactly what was written.
	///
	/// Validation failures surface as [`IngestionError`] variants in declaration
	/// order: missing ID token, missing account/authority, missing client info,
	/// missing expiry pair. An access or refresh token absent from the response
	/// yields `None` for that record field without raising an error.
	///
	/// Writes go through the storage adapter step by step; there is no all-or-nothing
	/// transaction. A failure after the account or ID token has been written leaves
	/// those entities in place.
	pub async fn ingest_external_tokens(
		&self,
		request: &IngestRequest,
		response: &ExternalTokenResponse,
		options: &IngestOptions,
	) -> Result<CacheRecord> {
		if !self.context.supports_persistence {
			return Err(IngestionError::UnsupportedEnvironment.into());
		}

		let id_token =
			response.id_token.as_deref().ok_or(IngestionError::MissingIdToken)?;

		if request.account.is_none() && request.authority.is_none() {
			return Err(IngestionError::MissingAccountOrAuthority.into());
		}

		let claims = IdTokenClaims::decode(id_token).map_err(IngestionError::from)?;
		let anchor = self.resolve_identity(request, response, options, &claims).await?;
		let account = match &anchor.client_info {
			Some(blob) => AccountEntity::full(
				&anchor.home_account_id,
				&anchor.environment,
				&anchor.realm,
				claims,
				blob,
			),
			None => AccountEntity::generic(
				&anchor.home_account_id,
				&anchor.environment,
				&anchor.realm,
				claims,
			),
		};

		self.store.set_account(account.clone()).await?;

		let id_token_entity = IdTokenEntity::new(
			&anchor.home_account_id,
			&anchor.environment,
			&self.client_id,
			&anchor.realm,
			id_token,
		);

		self.store.set_id_token(id_token_entity.clone()).await?;

		let access_token = match response.access_token.as_deref() {
			Some(raw) => {
				let expires_in = response.expires_in.ok_or(IngestionError::MissingExpiry)?;
				let extended_expires_on =
					options.extended_expires_on.ok_or(IngestionError::MissingExpiry)?;
				let cached_at = OffsetDateTime::now_utc();
				let expires_on = options
					.expires_on
					.unwrap_or_else(|| cached_at + Duration::seconds(expires_in));
				let entity = AccessTokenEntity {
					home_account_id: anchor.home_account_id.clone(),
					environment: anchor.environment.clone(),
					client_id: self.client_id.clone(),
					realm: anchor.realm.clone(),
					target: request.scopes.normalized(),
					secret: TokenSecret::new(raw),
					cached_at,
					expires_on,
					extended_expires_on,
				};

				self.store.set_access_token(entity.clone()).await?;

				Some(entity)
			},
			None => None,
		};
		let refresh_token = match response.refresh_token.as_deref() {
			Some(raw) => {
				let entity = RefreshTokenEntity::new(
					&anchor.home_account_id,
					&anchor.environment,
					&self.client_id,
					raw,
				);

				self.store.set_refresh_token(entity.clone()).await?;

				Some(entity)
			},
			None => None,
		};

		tracing::debug!(
			environment = anchor.environment.as_str(),
			realm = anchor.realm.as_str(),
			has_access_token = access_token.is_some(),
			has_refresh_token = refresh_token.is_some(),
			"Ingested external tokens.",
		);

		Ok(CacheRecord { account, id_token: id_token_entity, access_token, refresh_token })
	}

	async fn resolve_identity(
		&self,
		request: &IngestRequest,
		response: &ExternalTokenResponse,
		options: &IngestOptions,
		claims: &IdTokenClaims,
	) -> Result<IdentityAnchor> {
		// `options.client_info` takes precedence over the response's blob.
		let supplied_client_info =
			options.client_info.clone().or_else(|| response.client_info.clone());

		if let Some(account) = &request.account {
			return Ok(IdentityAnchor {
				environment: account.environment.clone(),
				realm: account.tenant_id.clone(),
				home_account_id: account.home_account_id.clone(),
				client_info: supplied_client_info,
			});
		}

		// Presence was validated up front; requests reaching this point carry an
		// authority string.
		let Some(authority) = request.authority.as_deref() else {
			return Err(IngestionError::MissingAccountOrAuthority.into());
		};
		let resolved = self
			.resolver
			.resolve(authority, request.cloud_options.as_ref(), &self.authority_options)
			.await?;
		let client_info =
			supplied_client_info.ok_or(IngestionError::MissingClientInfo)?;
		let home_account_id = match &request.home_account_id {
			Some(carried) => carried.clone(),
			None => derive_home_account_id(resolved.kind, &client_info, claims)?,
		};

		Ok(IdentityAnchor {
			environment: resolved.environment,
			realm: resolved.realm,
			home_account_id,
			client_info: Some(client_info),
		})
	}
}
impl Debug for TokenCacheIngestor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCacheIngestor")
			.field("client_id", &self.client_id)
			.field("context", &self.context)
			.finish()
	}
}

struct IdentityAnchor {
	environment: String,
	realm: String,
	home_account_id: String,
	client_info: Option<String>,
}

fn derive_home_account_id(
	kind: AuthorityKind,
	client_info: &str,
	claims: &IdTokenClaims,
) -> Result<String> {
	match kind {
		AuthorityKind::Adfs | AuthorityKind::Generic => claims
			.sub
			.clone()
			.ok_or_else(|| IngestionError::UnresolvedIdentity.into()),
		AuthorityKind::Default => {
			let info = ClientInfo::decode(client_info).map_err(IngestionError::from)?;

			Ok(info.home_account_id())
		},
	}
}
