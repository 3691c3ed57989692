// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use oauth2_token_cache::{
	auth::ScopeSet,
	authority::{AuthorityOptions, UrlAuthorityResolver},
	cache::AccountInfo,
	error::{Error, IngestionError},
	ingest::{
		ExecutionContext, ExternalTokenResponse, IngestOptions, IngestRequest,
		TokenCacheIngestor,
	},
	store::{CredentialStore, MemoryStore},
};

const CLIENT_ID: &str = "client-1234";
const AUTHORITY: &str = "https://login.example.com/common";

fn encode_jwt(payload: &serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());

	format!("{header}.{body}.")
}

fn encode_client_info(uid: &str, utid: &str) -> String {
	URL_SAFE_NO_PAD.encode(format!(r#"{{"uid":"{uid}","utid":"{utid}"}}"#).as_bytes())
}

fn test_jwt() -> String {
	encode_jwt(&json!({
		"sub": "sub-1",
		"oid": "oid-1",
		"tid": "tenant-1",
		"preferred_username": "user@example.com",
		"name": "Example User",
	}))
}

fn build_ingestor() -> (TokenCacheIngestor, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let ingestor = TokenCacheIngestor::new(
		store,
		Arc::new(UrlAuthorityResolver),
		AuthorityOptions::default(),
		CLIENT_ID,
		ExecutionContext { supports_persistence: true },
	);

	(ingestor, store_backend)
}

fn full_response() -> ExternalTokenResponse {
	ExternalTokenResponse {
		id_token: Some(test_jwt()),
		client_info: Some(encode_client_info("uid-1", "utid-1")),
		access_token: Some("AT1".into()),
		expires_in: Some(3_600),
		refresh_token: Some("RT1".into()),
	}
}

fn full_options() -> IngestOptions {
	IngestOptions::new().with_extended_expires_on(OffsetDateTime::now_utc() + Duration::hours(2))
}

fn authority_request() -> IngestRequest {
	let scopes = ScopeSet::new(["openid", "User.Read"]).expect("Scope fixture should be valid.");

	IngestRequest::new().with_authority(AUTHORITY).with_scopes(scopes)
}

#[tokio::test]
async fn missing_id_token_fails_regardless_of_other_fields() {
	let (ingestor, _) = build_ingestor();
	let response = ExternalTokenResponse { id_token: None, ..full_response() };
	let err = ingestor
		.ingest_external_tokens(&authority_request(), &response, &full_options())
		.await
		.expect_err("Responses without an ID token must be rejected.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingIdToken)));
}

#[tokio::test]
async fn missing_account_and_authority_fails() {
	let (ingestor, _) = build_ingestor();
	let err = ingestor
		.ingest_external_tokens(&IngestRequest::new(), &full_response(), &full_options())
		.await
		.expect_err("Requests without an account or authority must be rejected.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingAccountOrAuthority)));
}

#[tokio::test]
async fn missing_client_info_fails_when_resolving_from_authority() {
	let (ingestor, _) = build_ingestor();
	let response = ExternalTokenResponse { client_info: None, ..full_response() };
	let err = ingestor
		.ingest_external_tokens(&authority_request(), &response, &full_options())
		.await
		.expect_err("Authority-based identity without client info must be rejected.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingClientInfo)));
}

#[tokio::test]
async fn response_client_info_is_used_when_options_carry_none() {
	let (ingestor, _) = build_ingestor();
	let record = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &full_options())
		.await
		.expect("Response-supplied client info should satisfy identity resolution.");

	assert_eq!(record.account.home_account_id, "uid-1.utid-1");
}

#[tokio::test]
async fn options_client_info_wins_over_response() {
	let (ingestor, _) = build_ingestor();
	let options = full_options().with_client_info(encode_client_info("uid-2", "utid-2"));
	let record = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &options)
		.await
		.expect("Options-supplied client info should take precedence.");

	let winning_blob = encode_client_info("uid-2", "utid-2");

	assert_eq!(record.account.home_account_id, "uid-2.utid-2");
	assert_eq!(record.account.client_info.as_deref(), Some(winning_blob.as_str()));
}

#[tokio::test]
async fn access_token_without_expires_in_fails() {
	let (ingestor, _) = build_ingestor();
	let response = ExternalTokenResponse { expires_in: None, ..full_response() };
	let err = ingestor
		.ingest_external_tokens(&authority_request(), &response, &full_options())
		.await
		.expect_err("Access tokens without expires_in must be rejected.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingExpiry)));
}

#[tokio::test]
async fn access_token_without_extended_expiry_fails() {
	let (ingestor, _) = build_ingestor();
	let err = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &IngestOptions::new())
		.await
		.expect_err("Access tokens without an extended expiry must be rejected.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingExpiry)));
}

#[tokio::test]
async fn failed_access_token_validation_leaves_prior_writes_in_place() {
	let (ingestor, store) = build_ingestor();
	let err = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &IngestOptions::new())
		.await
		.expect_err("Missing extended expiry must fail the call.");

	assert!(matches!(err, Error::Ingestion(IngestionError::MissingExpiry)));

	// Account and ID token were persisted before validation failed; they stay written.
	let keys = store.token_keys().await.expect("Key listing should succeed.");

	assert_eq!(keys.id_tokens.len(), 1);
	assert!(keys.access_tokens.is_empty());
	assert!(keys.refresh_tokens.is_empty());
}

#[tokio::test]
async fn repeated_ingestion_overwrites_instead_of_duplicating() {
	let (ingestor, store) = build_ingestor();
	let first = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &full_options())
		.await
		.expect("First ingestion should succeed.");
	let second = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &full_options())
		.await
		.expect("Second ingestion should succeed.");

	assert_eq!(first.account.cache_key(), second.account.cache_key());
	assert_eq!(first.id_token.cache_key(), second.id_token.cache_key());
	assert_eq!(
		first.access_token.as_ref().map(|e| e.cache_key()),
		second.access_token.as_ref().map(|e| e.cache_key())
	);
	assert_eq!(
		first.refresh_token.as_ref().map(|e| e.cache_key()),
		second.refresh_token.as_ref().map(|e| e.cache_key())
	);
	assert_eq!(store.len(), 4, "Re-ingestion must overwrite, not duplicate.");
}

#[tokio::test]
async fn scope_variants_collide_to_the_same_access_token_key() {
	let (ingestor, _) = build_ingestor();
	let scopes = ScopeSet::new(["USER.READ", "user.read", "openid"])
		.expect("Scope fixture should be valid.");
	let shuffled = IngestRequest::new().with_authority(AUTHORITY).with_scopes(scopes);
	let first = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &full_options())
		.await
		.expect("Ingestion with ordered scopes should succeed.");
	let second = ingestor
		.ingest_external_tokens(&shuffled, &full_response(), &full_options())
		.await
		.expect("Ingestion with shuffled scopes should succeed.");

	assert_eq!(
		first.access_token.expect("First record should carry an access token.").cache_key(),
		second.access_token.expect("Second record should carry an access token.").cache_key(),
	);
}

#[tokio::test]
async fn existing_account_skips_authority_resolution() {
	let (ingestor, _) = build_ingestor();
	let account = AccountInfo {
		home_account_id: "uid-1.utid-1".into(),
		environment: "login.example.com".into(),
		tenant_id: "tenant-1".into(),
		username: Some("user@example.com".into()),
	};
	let request = IngestRequest::new().with_account(account);
	let record = ingestor
		.ingest_external_tokens(&request, &full_response(), &full_options())
		.await
		.expect("Ingestion with an existing account should succeed.");

	assert_eq!(record.account.home_account_id, "uid-1.utid-1");
	assert_eq!(record.account.realm, "tenant-1");
	assert_eq!(record.id_token.realm, "tenant-1");
}

#[tokio::test]
async fn full_response_produces_a_complete_record() {
	let (ingestor, store) = build_ingestor();
	let before = OffsetDateTime::now_utc();
	let record = ingestor
		.ingest_external_tokens(&authority_request(), &full_response(), &full_options())
		.await
		.expect("End-to-end ingestion should succeed.");

	assert_eq!(record.account.environment, "login.example.com");
	assert_eq!(record.account.realm, "common");
	assert_eq!(record.id_token.client_id, CLIENT_ID);

	let access = record.access_token.expect("Record should carry an access token.");

	assert_eq!(access.secret.expose(), "AT1");
	assert!(access.cache_key().contains("-accesstoken-"));

	let lower = before + Duration::seconds(3_600);
	let upper = OffsetDateTime::now_utc() + Duration::seconds(3_600);

	assert!(access.expires_on >= lower && access.expires_on <= upper);

	let refresh = record.refresh_token.expect("Record should carry a refresh token.");

	assert_eq!(refresh.secret.expose(), "RT1");

	// The record mirrors what was persisted.
	let stored = store
		.get_access_token(&access.cache_key())
		.await
		.expect("Access-token read should succeed.")
		.expect("Access token should be persisted under its derived key.");

	assert_eq!(stored, access);
}

#[tokio::test]
async fn omitted_refresh_token_yields_none_without_error() {
	let (ingestor, _) = build_ingestor();
	let response = ExternalTokenResponse { refresh_token: None, ..full_response() };
	let record = ingestor
		.ingest_external_tokens(&authority_request(), &response, &full_options())
		.await
		.expect("Ingestion without a refresh token should succeed.");

	assert!(record.refresh_token.is_none());
	assert!(record.access_token.is_some());
}

#[tokio::test]
async fn omitted_access_token_yields_none_without_error() {
	let (ingestor, _) = build_ingestor();
	let response = ExternalTokenResponse {
		access_token: None,
		expires_in: None,
		refresh_token: None,
		..full_response()
	};
	let record = ingestor
		.ingest_external_tokens(&authority_request(), &response, &IngestOptions::new())
		.await
		.expect("ID-token-only ingestion should succeed.");

	assert!(record.access_token.is_none());
	assert!(record.refresh_token.is_none());
}
