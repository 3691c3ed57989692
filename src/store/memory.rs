//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	cache::{AccessTokenEntity, AccountEntity, AccountInfo, IdTokenEntity, RefreshTokenEntity},
	store::{CredentialStore, StoreFuture, TokenKeys, WrapperMetadata},
};

#[derive(Debug, Default)]
struct MemoryState {
	accounts: HashMap<String, AccountEntity>,
	id_tokens: HashMap<String, IdTokenEntity>,
	access_tokens: HashMap<String, AccessTokenEntity>,
	refresh_tokens: HashMap<String, RefreshTokenEntity>,
	active_account: Option<AccountInfo>,
	wrapper: WrapperMetadata,
}

/// Thread-safe storage backend that keeps entities in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<MemoryState>>);
impl MemoryStore {
	/// Records host-wrapper metadata to be surfaced through the adapter contract.
	pub fn with_wrapper_metadata(self, sku: impl Into<String>, version: impl Into<String>) -> Self {
		self.0.write().wrapper = WrapperMetadata {
			sku: Some(sku.into()),
			version: Some(version.into()),
		};

		self
	}

	/// Number of entities currently held across all partitions.
	pub fn len(&self) -> usize {
		let state = self.0.read();

		state.accounts.len()
			+ state.id_tokens.len()
			+ state.access_tokens.len()
			+ state.refresh_tokens.len()
	}

	/// Returns `true` when no entity is held in any partition.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn remove_account_now(state: &mut MemoryState, key: &str) {
		let Some(account) = state.accounts.remove(key) else {
			return;
		};
		let home = account.home_account_id.to_lowercase();
		let environment = account.environment.to_lowercase();
		let orphaned = |entity_home: &str, entity_env: &str| {
			entity_home.to_lowercase() == home && entity_env.to_lowercase() == environment
		};

		state.id_tokens.retain(|_, e| !orphaned(&e.home_account_id, &e.environment));
		state.access_tokens.retain(|_, e| !orphaned(&e.home_account_id, &e.environment));
		state.refresh_tokens.retain(|_, e| !orphaned(&e.home_account_id, &e.environment));
	}
}
impl CredentialStore for MemoryStore {
	fn set_account(&self, entity: AccountEntity) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().accounts.insert(entity.cache_key(), entity);

			Ok(())
		})
	}

	fn get_account<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<AccountEntity>> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().accounts.get(key).cloned()) })
	}

	fn set_id_token(&self, entity: IdTokenEntity) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().id_tokens.insert(entity.cache_key(), entity);

			Ok(())
		})
	}

	fn get_id_token<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<IdTokenEntity>> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().id_tokens.get(key).cloned()) })
	}

	fn set_access_token(&self, entity: AccessTokenEntity) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().access_tokens.insert(entity.cache_key(), entity);

			Ok(())
		})
	}

	fn get_access_token<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<AccessTokenEntity>> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().access_tokens.get(key).cloned()) })
	}

	fn set_refresh_token(&self, entity: RefreshTokenEntity) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().refresh_tokens.insert(entity.cache_key(), entity);

			Ok(())
		})
	}

	fn get_refresh_token<'a>(
		&'a self,
		key: &'a str,
	) -> StoreFuture<'a, Option<RefreshTokenEntity>> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().refresh_tokens.get(key).cloned()) })
	}

	fn remove_account<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			Self::remove_account_now(&mut state.write(), key);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			*state.write() = MemoryState::default();

			Ok(())
		})
	}

	fn get_active_account(&self) -> StoreFuture<'_, Option<AccountInfo>> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().active_account.clone()) })
	}

	fn set_active_account(&self, account: Option<AccountInfo>) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().active_account = account;

			Ok(())
		})
	}

	fn wrapper_metadata(&self) -> StoreFuture<'_, WrapperMetadata> {
		let state = self.0.clone();

		Box::pin(async move { Ok(state.read().wrapper.clone()) })
	}

	fn token_keys(&self) -> StoreFuture<'_, TokenKeys> {
		let state = self.0.clone();

		Box::pin(async move {
			let state = state.read();
			let mut keys = TokenKeys {
				id_tokens: state.id_tokens.keys().cloned().collect(),
				access_tokens: state.access_tokens.keys().cloned().collect(),
				refresh_tokens: state.refresh_tokens.keys().cloned().collect(),
			};

			keys.id_tokens.sort();
			keys.access_tokens.sort();
			keys.refresh_tokens.sort();

			Ok(keys)
		})
	}
}
