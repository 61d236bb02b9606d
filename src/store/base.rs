use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{memory_store::MemoryStore, mongodb_store::MongoDBStore};
use crate::config::{SeedTokens, StoreBackend, StoreConfig};
use crate::models::{now_millis, TokenState};

/// Holds the single shop owner's credential and the resolved shop id.
///
/// Every handler receives the same instance through `AppState`. Backends decide
/// how far the state is shared: the memory store is per process, the MongoDB
/// store is visible to every instance pointed at the same collection.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<TokenState, String>;

    /// Overwrites the credential and marks the store authenticated.
    async fn set(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: i64,
    ) -> Result<(), String>;

    /// Forgets the credential. The cached shop id survives, it does not depend on the token.
    async fn clear(&self) -> Result<(), String>;

    async fn shop_id(&self) -> Result<Option<u64>, String>;
    async fn set_shop_id(&self, shop_id: u64) -> Result<(), String>;

    /// True iff a token is present, the store is flagged authenticated and `now < expiry`.
    async fn is_authenticated(&self) -> Result<bool, String> {
        Ok(self.get().await?.is_authenticated_at(now_millis()))
    }

    fn backend_name(&self) -> &str;
}

/// Creates a concrete store implementation based on the StoreConfig, then
/// applies the configured seed tokens.
pub async fn create_store(
    config: &StoreConfig,
    shop_name: &str,
) -> Result<Arc<dyn CredentialStore>, String> {
    let store: Arc<dyn CredentialStore> = match &config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory credential store.");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::MongoDB(mongo_config) => {
            let store = MongoDBStore::new(mongo_config, shop_name).await?;
            info!("Successfully created MongoDB credential store.");
            Arc::new(store)
        }
    };

    if let Some(seed) = &config.seed {
        seed_store(store.as_ref(), seed).await?;
    }

    Ok(store)
}

/// Pre-populates the store from configured tokens.
///
/// Skipped when the store already holds an access token: a durable backend may
/// carry a rotated refresh token that is newer than the configured one.
pub async fn seed_store(store: &dyn CredentialStore, seed: &SeedTokens) -> Result<bool, String> {
    if store.get().await?.has_access_token() {
        debug!(
            backend = store.backend_name(),
            "Credential store already populated, ignoring seed tokens"
        );
        return Ok(false);
    }

    store
        .set(
            &seed.access_token,
            seed.refresh_token.as_deref(),
            seed.token_expiry,
        )
        .await?;
    info!(
        backend = store.backend_name(),
        token_expiry = seed.token_expiry,
        "Credential store seeded from configuration"
    );
    Ok(true)
}
