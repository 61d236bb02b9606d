use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::models::TokenState;

/// Process-local credential store.
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<TokenState>,
    shop_id: RwLock<Option<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self) -> Result<TokenState, String> {
        Ok(self.tokens.read().await.clone())
    }

    async fn set(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: i64,
    ) -> Result<(), String> {
        let mut tokens = self.tokens.write().await;
        *tokens = TokenState {
            access_token: Some(access_token.to_string()),
            refresh_token: refresh_token.map(str::to_string),
            token_expiry: Some(token_expiry),
            is_authenticated: true,
        };
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        *self.tokens.write().await = TokenState::default();
        Ok(())
    }

    async fn shop_id(&self) -> Result<Option<u64>, String> {
        Ok(*self.shop_id.read().await)
    }

    async fn set_shop_id(&self, shop_id: u64) -> Result<(), String> {
        *self.shop_id.write().await = Some(shop_id);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
