use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ProxyError;
use crate::etsy::ShopResolver;
use crate::models::{now_millis, TokenState};
use crate::oauth::OAuthClient;
use crate::store::CredentialStore;

/// What an authenticated Etsy call needs, captured once the guard has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub shop_id: u64,
}

/// Precondition check run before every authenticated Etsy call.
///
/// Refresh is reactive: an expired token is noticed at call time and refreshed
/// then. Concurrent callers within the process share a single refresh.
pub struct AuthGuard {
    store: Arc<dyn CredentialStore>,
    oauth: Arc<OAuthClient>,
    resolver: ShopResolver,
    refresh_lock: Mutex<()>,
}

impl AuthGuard {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        oauth: Arc<OAuthClient>,
        resolver: ShopResolver,
    ) -> Self {
        Self {
            store,
            oauth,
            resolver,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Guarantees a non-expired access token and a resolved shop id.
    ///
    /// Fails with `AuthenticationRequired` when the token is unusable and cannot
    /// be refreshed, and with `ShopIdUnresolved` when the shop cannot be found.
    pub async fn ensure_valid_token(&self) -> Result<Credentials, ProxyError> {
        let access_token = self.fresh_access_token().await?;
        let shop_id = self.resolver.resolve(&access_token).await?;
        Ok(Credentials {
            access_token,
            shop_id,
        })
    }

    async fn fresh_access_token(&self) -> Result<String, ProxyError> {
        let state = self.load().await?;
        if let Some(token) = state.valid_access_token(now_millis()) {
            return Ok(token.to_string());
        }

        let _refreshing = self.refresh_lock.lock().await;
        // Another request may have refreshed while this one waited for the lock.
        let state = self.load().await?;
        if let Some(token) = state.valid_access_token(now_millis()) {
            debug!("Token was refreshed by a concurrent request");
            return Ok(token.to_string());
        }

        match self.refresh_from(&state).await {
            Ok(refreshed) => refreshed
                .access_token
                .ok_or(ProxyError::AuthenticationRequired),
            Err(ProxyError::Store(e)) => Err(ProxyError::Store(e)),
            Err(e) => {
                warn!(error = %e, "Token refresh failed; shop owner must re-authorize");
                Err(ProxyError::AuthenticationRequired)
            }
        }
    }

    /// Trades the stored refresh token for a new credential and stores it.
    ///
    /// Without a refresh token this fails with `AuthenticationRequired` and never
    /// contacts the provider. Provider failures leave the stored state untouched.
    pub async fn refresh_access_token(&self) -> Result<TokenState, ProxyError> {
        let _refreshing = self.refresh_lock.lock().await;
        let state = self.load().await?;
        self.refresh_from(&state).await
    }

    async fn refresh_from(&self, state: &TokenState) -> Result<TokenState, ProxyError> {
        let Some(refresh_token) = state.refresh_token.as_deref() else {
            debug!("No refresh token stored, cannot refresh");
            return Err(ProxyError::AuthenticationRequired);
        };

        let issued_at = now_millis();
        let tokens = self.oauth.refresh(refresh_token).await?;
        let expiry = tokens.expiry_from(issued_at);
        // Etsy rotates refresh tokens; the old one is only kept if none came back.
        let next_refresh = tokens.refresh_token.as_deref().or(Some(refresh_token));

        self.store
            .set(&tokens.access_token, next_refresh, expiry)
            .await
            .map_err(ProxyError::Store)?;
        info!(
            token_expiry = expiry,
            rotated = tokens.refresh_token.is_some(),
            "Refreshed shop owner access token"
        );

        Ok(TokenState {
            access_token: Some(tokens.access_token),
            refresh_token: next_refresh.map(str::to_string),
            token_expiry: Some(expiry),
            is_authenticated: true,
        })
    }

    async fn load(&self) -> Result<TokenState, ProxyError> {
        self.store.get().await.map_err(ProxyError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtsyConfig;
    use crate::etsy::EtsyClient;
    use crate::store::memory_store::MemoryStore;
    use mockito::{Matcher, Server, ServerGuard};

    fn guard_for(server: &ServerGuard, store: Arc<dyn CredentialStore>) -> AuthGuard {
        let config = EtsyConfig {
            client_id: "keystring".to_string(),
            shared_secret: None,
            shop_name: "Innovative3DShop".to_string(),
            redirect_uri: "http://localhost/oauth/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            scopes: vec![],
            api_base: server.url(),
            token_url: format!("{}/oauth/token", server.url()),
            authorize_url: "https://www.etsy.com/oauth/connect".to_string(),
        };
        let http = reqwest::Client::new();
        let etsy = Arc::new(EtsyClient::new(http.clone(), &config));
        let oauth = Arc::new(OAuthClient::new(http, &config));
        let resolver = ShopResolver::new(etsy, store.clone(), &config.shop_name);
        AuthGuard::new(store, oauth, resolver)
    }

    #[tokio::test]
    async fn test_valid_token_and_cached_shop_make_no_calls() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let token = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.abc", Some("r1"), now_millis() + 60_000).await.unwrap();
        store.set_shop_id(555).await.unwrap();

        let creds = guard_for(&server, store).ensure_valid_token().await.unwrap();
        assert_eq!(
            creds,
            Credentials {
                access_token: "999.abc".to_string(),
                shop_id: 555
            }
        );
        any.assert_async().await;
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_requires_authentication() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth/token")
            .expect(0)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.abc", None, now_millis() - 1).await.unwrap();

        let result = guard_for(&server, store).ensure_valid_token().await;
        assert!(matches!(result, Err(ProxyError::AuthenticationRequired)));
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_store_requires_authentication() {
        let server = Server::new_async().await;
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let result = guard_for(&server, store).ensure_valid_token().await;
        assert!(matches!(result, Err(ProxyError::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_rotated() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "r1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"999.new","refresh_token":"r2","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let old_expiry = now_millis() - 1;
        store.set("999.old", Some("r1"), old_expiry).await.unwrap();
        store.set_shop_id(555).await.unwrap();

        let creds = guard_for(&server, store.clone())
            .ensure_valid_token()
            .await
            .unwrap();

        refresh.assert_async().await;
        assert_eq!(creds.access_token, "999.new");
        let state = store.get().await.unwrap();
        assert_eq!(state.refresh_token.as_deref(), Some("r2"));
        assert!(state.token_expiry.unwrap() > old_expiry);
        assert!(store.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_refresh_token_when_not_rotated() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"999.new","expires_in":60}"#)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.old", Some("r1"), 0).await.unwrap();

        let refreshed = guard_for(&server, store.clone())
            .refresh_access_token()
            .await
            .unwrap();
        assert_eq!(refreshed.refresh_token.as_deref(), Some("r1"));
        assert_eq!(
            store.get().await.unwrap().refresh_token.as_deref(),
            Some("r1")
        );
    }

    #[tokio::test]
    async fn test_rejected_refresh_leaves_state_and_requires_authentication() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .expect(1)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.old", Some("r1"), 10).await.unwrap();
        let before = store.get().await.unwrap();

        let result = guard_for(&server, store.clone()).ensure_valid_token().await;

        assert!(matches!(result, Err(ProxyError::AuthenticationRequired)));
        assert_eq!(store.get().await.unwrap(), before);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_does_not_call_provider() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/oauth/token")
            .expect(0)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let result = guard_for(&server, store).refresh_access_token().await;

        assert!(matches!(result, Err(ProxyError::AuthenticationRequired)));
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_unresolvable_shop() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/application/shops")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"count":0,"results":[]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/application/users/999/shops")
            .with_status(200)
            .with_body(r#"{"count":0,"results":[]}"#)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.abc", Some("r1"), now_millis() + 60_000).await.unwrap();

        let result = guard_for(&server, store).ensure_valid_token().await;
        assert!(matches!(result, Err(ProxyError::ShopIdUnresolved)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut server = Server::new_async().await;
        let refresh = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"999.new","refresh_token":"r2","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set("999.old", Some("r1"), 0).await.unwrap();
        store.set_shop_id(555).await.unwrap();
        let guard = Arc::new(guard_for(&server, store));

        let (a, b) = tokio::join!(guard.ensure_valid_token(), guard.ensure_valid_token());

        assert_eq!(a.unwrap().access_token, "999.new");
        assert_eq!(b.unwrap().access_token, "999.new");
        refresh.assert_async().await;
    }
}
