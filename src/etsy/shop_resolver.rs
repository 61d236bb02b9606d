use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::EtsyClient;
use crate::error::ProxyError;
use crate::models::{shops_from_body, user_id_from_token, ShopSummary};
use crate::store::CredentialStore;

/// Finds the numeric shop id for the configured shop name and caches it in the
/// credential store.
pub struct ShopResolver {
    etsy: Arc<EtsyClient>,
    store: Arc<dyn CredentialStore>,
    shop_name: String,
}

impl ShopResolver {
    pub fn new(etsy: Arc<EtsyClient>, store: Arc<dyn CredentialStore>, shop_name: &str) -> Self {
        Self {
            etsy,
            store,
            shop_name: shop_name.to_string(),
        }
    }

    /// Returns the cached shop id, or discovers it: first by public name search,
    /// then through the shops owned by the user the access token belongs to.
    pub async fn resolve(&self, access_token: &str) -> Result<u64, ProxyError> {
        if let Some(shop_id) = self.store.shop_id().await.map_err(ProxyError::Store)? {
            return Ok(shop_id);
        }

        let shop_id = match self.search_by_name(access_token).await {
            Some(id) => id,
            None => self
                .from_owned_shops(access_token)
                .await
                .ok_or(ProxyError::ShopIdUnresolved)?,
        };

        self.store
            .set_shop_id(shop_id)
            .await
            .map_err(ProxyError::Store)?;
        Ok(shop_id)
    }

    async fn search_by_name(&self, access_token: &str) -> Option<u64> {
        debug!(shop_name = %self.shop_name, "Searching for shop by name");
        let query = [
            ("shop_name".to_string(), self.shop_name.clone()),
            ("limit".to_string(), "1".to_string()),
        ];
        match self
            .etsy
            .get("/application/shops", access_token, &query)
            .await
        {
            Ok(response) => {
                let shop = shops_from_body(&response.body).into_iter().next()?;
                info!(shop_id = shop.shop_id, shop_name = %self.shop_name, "Found shop via search");
                Some(shop.shop_id)
            }
            Err(e) => {
                warn!(error = %e, "Shop search failed");
                None
            }
        }
    }

    async fn from_owned_shops(&self, access_token: &str) -> Option<u64> {
        let Some(user_id) = user_id_from_token(access_token) else {
            warn!("Access token does not carry a numeric user id prefix");
            return None;
        };

        debug!(user_id, "Listing shops owned by the authenticated user");
        let path = format!("/application/users/{}/shops", user_id);
        let shops = match self.etsy.get(&path, access_token, &[]).await {
            Ok(response) => shops_from_body(&response.body),
            Err(e) => {
                warn!(user_id, error = %e, "Listing user shops failed");
                return None;
            }
        };

        let chosen = pick_shop(&shops, &self.shop_name);
        match chosen {
            Some(shop) if shop.shop_name == self.shop_name => {
                info!(shop_id = shop.shop_id, shop_name = %shop.shop_name, "Found shop among user shops");
            }
            Some(shop) => {
                info!(
                    shop_id = shop.shop_id,
                    shop_name = %shop.shop_name,
                    wanted = %self.shop_name,
                    "Configured shop not among user shops, using the first one"
                );
            }
            None => {
                warn!(user_id, "Authenticated user owns no shops; the shop owner must authorize the app");
            }
        }
        chosen.map(|shop| shop.shop_id)
    }
}

/// Exact name match first, otherwise the first shop listed.
fn pick_shop<'a>(shops: &'a [ShopSummary], shop_name: &str) -> Option<&'a ShopSummary> {
    shops
        .iter()
        .find(|s| s.shop_name == shop_name)
        .or_else(|| shops.first())
}
