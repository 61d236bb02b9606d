use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::{Client, Collection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CredentialStore;
use crate::models::TokenState;

/// The config struct for MongoDB connections.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "credentials".to_string()
}

/// Document shape for the shop credential. There is one document per shop,
/// keyed by the configured shop name.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct CredentialDocument {
    _id: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expiry: Option<i64>,
    #[serde(default)]
    is_authenticated: bool,
    shop_id: Option<i64>,
}

impl CredentialDocument {
    fn token_state(&self) -> TokenState {
        TokenState {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_expiry: self.token_expiry,
            is_authenticated: self.is_authenticated,
        }
    }
}

/// A durable `CredentialStore` so that several instances observe the same
/// token and shop id.
pub struct MongoDBStore {
    collection: Collection<CredentialDocument>,
    key: String,
}

impl MongoDBStore {
    pub async fn new(config: &MongoDBConfig, shop_name: &str) -> Result<Self, String> {
        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| format!("Failed to parse MongoDB URI: {}", e))?;
        info!(
            hosts = %server_hosts(&client_options),
            database = %config.database,
            collection = %config.collection,
            "Connecting to MongoDB"
        );
        client_options.app_name = Some("shopgate".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| format!("Failed to create MongoDB client: {}", e))?;

        let collection = client
            .database(&config.database)
            .collection::<CredentialDocument>(&config.collection);

        Ok(Self {
            collection,
            key: shop_name.to_string(),
        })
    }

    async fn load(&self) -> Result<Option<CredentialDocument>, String> {
        self.collection
            .find_one(doc! { "_id": &self.key }, None)
            .await
            .map_err(|e| format!("Failed to query credential document: {}", e))
    }

    async fn upsert(&self, update: mongodb::bson::Document) -> Result<(), String> {
        self.collection
            .update_one(
                doc! { "_id": &self.key },
                doc! { "$set": update },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(|e| format!("Failed to update credential document: {}", e))?;
        Ok(())
    }
}

/// Host list of a parsed connection string, without credentials or options.
fn server_hosts(options: &ClientOptions) -> String {
    options
        .hosts
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl CredentialStore for MongoDBStore {
    async fn get(&self) -> Result<TokenState, String> {
        Ok(self
            .load()
            .await?
            .map(|d| d.token_state())
            .unwrap_or_default())
    }

    async fn set(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: i64,
    ) -> Result<(), String> {
        debug!(shop = %self.key, token_expiry, "Persisting shop credential");
        self.upsert(doc! {
            "access_token": access_token,
            "refresh_token": refresh_token,
            "token_expiry": token_expiry,
            "is_authenticated": true,
        })
        .await
    }

    async fn clear(&self) -> Result<(), String> {
        self.upsert(doc! {
            "access_token": mongodb::bson::Bson::Null,
            "refresh_token": mongodb::bson::Bson::Null,
            "token_expiry": mongodb::bson::Bson::Null,
            "is_authenticated": false,
        })
        .await
    }

    async fn shop_id(&self) -> Result<Option<u64>, String> {
        Ok(self
            .load()
            .await?
            .and_then(|d| d.shop_id)
            .and_then(|id| u64::try_from(id).ok()))
    }

    async fn set_shop_id(&self, shop_id: u64) -> Result<(), String> {
        let shop_id = i64::try_from(shop_id)
            .map_err(|_| format!("Shop id {} does not fit in a BSON int64", shop_id))?;
        self.upsert(doc! { "shop_id": shop_id }).await
    }

    fn backend_name(&self) -> &str {
        "mongo"
    }
}
