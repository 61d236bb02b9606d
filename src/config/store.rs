use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::mongodb_store::MongoDBConfig;

/// Credential store configuration.
///
/// `type` selects the backend. `seed` optionally pre-populates the shop owner's
/// tokens at boot so a restarted process does not need a fresh authorization.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub seed: Option<SeedTokens>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            seed: None,
        }
    }
}

/// The existing store backends, told apart by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "mongo")]
    MongoDB(MongoDBConfig),
}

/// Tokens carried over from a previous authorization.
///
/// A missing `token_expiry` is treated as already expired, which makes the first
/// guarded call go straight to a refresh.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct SeedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_expiry: i64,
}
