use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Etsy application credentials and endpoints.
///
/// The endpoint URLs default to Etsy's production hosts; tests point them at a
/// local mock server.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct EtsyConfig {
    /// The app keystring. Etsy uses it both as the OAuth client id and as the
    /// `x-api-key` header value.
    pub client_id: String,
    #[serde(default)]
    pub shared_secret: Option<String>,
    pub shop_name: String,
    pub redirect_uri: String,
    pub frontend_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
}

/// Settings for pending authorization attempts.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct OAuthConfig {
    /// How long an issued `state` stays redeemable.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Reject callbacks whose `state` was not issued by this process.
    #[serde(default = "default_strict_state")]
    pub strict_state: bool,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            strict_state: default_strict_state(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    vec!["listings_r".to_string(), "shops_r".to_string()]
}

fn default_api_base() -> String {
    "https://openapi.etsy.com/v3".to_string()
}

fn default_token_url() -> String {
    "https://api.etsy.com/v3/public/oauth/token".to_string()
}

fn default_authorize_url() -> String {
    "https://www.etsy.com/oauth/connect".to_string()
}

fn default_session_ttl() -> u64 {
    600
}

fn default_strict_state() -> bool {
    true
}
