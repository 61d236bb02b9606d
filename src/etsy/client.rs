use axum::http::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EtsyConfig;
use crate::error::ProxyError;

/// A successful Etsy response, relayed as-is by the proxy endpoints.
#[derive(Debug, Clone)]
pub struct EtsyResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Authenticated GETs against `{api_base}/application/...`.
///
/// Every request carries the shop owner's bearer token and the app keystring as
/// `x-api-key`.
pub struct EtsyClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl EtsyClient {
    pub fn new(http: reqwest::Client, config: &EtsyConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.client_id.clone(),
        }
    }

    pub async fn get(
        &self,
        path: &str,
        access_token: &str,
        query: &[(String, String)],
    ) -> Result<EtsyResponse, ProxyError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(url = %url, params = query.len(), "Calling Etsy");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("x-api-key", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream {
                status: None,
                message: format!("request to {} failed: {}", path, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, %status, body = %body, "Etsy returned an error");
            return Err(ProxyError::Upstream {
                status: Some(status),
                message: format!("{} answered {}", path, status),
            });
        }

        let body = response.json::<Value>().await.map_err(|e| ProxyError::Upstream {
            status: Some(status),
            message: format!("unreadable body from {}: {}", path, e),
        })?;

        Ok(EtsyResponse { status, body })
    }
}
