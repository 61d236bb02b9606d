use reqwest::Url;
use tracing::{debug, warn};

use crate::config::EtsyConfig;
use crate::error::ProxyError;
use crate::models::TokenResponse;

/// Talks to Etsy's authorization and token endpoints.
pub struct OAuthClient {
    http: reqwest::Client,
    config: EtsyConfig,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, config: &EtsyConfig) -> Self {
        Self {
            http,
            config: config.clone(),
        }
    }

    /// Builds the consent URL the shop owner is sent to.
    pub fn authorization_url(&self, code_challenge: &str, state: &str) -> Result<String, ProxyError> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ];
        Url::parse_with_params(&self.config.authorize_url, &params)
            .map(String::from)
            .map_err(|e| {
                ProxyError::Config(format!(
                    "Invalid authorize_url '{}': {}",
                    self.config.authorize_url, e
                ))
            })
    }

    /// Exchanges an authorization code and its PKCE verifier for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, ProxyError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ])
        .await
    }

    /// Trades a refresh token for a new access token (and usually a new refresh token).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ProxyError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, ProxyError> {
        let grant_type = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");
        debug!(grant_type, url = %self.config.token_url, "Requesting token from Etsy");

        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| ProxyError::TokenExchangeFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(grant_type, %status, body = %body, "Token endpoint rejected the request");
            return Err(ProxyError::TokenExchangeFailed(format!(
                "token endpoint answered {}",
                status
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ProxyError::TokenExchangeFailed(format!("unreadable token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn test_config(url: &str) -> EtsyConfig {
        EtsyConfig {
            client_id: "keystring".to_string(),
            shared_secret: None,
            shop_name: "Innovative3DShop".to_string(),
            redirect_uri: "http://localhost:8080/oauth/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            scopes: vec!["listings_r".to_string(), "shops_r".to_string()],
            api_base: url.to_string(),
            token_url: format!("{}/oauth/token", url),
            authorize_url: "https://www.etsy.com/oauth/connect".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_parameters() {
        let client = OAuthClient::new(reqwest::Client::new(), &test_config("http://unused"));
        let url = Url::parse(&client.authorization_url("challenge", "st4te").unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("www.etsy.com"));
        assert_eq!(url.path(), "/oauth/connect");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("client_id"), Some("keystring"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8080/oauth/callback"));
        assert_eq!(get("scope"), Some("listings_r shops_r"));
        assert_eq!(get("state"), Some("st4te"));
        assert_eq!(get("code_challenge"), Some("challenge"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/oauth/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("client_id".into(), "keystring".into()),
                Matcher::UrlEncoded(
                    "redirect_uri".into(),
                    "http://localhost:8080/oauth/callback".into(),
                ),
                Matcher::UrlEncoded("code".into(), "the-code".into()),
                Matcher::UrlEncoded("code_verifier".into(), "the-verifier".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"999.abc","refresh_token":"r1","expires_in":3600,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let client = OAuthClient::new(reqwest::Client::new(), &test_config(&server.url()));
        let tokens = client.exchange_code("the-code", "the-verifier").await.unwrap();

        m.assert_async().await;
        assert_eq!(tokens.access_token, "999.abc");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_refresh_rejected_grant() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded(
                "grant_type".into(),
                "refresh_token".into(),
            ))
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = OAuthClient::new(reqwest::Client::new(), &test_config(&server.url()));
        let result = client.refresh("rotated-out").await;

        assert!(matches!(result, Err(ProxyError::TokenExchangeFailed(_))));
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let client = OAuthClient::new(reqwest::Client::new(), &test_config(&server.url()));
        assert!(matches!(
            client.refresh("r1").await,
            Err(ProxyError::TokenExchangeFailed(_))
        ));
    }
}
