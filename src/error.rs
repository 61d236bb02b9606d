//! Domain errors for the OAuth flow, the auth guard and the Etsy proxy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::utils::http_helpers::HTTPError;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The callback `state` could not be decoded or does not match an issued session.
    #[error("OAuth state is invalid or does not match an issued session")]
    InvalidState,

    #[error("OAuth callback did not include an authorization code")]
    NoAuthorizationCode,

    /// The provider redirected back with an `error` parameter instead of a code.
    #[error("authorization was denied by the provider: {0}")]
    ProviderDenied(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// No usable access token and no way to obtain one without the shop owner.
    #[error("shop owner authentication required")]
    AuthenticationRequired,

    #[error("could not determine the shop id")]
    ShopIdUnresolved,

    #[error("upstream request failed with status {status:?}: {message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("credential store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    /// Opaque reason code used on the frontend redirect after a failed callback.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ProxyError::InvalidState => "invalid_state",
            ProxyError::NoAuthorizationCode => "no_code",
            ProxyError::ProviderDenied(_) => "access_denied",
            ProxyError::TokenExchangeFailed(_) => "token_exchange",
            _ => "server_error",
        }
    }

    /// Whether the caller should answer 401 rather than a generic failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ProxyError::AuthenticationRequired | ProxyError::ShopIdUnresolved
        )
    }

    /// Maps the error onto a response for a proxied `resource`.
    ///
    /// Upstream details stay in the server log; clients only see a generic message.
    pub fn into_http(self, resource: &str) -> HTTPError {
        if self.is_unauthorized() {
            HTTPError::new(StatusCode::UNAUTHORIZED, "Authentication required")
        } else {
            HTTPError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {}", resource),
            )
        }
    }
}
