use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::client::OAuthClient;
use super::pkce::PkceChallenge;
use super::sessions::{SessionCheck, SessionRegistry};
use super::state::OAuthSession;
use crate::error::ProxyError;
use crate::models::now_millis;
use crate::store::CredentialStore;

/// Returned to the frontend that starts an authorization.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub auth_url: String,
    pub state: String,
    pub code_verifier: String,
}

/// Query parameters Etsy appends to the redirect URI.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Starts an authorization attempt: PKCE pair, nonce, encoded state and consent URL.
pub async fn begin_authorization(
    client: &OAuthClient,
    sessions: &SessionRegistry,
) -> Result<AuthorizationRequest, ProxyError> {
    let pkce = PkceChallenge::generate();
    let session = OAuthSession::new(pkce.verifier.clone());
    let state = session.encode_state()?;
    let auth_url = client.authorization_url(&pkce.challenge, &state)?;

    sessions.remember(&session).await;
    info!(nonce = %session.nonce, "Issued OAuth authorization URL");

    Ok(AuthorizationRequest {
        auth_url,
        state,
        code_verifier: pkce.verifier,
    })
}

/// Finishes an authorization attempt and stores the resulting credential.
///
/// Returns the new absolute token expiry in milliseconds. On any error the store
/// is left exactly as it was.
pub async fn complete_authorization(
    params: &CallbackParams,
    client: &OAuthClient,
    sessions: &SessionRegistry,
    store: &dyn CredentialStore,
) -> Result<i64, ProxyError> {
    if let Some(error) = &params.error {
        warn!(
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "Provider returned an error to the OAuth callback"
        );
        return Err(ProxyError::ProviderDenied(error.clone()));
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(ProxyError::NoAuthorizationCode)?;
    let state = params
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ProxyError::InvalidState)?;

    let session = OAuthSession::decode_state(state)?;
    match sessions.check(&session).await {
        SessionCheck::Verified => {}
        SessionCheck::Mismatch => {
            warn!(nonce = %session.nonce, "OAuth state verifier does not match the issued session");
            return Err(ProxyError::InvalidState);
        }
        SessionCheck::Unknown if sessions.is_strict() => {
            warn!(nonce = %session.nonce, "OAuth state was not issued by this process");
            return Err(ProxyError::InvalidState);
        }
        SessionCheck::Unknown => {
            info!(nonce = %session.nonce, "Accepting self-contained OAuth state");
        }
    }

    let issued_at = now_millis();
    let tokens = client.exchange_code(code, &session.code_verifier).await?;
    let expiry = tokens.expiry_from(issued_at);

    store
        .set(&tokens.access_token, tokens.refresh_token.as_deref(), expiry)
        .await
        .map_err(ProxyError::Store)?;

    info!(
        token_expiry = expiry,
        has_refresh_token = tokens.refresh_token.is_some(),
        "Shop owner authorized the application"
    );
    Ok(expiry)
}
