use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// One authorization attempt.
///
/// The `state` sent to Etsy is this struct as base64url-encoded JSON, so the
/// callback can recover the verifier even when it lands on a process that never
/// saw the attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OAuthSession {
    pub nonce: String,
    pub code_verifier: String,
}

impl OAuthSession {
    pub fn new(code_verifier: impl Into<String>) -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            code_verifier: code_verifier.into(),
        }
    }

    pub fn encode_state(&self) -> Result<String, ProxyError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ProxyError::Config(format!("Failed to encode OAuth state: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode_state(state: &str) -> Result<Self, ProxyError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(state.trim_end_matches('='))
            .map_err(|_| ProxyError::InvalidState)?;
        let session: OAuthSession =
            serde_json::from_slice(&bytes).map_err(|_| ProxyError::InvalidState)?;
        if session.nonce.is_empty() || session.code_verifier.is_empty() {
            return Err(ProxyError::InvalidState);
        }
        Ok(session)
    }
}
