use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, the unit every expiry in this crate uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The shop owner's credential as held by the credential store.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry in milliseconds since the epoch.
    pub token_expiry: Option<i64>,
    pub is_authenticated: bool,
}

impl TokenState {
    /// Returns the access token if it is still usable at `now` (milliseconds).
    pub fn valid_access_token(&self, now: i64) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        match self.token_expiry {
            Some(expiry) if now < expiry => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated_at(&self, now: i64) -> bool {
        self.is_authenticated && self.valid_access_token(now).is_some()
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Body of a successful response from the OAuth token endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    /// Etsy rotates refresh tokens, but the field is optional in RFC 6749 refresh responses.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl TokenResponse {
    /// Absolute expiry in milliseconds for a response received at `issued_at`.
    ///
    /// A negative lifetime counts as already expired and a huge one saturates.
    pub fn expiry_from(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.expires_in.max(0).saturating_mul(1000))
    }
}

/// Extracts the numeric Etsy user id that prefixes an access token (`{user_id}.{opaque}`).
pub fn user_id_from_token(token: &str) -> Option<u64> {
    let prefix = token.split('.').next()?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
