use cached::{Cached, TimedCache};
use tokio::sync::Mutex;
use tracing::debug;

use super::state::OAuthSession;

/// What the registry knows about the nonce in a callback's `state`.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionCheck {
    /// Issued here and the verifier matches.
    Verified,
    /// Issued here but the verifier differs.
    Mismatch,
    /// Never issued here, or already redeemed, or expired.
    Unknown,
}

/// Pending authorization attempts issued by this process, keyed by nonce.
///
/// Entries are single-use and only leave the registry when redeemed or when
/// their lifespan ends, so a burst of new authorizations cannot push out a
/// pending one.
pub struct SessionRegistry {
    sessions: Mutex<TimedCache<String, String>>,
    strict: bool,
}

impl SessionRegistry {
    pub fn new(ttl_secs: u64, strict: bool) -> Self {
        Self {
            sessions: Mutex::new(TimedCache::with_lifespan(ttl_secs)),
            strict,
        }
    }

    /// Whether callbacks with an unknown nonce must be rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub async fn remember(&self, session: &OAuthSession) {
        let mut sessions = self.sessions.lock().await;
        sessions.flush();
        sessions.cache_set(session.nonce.clone(), session.code_verifier.clone());
        debug!(pending = sessions.cache_size(), "Recorded OAuth session");
    }

    /// Redeems the nonce of `session`. A nonce can be redeemed once.
    pub async fn check(&self, session: &OAuthSession) -> SessionCheck {
        let mut sessions = self.sessions.lock().await;
        let expected = sessions.cache_get(&session.nonce).cloned();
        sessions.cache_remove(&session.nonce);
        match expected {
            Some(verifier) if verifier == session.code_verifier => SessionCheck::Verified,
            Some(_) => SessionCheck::Mismatch,
            None => SessionCheck::Unknown,
        }
    }
}
