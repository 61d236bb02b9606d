//! Shared application state.
//!
//! Contains the state that is shared across all request handlers: configuration,
//! the credential store, pending OAuth sessions and the outbound clients.

use crate::auth::AuthGuard;
use crate::config::ConfigV1;
use crate::etsy::EtsyClient;
use crate::oauth::{OAuthClient, SessionRegistry};
use crate::store::CredentialStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The shop owner's credential and cached shop id.
    pub store: Arc<dyn CredentialStore>,
    /// Authorizations started by `/oauth/init` and not yet completed.
    pub sessions: Arc<SessionRegistry>,
    /// Etsy token endpoint client.
    pub oauth: Arc<OAuthClient>,
    /// Etsy API client.
    pub etsy: Arc<EtsyClient>,
    /// Token validity and shop id precondition for proxied calls.
    pub guard: Arc<AuthGuard>,
}
