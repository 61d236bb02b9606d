//! OAuth 2.0 Authorization Code + PKCE flow against Etsy.

pub mod client;
pub mod flow;
pub mod pkce;
pub mod sessions;
pub mod state;

pub use client::OAuthClient;
pub use flow::{begin_authorization, complete_authorization, AuthorizationRequest, CallbackParams};
pub use pkce::PkceChallenge;
pub use sessions::SessionRegistry;
pub use state::OAuthSession;
