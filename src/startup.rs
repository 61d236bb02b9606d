//! Application startup and server initialization.
//!
//! Builds the credential store, the outbound clients and the router, then
//! serves on the configured address.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::AuthGuard;
use crate::config::ConfigV1;
use crate::etsy::{EtsyClient, ShopResolver};
use crate::oauth::{OAuthClient, SessionRegistry};
use crate::routes;
use crate::state::AppState;
use crate::store::create_store;

/// Wires every component from the configuration.
///
/// One HTTP client is shared by the token endpoint and API callers.
pub async fn build_state(config: Arc<ConfigV1>) -> Result<AppState, String> {
    let store = create_store(&config.store, &config.etsy.shop_name).await?;

    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let oauth = Arc::new(OAuthClient::new(http.clone(), &config.etsy));
    let etsy = Arc::new(EtsyClient::new(http, &config.etsy));
    let resolver = ShopResolver::new(etsy.clone(), store.clone(), &config.etsy.shop_name);
    let guard = Arc::new(AuthGuard::new(store.clone(), oauth.clone(), resolver));
    let sessions = Arc::new(SessionRegistry::new(
        config.oauth.session_ttl_secs,
        config.oauth.strict_state,
    ));

    Ok(AppState {
        config,
        store,
        sessions,
        oauth,
        etsy,
        guard,
    })
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the store cannot be created, the server fails to bind to
/// the configured address, or it encounters a runtime error while serving.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone()).await?;

    info!(
        shop_name = %config.etsy.shop_name,
        store = state.store.backend_name(),
        authenticated = state.store.is_authenticated().await?,
        "Starting server on {}",
        config.bind_address
    );

    let app = routes::create_router(state);
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
