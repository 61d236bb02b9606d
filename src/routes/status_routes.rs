//! Authentication status and configuration diagnostics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use crate::models::now_millis;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers the status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/status", get(auth_status))
        .route("/admin/status", get(admin_status))
        .route("/auth/config", get(auth_config))
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AuthStatusResponse {
    authenticated: bool,
    expires_at: Option<i64>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AdminStatusResponse {
    admin_authenticated: bool,
    message: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ConfigDiagnostics {
    client_id_set: bool,
    shared_secret_set: bool,
    redirect_uri: String,
    frontend_url: String,
    scopes: Vec<String>,
    store_backend: String,
    strict_state: bool,
    required_callback_url: String,
}

fn store_failure(e: String) -> HTTPError {
    error!("Store error: {}", e);
    HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "Credential store unavailable")
}

/// Whether the stored token is usable right now, and when it expires.
async fn auth_status(State(state): State<AppState>) -> Result<Json<AuthStatusResponse>, HTTPError> {
    let tokens = state.store.get().await.map_err(store_failure)?;
    Ok(Json(AuthStatusResponse {
        authenticated: tokens.valid_access_token(now_millis()).is_some(),
        expires_at: tokens.token_expiry,
    }))
}

/// Whether the shop owner has authorized the app on behalf of all visitors.
async fn admin_status(
    State(state): State<AppState>,
) -> Result<Json<AdminStatusResponse>, HTTPError> {
    let authenticated = state.store.is_authenticated().await.map_err(store_failure)?;
    let message = if authenticated {
        "Shop owner has authenticated - all visitors can see products"
    } else {
        "Shop owner needs to authenticate once for all visitors to see products"
    };
    Ok(Json(AdminStatusResponse {
        admin_authenticated: authenticated,
        message,
    }))
}

/// OAuth configuration as this process sees it, with secrets reduced to presence flags.
async fn auth_config(State(state): State<AppState>) -> Json<ConfigDiagnostics> {
    let etsy = &state.config.etsy;
    Json(ConfigDiagnostics {
        client_id_set: !etsy.client_id.is_empty(),
        shared_secret_set: etsy
            .shared_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty()),
        redirect_uri: etsy.redirect_uri.clone(),
        frontend_url: etsy.frontend_url.clone(),
        scopes: etsy.scopes.clone(),
        store_backend: state.store.backend_name().to_string(),
        strict_state: state.sessions.is_strict(),
        required_callback_url: etsy.redirect_uri.clone(),
    })
}
