//! Shop owner authorization: consent URL and provider callback.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Url;
use tracing::{error, warn};

use crate::oauth::{begin_authorization, complete_authorization, AuthorizationRequest, CallbackParams};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers the OAuth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/init", get(init))
        .route("/oauth/callback", get(callback))
}

/// Starts an authorization and hands the consent URL, state and verifier to the caller.
async fn init(State(state): State<AppState>) -> Result<Json<AuthorizationRequest>, HTTPError> {
    begin_authorization(&state.oauth, &state.sessions)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Could not start OAuth authorization");
            e.into_http("authorization URL")
        })
}

/// Completes the authorization and sends the browser back to the storefront.
///
/// The browser only ever learns `auth=success` or an opaque `reason`; tokens and
/// provider error bodies stay on the server.
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let frontend_url = &state.config.etsy.frontend_url;
    match complete_authorization(&params, &state.oauth, &state.sessions, state.store.as_ref())
        .await
    {
        Ok(_) => frontend_redirect(frontend_url, &[("auth", "success")]),
        Err(e) => {
            warn!(error = %e, reason = e.reason_code(), "OAuth callback failed");
            frontend_redirect(frontend_url, &[("auth", "error"), ("reason", e.reason_code())])
        }
    }
}

fn frontend_redirect(frontend_url: &str, params: &[(&str, &str)]) -> Redirect {
    match Url::parse_with_params(frontend_url, params) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(e) => {
            warn!(frontend_url, error = %e, "frontend_url is not a valid URL");
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            Redirect::to(&format!("{}?{}", frontend_url, query.join("&")))
        }
    }
}
