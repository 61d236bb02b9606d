//! Authenticated pass-through to the Etsy shop resources.
//!
//! Each handler runs the auth guard, forwards to Etsy with the shop owner's
//! credentials and relays the upstream status and JSON body.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::error;

use crate::auth::Credentials;
use crate::error::ProxyError;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

const PAGINATION: &[&str] = &["limit", "offset"];
const LISTING_FILTERS: &[&str] = &["limit", "offset", "sort_on", "sort_order", "keywords"];
const DEFAULT_LIMIT: &str = "100";
const DEFAULT_OFFSET: &str = "0";

/// Registers the proxy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shop", get(shop))
        .route("/listings", get(listings))
        .route("/listings/{id}", get(listing))
        .route("/listings/{id}/images", get(listing_images))
        .route("/listings/{id}/inventory", get(listing_inventory))
        .route("/listings/{id}/reviews", get(listing_reviews))
        .route("/reviews", get(reviews))
        .route("/sections", get(sections))
}

type RawQuery = Query<Vec<(String, String)>>;

/// Keeps the allowed parameters and fills in default pagination.
fn forward_params(
    raw: &[(String, String)],
    allowed: &[&str],
    paginate: bool,
) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = raw
        .iter()
        .filter(|(k, _)| allowed.contains(&k.as_str()))
        .cloned()
        .collect();
    if paginate {
        for (key, default) in [("limit", DEFAULT_LIMIT), ("offset", DEFAULT_OFFSET)] {
            if !params.iter().any(|(k, _)| k == key) {
                params.push((key.to_string(), default.to_string()));
            }
        }
    }
    params
}

/// Listing ids are numeric; anything else is answered before touching Etsy.
fn listing_id(raw: &str) -> Result<u64, HTTPError> {
    raw.parse()
        .map_err(|_| HTTPError::new(StatusCode::BAD_REQUEST, "Invalid listing id"))
}

/// Runs the guard, calls Etsy and relays the answer.
async fn relay<F>(
    state: &AppState,
    resource: &str,
    path_for: F,
    query: &[(String, String)],
) -> Result<Response, HTTPError>
where
    F: FnOnce(&Credentials) -> String,
{
    let result: Result<Response, ProxyError> = async {
        let creds = state.guard.ensure_valid_token().await?;
        let path = path_for(&creds);
        let response = state.etsy.get(&path, &creds.access_token, query).await?;
        Ok((response.status, Json(response.body)).into_response())
    }
    .await;

    result.map_err(|e| {
        error!(resource, error = %e, "Proxy request failed");
        e.into_http(resource)
    })
}

async fn shop(State(state): State<AppState>) -> Result<Response, HTTPError> {
    relay(
        &state,
        "shop",
        |c| format!("/application/shops/{}", c.shop_id),
        &[],
    )
    .await
}

async fn listings(
    State(state): State<AppState>,
    Query(raw): RawQuery,
) -> Result<Response, HTTPError> {
    let query = forward_params(&raw, LISTING_FILTERS, true);
    relay(
        &state,
        "listings",
        |c| format!("/application/shops/{}/listings/active", c.shop_id),
        &query,
    )
    .await
}

async fn listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HTTPError> {
    let id = listing_id(&id)?;
    relay(&state, "listing", |_| format!("/application/listings/{}", id), &[]).await
}

async fn listing_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HTTPError> {
    let id = listing_id(&id)?;
    relay(
        &state,
        "images",
        |_| format!("/application/listings/{}/images", id),
        &[],
    )
    .await
}

async fn listing_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HTTPError> {
    let id = listing_id(&id)?;
    relay(
        &state,
        "inventory",
        |_| format!("/application/listings/{}/inventory", id),
        &[],
    )
    .await
}

async fn listing_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(raw): RawQuery,
) -> Result<Response, HTTPError> {
    let id = listing_id(&id)?;
    let query = forward_params(&raw, PAGINATION, true);
    relay(
        &state,
        "listing reviews",
        |_| format!("/application/listings/{}/reviews", id),
        &query,
    )
    .await
}

async fn reviews(
    State(state): State<AppState>,
    Query(raw): RawQuery,
) -> Result<Response, HTTPError> {
    let query = forward_params(&raw, PAGINATION, true);
    relay(
        &state,
        "reviews",
        |c| format!("/application/shops/{}/reviews", c.shop_id),
        &query,
    )
    .await
}

async fn sections(State(state): State<AppState>) -> Result<Response, HTTPError> {
    relay(
        &state,
        "sections",
        |c| format!("/application/shops/{}/sections", c.shop_id),
        &[],
    )
    .await
}
