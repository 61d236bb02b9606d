//! HTTP route definitions and handlers.
//!
//! Routes are grouped by area: the OAuth flow, authentication status, the Etsy
//! proxy, and health checks.

mod health_routes;
mod oauth_routes;
mod proxy_routes;
mod status_routes;

use axum::Router;
use http::{header, HeaderValue, Method};
use reqwest::Url;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router, attaches the application
/// state, and wraps everything in request tracing and CORS for the storefront.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.etsy.frontend_url);

    let router = Router::new()
        .merge(oauth_routes::routes())
        .merge(status_routes::routes())
        .merge(proxy_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS restricted to the storefront's origin.
fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = match Url::parse(frontend_url) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(e) => {
            warn!(frontend_url, error = %e, "frontend_url is not a valid URL; CORS disabled");
            return None;
        }
    };
    let origin = HeaderValue::from_str(&origin).ok()?;

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_needs_valid_origin() {
        assert!(cors_layer("https://shop.example.com/app?x=1").is_some());
        assert!(cors_layer("not a url").is_none());
    }
}
