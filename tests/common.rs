#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::Value;
use shopgate::config::{extract_config, ConfigV1};
use shopgate::routes::create_router;
use shopgate::startup::build_state;
use shopgate::state::AppState;

pub const FRONTEND_URL: &str = "http://localhost:3000";
pub const SHOP_NAME: &str = "Innovative3DShop";

/// Config pointing every Etsy endpoint at `etsy_url`, plus an optional raw
/// `store:` section.
pub fn test_config(etsy_url: &str, store_section: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
logging:
  level: debug
  format: console
etsy:
  client_id: keystring
  shared_secret: very-secret
  shop_name: {shop}
  redirect_uri: http://localhost:8080/oauth/callback
  frontend_url: {frontend}
  api_base: {etsy}/v3
  token_url: {etsy}/v3/public/oauth/token
  authorize_url: https://www.etsy.com/oauth/connect
{store}
"#,
        shop = SHOP_NAME,
        frontend = FRONTEND_URL,
        etsy = etsy_url,
        store = store_section,
    );

    extract_config(Figment::new().merge(Yaml::string(&yaml))).expect("test config should parse")
}

/// A `store:` section seeding the given tokens.
pub fn seeded_store(access_token: &str, refresh_token: Option<&str>, token_expiry: i64) -> String {
    let refresh = refresh_token
        .map(|r| format!("    refresh_token: \"{}\"\n", r))
        .unwrap_or_default();
    format!(
        "store:\n  type: memory\n  seed:\n    access_token: \"{}\"\n{}    token_expiry: {}\n",
        access_token, refresh, token_expiry
    )
}

pub async fn build_app(config: ConfigV1) -> (Router, AppState) {
    let state = build_state(Arc::new(config))
        .await
        .expect("state should build");
    (create_router(state.clone()), state)
}

pub fn get(path: &str) -> Request<Body> {
    request(path, Method::GET)
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
