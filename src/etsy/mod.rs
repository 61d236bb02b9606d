//! Outbound calls to the Etsy Open API v3.

pub mod client;
pub mod shop_resolver;

pub use client::{EtsyClient, EtsyResponse};
pub use shop_resolver::ShopResolver;
