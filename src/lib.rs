//! Library exports for shopgate, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod etsy;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
