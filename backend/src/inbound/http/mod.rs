//! HTTP inbound adapter exposing the feed and engagement REST endpoints.

pub mod engagement;
pub mod error;
pub mod feed;
pub mod health;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
