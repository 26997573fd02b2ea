//! API exposure modules
//!
//! Each exposure consumes an [`AppState`](crate::server::AppState) and
//! produces a Router for its protocol.

pub mod rest;

pub use rest::RestExposure;
