//! REST API exposure
//!
//! Consumes an [`AppState`] and produces the Axum `Router` of the service:
//! health checks at the root, resource routes nested under the API prefix,
//! request tracing and permissive CORS on top.

use crate::server::router::build_api_routes;
use crate::server::state::AppState;
use anyhow::{Result, bail};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router
    ///
    /// # Arguments
    ///
    /// * `state` - Collections, query layer and credentials shared by the handlers
    /// * `api_prefix` - Mount point of the resource routes (`/api/v1`); empty or `/` mounts them at the root
    /// * `custom_routes` - Additional routes merged at the root
    pub fn build_router(
        state: AppState,
        api_prefix: &str,
        custom_routes: Vec<Router>,
    ) -> Result<Router> {
        let api_routes = build_api_routes(state);
        let prefix = api_prefix.trim_end_matches('/');

        let mut app = if prefix.is_empty() {
            Self::health_routes().merge(api_routes)
        } else if prefix.starts_with('/') {
            Self::health_routes().nest(prefix, api_routes)
        } else {
            bail!("api_prefix must start with '/', got '{}'", api_prefix);
        };

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        ))
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "devcamper"
        }))
    }
}
