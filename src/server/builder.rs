//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::state::AppState;
use crate::config::AppConfig;
use crate::core::advanced::{QueryDefaults, QueryTranslator};
use crate::core::auth::{CredentialService, StaticTokenCredentials};
use crate::storage::InMemoryDatabase;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the directory HTTP server
///
/// # Example
///
/// ```ignore
/// let db = devcamper::entities::register_relations(InMemoryDatabase::new());
/// let app = ServerBuilder::from_config(&config)
///     .with_database(db)
///     .build()?;
/// ```
pub struct ServerBuilder {
    database: Option<InMemoryDatabase>,
    credentials: Option<Arc<dyn CredentialService>>,
    query_defaults: QueryDefaults,
    api_prefix: String,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            database: None,
            credentials: None,
            query_defaults: QueryDefaults::default(),
            api_prefix: AppConfig::default().api_prefix,
            custom_routes: Vec::new(),
        }
    }

    /// Take the API prefix, query defaults and development tokens from `config`
    pub fn from_config(config: &AppConfig) -> Self {
        let builder = Self::new()
            .with_api_prefix(config.api_prefix.clone())
            .with_query_defaults(config.query.clone());

        if config.credentials.is_empty() {
            builder
        } else {
            builder.with_credentials(config.static_credentials())
        }
    }

    /// Set the database (required)
    ///
    /// Populate paths are resolved through the relations registered on `db`.
    pub fn with_database(mut self, db: InMemoryDatabase) -> Self {
        self.database = Some(db);
        self
    }

    /// Set the service resolving bearer tokens
    pub fn with_credentials(mut self, credentials: impl CredentialService + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn with_query_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.query_defaults = defaults;
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Add custom routes to the server, merged at the root
    ///
    /// Use this for endpoints outside the directory resources, such as a
    /// login flow backed by an external identity provider.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the state shared by the handlers
    pub fn build_state(&mut self) -> Result<AppState> {
        let database = self
            .database
            .take()
            .ok_or_else(|| anyhow::anyhow!("InMemoryDatabase is required. Call .with_database()"))?;

        let credentials = self.credentials.take().unwrap_or_else(|| {
            tracing::warn!("No credentials configured, protected routes will reject every request");
            Arc::new(StaticTokenCredentials::new())
        });

        Ok(AppState::from_database(
            &database,
            QueryTranslator::new(self.query_defaults.clone()),
            credentials,
        ))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        let custom_routes = std::mem::take(&mut self.custom_routes);
        RestExposure::build_router(state, &self.api_prefix, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let api_prefix = self.api_prefix.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {} (API under {})", addr, api_prefix);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialConfig;
    use crate::core::auth::Role;

    // ── Constructor tests ────────────────────────────────────────────────

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.database.is_none());
        assert!(builder.credentials.is_none());
        assert!(builder.custom_routes.is_empty());
        assert_eq!(builder.api_prefix, "/api/v1");
        assert_eq!(builder.query_defaults, QueryDefaults::default());
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.api_prefix = "/v2".into();
        config.query.default_limit = 10;
        config.credentials.push(CredentialConfig {
            token: "t".into(),
            user_id: "u1".into(),
            role: Role::Admin,
        });

        let builder = ServerBuilder::from_config(&config);
        assert_eq!(builder.api_prefix, "/v2");
        assert_eq!(builder.query_defaults.default_limit, 10);
        assert!(builder.credentials.is_some());
    }

    #[test]
    fn test_from_config_without_tokens() {
        let builder = ServerBuilder::from_config(&AppConfig::default());
        assert!(builder.credentials.is_none());
    }

    // ── with_custom_routes ───────────────────────────────────────────────

    #[test]
    fn test_with_custom_routes_appends_router() {
        let builder = ServerBuilder::new()
            .with_custom_routes(Router::new())
            .with_custom_routes(Router::new());
        assert_eq!(builder.custom_routes.len(), 2);
    }

    // ── build_state ──────────────────────────────────────────────────────

    #[test]
    fn test_build_state_without_database_fails() {
        let result = ServerBuilder::new().build_state();
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(
            err_msg.contains("InMemoryDatabase is required"),
            "error should mention the database: {}",
            err_msg
        );
    }

    #[test]
    fn test_build_state_binds_collections() {
        let state = ServerBuilder::new()
            .with_database(InMemoryDatabase::new())
            .with_query_defaults(QueryDefaults {
                default_limit: 5,
                default_sort: "name".into(),
            })
            .build_state()
            .expect("build_state should succeed");

        assert_eq!(state.bootcamps.name(), "bootcamps");
        assert_eq!(state.courses.name(), "courses");
        assert_eq!(state.reviews.name(), "reviews");
        assert_eq!(state.users.name(), "users");
        assert_eq!(state.translator.defaults().default_limit, 5);
    }

    // ── build (REST router) ──────────────────────────────────────────────

    #[test]
    fn test_build_produces_router() {
        let result = ServerBuilder::new()
            .with_database(InMemoryDatabase::new())
            .with_custom_routes(Router::new())
            .build();
        assert!(result.is_ok(), "build should produce a Router");
    }

    #[test]
    fn test_build_at_root_prefix() {
        let result = ServerBuilder::new()
            .with_database(InMemoryDatabase::new())
            .with_api_prefix("/")
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_rejects_relative_prefix() {
        let result = ServerBuilder::new()
            .with_database(InMemoryDatabase::new())
            .with_api_prefix("api")
            .build();
        assert!(result.is_err());
    }
}
