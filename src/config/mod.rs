//! Configuration loading and management

use crate::core::advanced::QueryDefaults;
use crate::core::auth::{AuthenticatedUser, Role, StaticTokenCredentials};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding `server.port`
pub const PORT_ENV: &str = "PORT";

/// Listening address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A development bearer token bound to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub role: Role,
}

/// Complete configuration of the directory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,

    /// Prefix of every API route (e.g., "/api/v1")
    pub api_prefix: String,

    /// Defaults of the list endpoints
    pub query: QueryDefaults,

    pub credentials: Vec<CredentialConfig>,

    /// Fixture directory imported at start-up
    pub seed_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api_prefix: "/api/v1".to_string(),
            query: QueryDefaults::default(),
            credentials: Vec::new(),
            seed_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply the `PORT` environment variable, when set and numeric
    pub fn with_env_overrides(self) -> Self {
        self.with_port_override(std::env::var(PORT_ENV).ok().as_deref())
    }

    fn with_port_override(mut self, port: Option<&str>) -> Self {
        if let Some(port) = port.and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        self
    }

    /// Token table built from `credentials`
    pub fn static_credentials(&self) -> StaticTokenCredentials {
        self.credentials
            .iter()
            .fold(StaticTokenCredentials::new(), |credentials, entry| {
                credentials.with_token(
                    entry.token.clone(),
                    AuthenticatedUser::new(entry.user_id.clone(), entry.role),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.address(), "127.0.0.1:5000");
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.query.default_limit, 25);
        assert_eq!(config.query.default_sort, "-createdAt");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            r#"
server:
  port: 8080
query:
  default_limit: 10
credentials:
  - token: dev-admin
    user_id: 5c8a1d5b0190b214360dc031
    role: admin
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.query.default_sort, "-createdAt");
        assert_eq!(config.credentials[0].role, Role::Admin);
        assert_eq!(config.static_credentials().len(), 1);
    }

    #[test]
    fn test_port_override() {
        let config = AppConfig::default().with_port_override(Some("7000"));
        assert_eq!(config.server.port, 7000);

        let config = AppConfig::default().with_port_override(Some("not-a-port"));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(AppConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
