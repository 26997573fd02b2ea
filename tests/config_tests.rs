//! Tests for loading the service configuration from YAML files

use devcamper::config::AppConfig;
use devcamper::core::auth::{CredentialService, Role};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
server:
  host: 0.0.0.0
  port: 8080
api_prefix: /api/v2
query:
  default_limit: 50
  default_sort: name
credentials:
  - token: admin-token
    user_id: a1
    role: admin
  - token: reader-token
    user_id: u1
seed_dir: fixtures
"#
    )
    .unwrap();

    let config = AppConfig::from_yaml_file(file.path()).unwrap();

    assert_eq!(config.server.address(), "0.0.0.0:8080");
    assert_eq!(config.api_prefix, "/api/v2");
    assert_eq!(config.query.default_limit, 50);
    assert_eq!(config.query.default_sort, "name");
    assert_eq!(config.credentials.len(), 2);
    assert_eq!(config.credentials[1].role, Role::User);
    assert_eq!(config.seed_dir, Some(PathBuf::from("fixtures")));
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{}").unwrap();

    let config = AppConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AppConfig::from_yaml_file(dir.path().join("absent.yaml")).is_err());
}

#[test]
fn test_malformed_yaml_is_an_error() {
    assert!(AppConfig::from_yaml_str("server: [unclosed").is_err());
    assert!(AppConfig::from_yaml_str("server:\n  port: not-a-number\n").is_err());
}

#[test]
fn test_demo_config_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/directory_api/config.yaml");
    let config = AppConfig::from_yaml_file(path).unwrap();

    assert_eq!(config.api_prefix, "/api/v1");
    assert_eq!(config.query.default_limit, 25);
    assert!(config.credentials.iter().any(|c| c.role == Role::Admin));
}

#[tokio::test]
async fn test_configured_tokens_authenticate() {
    let config = AppConfig::from_yaml_str(
        r#"
credentials:
  - token: pub-token
    user_id: p1
    role: publisher
"#,
    )
    .unwrap();

    let credentials = config.static_credentials();
    let user = credentials
        .authenticate("pub-token")
        .await
        .unwrap()
        .expect("token should resolve");
    assert_eq!(user.id, "p1");
    assert_eq!(user.role, Role::Publisher);

    assert!(credentials.authenticate("other").await.unwrap().is_none());
}
