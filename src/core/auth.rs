//! Authorization for the directory service
//!
//! Bearer tokens are resolved to an [`AuthContext`] by a [`CredentialService`].
//! Routes gate access with an [`AuthPolicy`]; ownership of individual
//! records is checked with [`AuthenticatedUser::can_modify`].

use crate::core::error::RequestError;
use anyhow::Result;
use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Message returned for missing or unknown credentials
pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller behind a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin rule for updates and deletes
    pub fn can_modify(&self, owner_id: Option<&str>) -> bool {
        self.is_admin() || owner_id == Some(self.id.as_str())
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User(AuthenticatedUser),

    /// No (valid) credentials
    Anonymous,
}

impl AuthContext {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            AuthContext::User(user) => Some(user),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(AuthenticatedUser::is_admin)
    }

    /// Enforce `policy` and return the caller
    ///
    /// Fails with 401 for anonymous callers even under [`AuthPolicy::Public`],
    /// since there is no user to return.
    pub fn authorize(&self, policy: &AuthPolicy) -> Result<&AuthenticatedUser, RequestError> {
        policy.enforce(self)?;
        self.user().ok_or_else(|| RequestError::Unauthorized {
            message: NOT_AUTHORIZED.to_string(),
        })
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<Role>),
}

impl AuthPolicy {
    /// Any of the given roles
    pub fn roles(roles: &[Role]) -> Self {
        AuthPolicy::HasRole(roles.to_vec())
    }

    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::Authenticated => context.user().is_some(),
            AuthPolicy::HasRole(roles) => context.user().is_some_and(|u| roles.contains(&u.role)),
        }
    }

    /// Like [`check`](Self::check), but explains the refusal
    ///
    /// Anonymous callers get 401, authenticated callers with the wrong role
    /// get 403.
    pub fn enforce(&self, context: &AuthContext) -> Result<(), RequestError> {
        if self.check(context) {
            return Ok(());
        }
        match context {
            AuthContext::Anonymous => {
                tracing::warn!("Rejected anonymous request to a protected route");
                Err(RequestError::Unauthorized {
                    message: NOT_AUTHORIZED.to_string(),
                })
            }
            AuthContext::User(user) => {
                tracing::warn!(user = %user.id, role = %user.role, "Role not allowed");
                Err(RequestError::Forbidden {
                    message: format!(
                        "User role {} is not authorized to access this route",
                        user.role
                    ),
                })
            }
        }
    }
}

/// Resolves bearer tokens to users
///
/// Token issuance and password handling live outside this service.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// `None` when the token is unknown or expired
    async fn authenticate(&self, token: &str) -> Result<Option<AuthenticatedUser>>;

    /// Resolve the `Authorization` header of a request
    async fn context_from_headers(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let Some(token) = bearer_token(headers) else {
            return Ok(AuthContext::Anonymous);
        };
        Ok(self
            .authenticate(token)
            .await?
            .map_or(AuthContext::Anonymous, AuthContext::User))
    }
}

/// Fixed token table (for development and tests)
#[derive(Debug, Clone, Default)]
pub struct StaticTokenCredentials {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CredentialService for StaticTokenCredentials {
    async fn authenticate(&self, token: &str) -> Result<Option<AuthenticatedUser>> {
        Ok(self.tokens.get(token).cloned())
    }
}

/// Token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> AuthContext {
        AuthContext::User(AuthenticatedUser::new("u1", role))
    }

    #[test]
    fn test_policy_check() {
        assert!(AuthPolicy::Public.check(&AuthContext::Anonymous));
        assert!(!AuthPolicy::Authenticated.check(&AuthContext::Anonymous));
        assert!(AuthPolicy::Authenticated.check(&user(Role::User)));

        let publishers = AuthPolicy::roles(&[Role::Publisher, Role::Admin]);
        assert!(publishers.check(&user(Role::Publisher)));
        assert!(publishers.check(&user(Role::Admin)));
        assert!(!publishers.check(&user(Role::User)));
    }

    #[test]
    fn test_enforce_distinguishes_401_and_403() {
        let admin_only = AuthPolicy::roles(&[Role::Admin]);

        let anonymous = admin_only.enforce(&AuthContext::Anonymous).unwrap_err();
        assert!(matches!(anonymous, RequestError::Unauthorized { .. }));
        assert_eq!(anonymous.to_string(), NOT_AUTHORIZED);

        let wrong_role = admin_only.enforce(&user(Role::Publisher)).unwrap_err();
        assert!(matches!(wrong_role, RequestError::Forbidden { .. }));
        assert_eq!(
            wrong_role.to_string(),
            "User role publisher is not authorized to access this route"
        );
    }

    #[test]
    fn test_authorize_returns_user() {
        let ctx = user(Role::Publisher);
        let caller = ctx.authorize(&AuthPolicy::Authenticated).unwrap();
        assert_eq!(caller.id, "u1");
        assert!(
            AuthContext::Anonymous
                .authorize(&AuthPolicy::Public)
                .is_err()
        );
    }

    #[test]
    fn test_can_modify() {
        let owner = AuthenticatedUser::new("u1", Role::Publisher);
        assert!(owner.can_modify(Some("u1")));
        assert!(!owner.can_modify(Some("u2")));
        assert!(!owner.can_modify(None));

        let admin = AuthenticatedUser::new("a1", Role::Admin);
        assert!(admin.can_modify(Some("u2")));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_value(Role::Publisher).unwrap(), "publisher");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let credentials = StaticTokenCredentials::new()
            .with_token("t-admin", AuthenticatedUser::new("a1", Role::Admin));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer t-admin"));
        let ctx = credentials.context_from_headers(&headers).await.unwrap();
        assert!(ctx.is_admin());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        let ctx = credentials.context_from_headers(&headers).await.unwrap();
        assert_eq!(ctx, AuthContext::Anonymous);
    }
}
