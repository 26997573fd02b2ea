//! User accounts
//!
//! Passwords and tokens are handled by the credential service; the directory
//! only keeps profile data and the role.

use crate::core::auth::Role;
use crate::core::entity::Entity;
use crate::core::error::EntityError;
use crate::core::store::Document;
use crate::entities::changes_document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    fn resource_name() -> &'static str {
        "users"
    }

    fn resource_name_singular() -> &'static str {
        "User"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Body of `POST /auth/users` (admin)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: String,

    #[validate(email(message = "Please add a valid email"))]
    pub email: String,

    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            email: self.email.to_lowercase(),
            role: self.role,
            created_at: Utc::now(),
        }
    }
}

/// Body of `PUT /auth/users/{id}` (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    pub role: Option<Role>,
}

impl UpdateUser {
    pub fn changes(&self) -> Result<Document, EntityError> {
        let mut changes = changes_document(User::resource_name_singular(), self)?;
        if let Some(email) = &self.email {
            changes.insert("email".to_string(), email.to_lowercase().into());
        }
        Ok(changes)
    }
}

/// Body of `PUT /auth/updatedetails`: a user may change their own name and
/// email, never their role
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserDetails {
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
}

impl UserDetails {
    pub fn changes(&self) -> Result<Document, EntityError> {
        UpdateUser {
            name: self.name.clone(),
            email: self.email.clone(),
            role: None,
        }
        .changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_user_defaults_to_user_role() {
        let payload: NewUser = serde_json::from_value(json!({
            "name": "Ana",
            "email": "Ana@Example.com"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());

        let user = payload.into_user();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "ana@example.com");
    }

    #[test]
    fn test_details_cannot_change_role() {
        let details: UserDetails = serde_json::from_value(json!({
            "name": "Ana",
            "role": "admin"
        }))
        .unwrap();
        let changes = details.changes().unwrap();
        assert_eq!(changes["name"], json!("Ana"));
        assert!(!changes.contains_key("role"));
    }

    #[test]
    fn test_invalid_email() {
        let update = UpdateUser {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
