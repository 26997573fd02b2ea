//! Bootcamp model

use crate::core::entity::Entity;
use crate::core::error::EntityError;
use crate::core::store::Document;
use crate::entities::changes_document;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;
use validator::Validate;

/// Photo used until one is uploaded
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Career tracks a bootcamp can prepare for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Other,
}

/// Postal location of a bootcamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub careers: Vec<Career>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    /// Publisher who owns the bootcamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

impl Entity for Bootcamp {
    fn resource_name() -> &'static str {
        "bootcamps"
    }

    fn resource_name_singular() -> &'static str {
        "Bootcamp"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// URL-friendly form of a bootcamp name (`Devworks Bootcamp` -> `devworks-bootcamp`)
pub fn slugify(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());

    separators
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Body of `POST /bootcamps`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBootcamp {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: String,

    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: String,

    #[serde(default)]
    pub location: Option<Location>,

    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Vec<Career>,

    #[validate(range(min = 0.0))]
    pub average_cost: Option<f64>,

    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

impl NewBootcamp {
    /// Build the stored bootcamp, owned by `owner`
    pub fn into_bootcamp(self, owner: &str) -> Bootcamp {
        Bootcamp {
            id: Uuid::new_v4().to_string(),
            slug: slugify(&self.name),
            name: self.name,
            description: self.description,
            website: self.website,
            phone: self.phone,
            email: self.email,
            address: self.address,
            location: self.location,
            careers: self.careers,
            average_rating: None,
            average_cost: self.average_cost,
            photo: default_photo(),
            housing: self.housing,
            job_assistance: self.job_assistance,
            job_guarantee: self.job_guarantee,
            accept_gi: self.accept_gi,
            user: Some(owner.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Body of `PUT /bootcamps/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBootcamp {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: Option<String>,

    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: Option<String>,

    pub location: Option<Location>,

    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Option<Vec<Career>>,

    #[validate(range(min = 0.0))]
    pub average_cost: Option<f64>,

    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl UpdateBootcamp {
    /// Fields to merge into the stored bootcamp; a new name also renews the slug
    pub fn changes(&self) -> Result<Document, EntityError> {
        let mut changes = changes_document(Bootcamp::resource_name_singular(), self)?;
        if let Some(name) = &self.name {
            changes.insert("slug".to_string(), slugify(name).into());
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_bootcamp() -> NewBootcamp {
        serde_json::from_value(json!({
            "name": "Devworks Bootcamp",
            "description": "Full stack web development",
            "website": "https://devworks.com",
            "email": "enroll@devworks.com",
            "address": "233 Bay State Rd Boston MA 02215",
            "careers": ["Web Development", "UI/UX"],
            "housing": true
        }))
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("  UI/UX -- Academy! "), "ui-ux-academy");
    }

    #[test]
    fn test_new_bootcamp_is_valid() {
        let payload = new_bootcamp();
        assert!(payload.validate().is_ok());

        let bootcamp = payload.into_bootcamp("u1");
        assert_eq!(bootcamp.slug, "devworks-bootcamp");
        assert_eq!(bootcamp.owner_id(), Some("u1"));
        assert_eq!(bootcamp.photo, DEFAULT_PHOTO);
    }

    #[test]
    fn test_new_bootcamp_rules() {
        let mut payload = new_bootcamp();
        payload.name = "x".repeat(51);
        payload.email = Some("not-an-email".into());
        payload.careers.clear();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("careers"));
    }

    #[test]
    fn test_unknown_career_is_rejected() {
        let result = serde_json::from_value::<Career>(json!("Astrology"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stored_form_is_camel_case() {
        let document = new_bootcamp().into_bootcamp("u1").to_document().unwrap();
        assert_eq!(document["jobAssistance"], json!(false));
        assert_eq!(document["careers"], json!(["Web Development", "UI/UX"]));
        assert!(document.contains_key("createdAt"));
        assert!(!document.contains_key("averageRating"));
    }

    #[test]
    fn test_update_changes_renew_slug() {
        let update = UpdateBootcamp {
            name: Some("New Name".into()),
            housing: Some(false),
            ..Default::default()
        };
        let changes = update.changes().unwrap();
        assert_eq!(changes["slug"], json!("new-name"));
        assert_eq!(changes["housing"], json!(false));
        assert!(!changes.contains_key("description"));
    }
}
