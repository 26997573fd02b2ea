//! Review model

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
pub struct Review {
    pub id: String,
    pub title: String,
    pub text: String,
    /// Between 1 and 10
    pub rating: u8,
    pub bootcamp: String,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    fn resource_name() -> &'static str {
        "reviews"
    }

    fn resource_name_singular() -> &'static str {
        "Review"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user)
    }
}

/// Body of `POST /bootcamps/{id}/reviews`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewReview {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Please add a title for the review"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: String,

    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: u8,
}

impl NewReview {
    pub fn into_review(self, bootcamp: &str, author: &str) -> Review {
        Review {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            text: self.text,
            rating: self.rating,
            bootcamp: bootcamp.to_string(),
            user: author.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Body of `PUT /reviews/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateReview {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Please add a title for the review"
    ))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: Option<u8>,
}

impl UpdateReview {
    pub fn changes(&self) -> Result<Document, EntityError> {
        changes_document(Review::resource_name_singular(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_range() {
        let payload: NewReview = serde_json::from_value(json!({
            "title": "Learned a ton",
            "text": "Great instructors",
            "rating": 11
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rating"));
    }

    #[test]
    fn test_review_owner_is_author() {
        let payload = NewReview {
            title: "Solid".into(),
            text: "Good value".into(),
            rating: 8,
        };
        let review = payload.into_review("b1", "u7");
        assert_eq!(review.owner_id(), Some("u7"));
        assert_eq!(review.bootcamp, "b1");
    }
}
