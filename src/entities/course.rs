//! Course model

use crate::core::entity::Entity;
use crate::core::error::EntityError;
use crate::core::store::Document;
use crate::entities::changes_document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
    /// Id of the bootcamp offering the course
    pub bootcamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    fn resource_name() -> &'static str {
        "courses"
    }

    fn resource_name_singular() -> &'static str {
        "Course"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Body of `POST /bootcamps/{id}/courses`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[validate(length(min = 1, max = 100, message = "Please add a course title"))]
    pub title: String,

    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: String,

    #[validate(range(min = 1, max = 104, message = "Please add number of weeks"))]
    pub weeks: u32,

    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: f64,

    pub minimum_skill: MinimumSkill,

    #[serde(default)]
    pub scholarship_available: bool,
}

impl NewCourse {
    pub fn into_course(self, bootcamp: &str, owner: &str) -> Course {
        Course {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            weeks: self.weeks,
            tuition: self.tuition,
            minimum_skill: self.minimum_skill,
            scholarship_available: self.scholarship_available,
            bootcamp: bootcamp.to_string(),
            user: Some(owner.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Body of `PUT /courses/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 100, message = "Please add a course title"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 104, message = "Please add number of weeks"))]
    pub weeks: Option<u32>,

    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: Option<f64>,

    pub minimum_skill: Option<MinimumSkill>,

    pub scholarship_available: Option<bool>,
}

impl UpdateCourse {
    pub fn changes(&self) -> Result<Document, EntityError> {
        changes_document(Course::resource_name_singular(), self)
    }
}
